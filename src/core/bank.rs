//! Bank facade
//!
//! This module provides the `Bank`, the single entry point a request handler
//! talks to. It wires the user directory, the account ledger, the transfer
//! coordinator and the transaction log together.
//!
//! # Architecture
//!
//! ```text
//! Bank
//!     ├── UserDirectory           (users, uniqueness, user → account link)
//!     ├── Arc<AccountLedger>      (balances, deposits, withdrawals)
//!     ├── TransferCoordinator     (atomic two-account transfers)
//!     └── Arc<TransactionLog>     (append-only history)
//! ```
//!
//! # Access control
//!
//! The facade does not check who is calling. A request handler resolves the
//! caller first and calls [`Bank::authorize`] before any account operation.

use crate::core::account_ledger::AccountLedger;
use crate::core::transaction_log::{History, TransactionLog};
use crate::core::transfer::{TransferCoordinator, TransferReceipt};
use crate::core::user_directory::UserDirectory;
use crate::types::{
    Account, AccountId, AccountType, HistoryOrder, LedgerError, NewUser, Role, User, UserId,
};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// Banking core: users, accounts, balances and history
#[derive(Debug)]
pub struct Bank {
    users: UserDirectory,
    ledger: Arc<AccountLedger>,
    transfers: TransferCoordinator,
    log: Arc<TransactionLog>,
}

impl Bank {
    /// Create an empty bank
    pub fn new() -> Self {
        let log = Arc::new(TransactionLog::new());
        let ledger = Arc::new(AccountLedger::new(Arc::clone(&log)));
        let transfers = TransferCoordinator::new(Arc::clone(&ledger));

        Bank {
            users: UserDirectory::new(),
            ledger,
            transfers,
            log,
        }
    }

    /// Register a user with the given role
    ///
    /// # Errors
    ///
    /// `InvalidUserField` or `DuplicateUser`.
    pub fn register_user(&self, details: NewUser, role: Role) -> Result<User, LedgerError> {
        self.users.register(details, role)
    }

    /// Open an empty checking account for the user, or return the one they already have
    ///
    /// # Errors
    ///
    /// `UserNotFound` if the user does not exist.
    pub fn create_account(&self, user_id: UserId) -> Result<AccountId, LedgerError> {
        self.open_account(user_id, AccountType::Checking, Decimal::ZERO)
    }

    /// Open an account of the given type funded with `initial_deposit`
    ///
    /// A positive `initial_deposit` is recorded as the account's first
    /// deposit. If the user already owns an account its id is returned and
    /// nothing is deposited.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `initial_deposit` is negative
    /// - `OpeningBalanceTooLow` if it is below the type's minimum
    /// - `UserNotFound` if the user does not exist
    pub fn open_account(
        &self,
        user_id: UserId,
        account_type: AccountType,
        initial_deposit: Decimal,
    ) -> Result<AccountId, LedgerError> {
        if initial_deposit < Decimal::ZERO {
            return Err(LedgerError::invalid_amount(initial_deposit));
        }
        let required = account_type.minimum_opening_balance();
        if initial_deposit < required {
            return Err(LedgerError::opening_balance_too_low(
                account_type,
                required,
                initial_deposit,
            ));
        }

        self.users.link_account(user_id, |owner| {
            let account_id = self.ledger.open_account(owner, account_type).id;
            if initial_deposit > Decimal::ZERO {
                if let Err(e) = self.ledger.deposit(account_id, initial_deposit) {
                    warn!(account = %account_id, error = %e, "Opening deposit failed");
                    self.ledger.close_account(account_id)?;
                    return Err(e);
                }
            }
            Ok(account_id)
        })
    }

    /// See [`AccountLedger::deposit`]
    pub fn deposit(&self, account_id: AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
        self.ledger.deposit(account_id, amount)
    }

    /// See [`AccountLedger::withdraw`]
    pub fn withdraw(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Decimal, LedgerError> {
        self.ledger.withdraw(account_id, amount)
    }

    /// See [`TransferCoordinator::transfer`]
    pub fn transfer(
        &self,
        from: AccountId,
        to: AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        self.transfers.transfer(from, to, amount)
    }

    /// See [`AccountLedger::get_balance`]
    pub fn get_balance(&self, account_id: AccountId) -> Result<Decimal, LedgerError> {
        self.ledger.get_balance(account_id)
    }

    /// History of an open account
    ///
    /// # Errors
    ///
    /// `AccountNotFound` if the account is unknown or closed.
    pub fn get_history(
        &self,
        account_id: AccountId,
        order: HistoryOrder,
    ) -> Result<History, LedgerError> {
        self.ledger.account(account_id)?;
        self.log.history(account_id, order)
    }

    /// Snapshot of an open account
    pub fn account(&self, account_id: AccountId) -> Result<Account, LedgerError> {
        self.ledger.account(account_id)
    }

    /// All open accounts, sorted by id
    pub fn accounts(&self) -> Vec<Account> {
        self.ledger.accounts()
    }

    pub fn user(&self, user_id: UserId) -> Result<User, LedgerError> {
        self.users.get(user_id)
    }

    pub fn user_by_username(&self, username: &str) -> Result<User, LedgerError> {
        self.users.find_by_username(username)
    }

    /// All users, oldest registration first
    pub fn users(&self) -> Vec<User> {
        self.users.list()
    }

    /// Delete a user and close the account they own
    ///
    /// The account is closed whatever its balance; its history is kept in the
    /// log but is no longer reachable through the facade.
    ///
    /// # Errors
    ///
    /// `UserNotFound` if the user does not exist.
    pub fn delete_user(&self, user_id: UserId) -> Result<User, LedgerError> {
        let user = self.users.remove(user_id)?;

        if let Some(account_id) = user.account_id {
            match self.ledger.close_account(account_id) {
                Ok(account) => {
                    info!(
                        user = %user_id,
                        account = %account_id,
                        balance = %account.balance(),
                        "Account closed with its owner"
                    );
                }
                // Already gone; nothing left to cascade
                Err(LedgerError::AccountNotFound { .. }) => {}
                Err(other) => return Err(other),
            }
        }

        Ok(user)
    }

    /// Check that `caller` may operate `account_id`
    ///
    /// Managers may operate any account, clients only their own.
    ///
    /// # Errors
    ///
    /// - `UserNotFound` if the caller does not exist
    /// - `AccountNotFound` if the account is unknown or closed
    /// - `Unauthorized` if a client targets someone else's account
    pub fn authorize(&self, caller: UserId, account_id: AccountId) -> Result<(), LedgerError> {
        let user = self.users.get(caller)?;
        let account = self.ledger.account(account_id)?;

        if user.is_staff() || account.owner == user.id {
            Ok(())
        } else {
            Err(LedgerError::unauthorized(user.id, account_id))
        }
    }
}

impl Default for Bank {
    fn default() -> Self {
        Self::new()
    }
}
