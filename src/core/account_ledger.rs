//! Account ledger
//!
//! This module provides the `AccountLedger`, the only component allowed to
//! move account balances.
//!
//! The ledger is responsible for:
//! - Opening and closing accounts
//! - Validating and applying deposits and withdrawals
//! - Appending exactly one log record per successful operation
//! - Serializing concurrent operations on the same account
//!
//! # Concurrency
//!
//! Accounts are stored as `Arc<Mutex<Account>>` inside a `DashMap`. A caller
//! clones the `Arc` out of the map (holding the shard lock only for the clone)
//! and then locks the account itself, so operations on one account are
//! mutually exclusive while disjoint accounts proceed in parallel. No shard
//! lock is ever held while waiting on an account lock.
//!
//! Closing marks the account closed under its lock before removing it from the
//! map, so an operation that fetched the handle just before the close still
//! observes `AccountNotFound`.

use crate::core::transaction_log::{LogEntry, TransactionLog};
use crate::types::{Account, AccountId, AccountType, LedgerError, OperationKind, UserId};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

/// Shared handle to one account's state
pub(crate) type AccountHandle = Arc<Mutex<Account>>;

/// Lock an account, recovering the state if a previous holder panicked
///
/// Balance changes are committed with a single assignment after every check
/// has passed, so a poisoned account still holds a consistent balance.
pub(crate) fn lock_account(handle: &AccountHandle) -> MutexGuard<'_, Account> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Reject zero and negative amounts
pub(crate) fn ensure_positive(amount: Decimal) -> Result<(), LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(amount));
    }
    Ok(())
}

/// Owns every account and all balance mutation
#[derive(Debug)]
pub struct AccountLedger {
    accounts: DashMap<AccountId, AccountHandle>,
    log: Arc<TransactionLog>,
}

impl AccountLedger {
    /// Create an empty ledger writing to `log`
    pub fn new(log: Arc<TransactionLog>) -> Self {
        AccountLedger {
            accounts: DashMap::new(),
            log,
        }
    }

    /// Open a new zero-balance account of `account_type` for `owner`
    ///
    /// The account's log stream is registered before the account becomes
    /// reachable, so its first operation can always be recorded.
    pub fn open_account(&self, owner: UserId, account_type: AccountType) -> Account {
        let account = Account::new(owner, account_type);
        self.log.open_stream(account.id);
        self.accounts
            .insert(account.id, Arc::new(Mutex::new(account.clone())));

        info!(
            account = %account.id,
            owner = %owner,
            account_type = %account_type,
            "Account opened"
        );
        account
    }

    /// Close an account
    ///
    /// Closing is terminal. The returned snapshot carries the balance the account
    /// held when it was closed. Its log records are kept.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is unknown or already closed.
    pub fn close_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let handle = self.handle(id)?;
        let mut account = lock_account(&handle);
        if account.closed {
            return Err(LedgerError::account_not_found(id));
        }

        account.closed = true;
        self.accounts.remove(&id);

        info!(account = %id, balance = %account.balance(), "Account closed");
        Ok(account.clone())
    }

    /// Deposit funds into an account
    ///
    /// # Returns
    ///
    /// The new balance
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not strictly positive
    /// - `AccountNotFound` if the account is unknown or closed
    /// - `ArithmeticOverflow` if the new balance would not fit
    pub fn deposit(&self, id: AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
        ensure_positive(amount)?;

        let handle = self.handle(id)?;
        let mut account = lock_account(&handle);
        ensure_open(&account)?;

        let new_balance = account.plan_credit(amount)?;
        self.log.append(LogEntry::single(
            id,
            OperationKind::Deposit,
            amount,
            new_balance,
        ))?;
        account.commit(new_balance);

        debug!(account = %id, %amount, balance = %new_balance, "Deposit applied");
        Ok(new_balance)
    }

    /// Withdraw funds from an account
    ///
    /// No overdraft: the amount may be at most the current balance.
    ///
    /// # Returns
    ///
    /// The new balance
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not strictly positive
    /// - `AccountNotFound` if the account is unknown or closed
    /// - `InsufficientFunds` if `amount` exceeds the balance
    pub fn withdraw(&self, id: AccountId, amount: Decimal) -> Result<Decimal, LedgerError> {
        ensure_positive(amount)?;

        let handle = self.handle(id)?;
        let mut account = lock_account(&handle);
        ensure_open(&account)?;

        let new_balance = account.plan_debit(amount)?;
        self.log.append(LogEntry::single(
            id,
            OperationKind::Withdrawal,
            amount,
            new_balance,
        ))?;
        account.commit(new_balance);

        debug!(account = %id, %amount, balance = %new_balance, "Withdrawal applied");
        Ok(new_balance)
    }

    /// Current balance of an account
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is unknown or closed.
    pub fn get_balance(&self, id: AccountId) -> Result<Decimal, LedgerError> {
        self.account(id).map(|account| account.balance())
    }

    /// Snapshot of an account
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is unknown or closed.
    pub fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let handle = self.handle(id)?;
        let account = lock_account(&handle);
        ensure_open(&account)?;
        Ok(account.clone())
    }

    /// Snapshots of all open accounts, sorted by account id
    pub fn accounts(&self) -> Vec<Account> {
        let handles: Vec<AccountHandle> = self
            .accounts
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut accounts: Vec<Account> = handles
            .iter()
            .map(|handle| lock_account(handle).clone())
            .filter(|account| !account.closed)
            .collect();
        accounts.sort_by_key(|account| account.id);
        accounts
    }

    /// Shared handle for an account, used by the transfer coordinator
    pub(crate) fn handle(&self, id: AccountId) -> Result<AccountHandle, LedgerError> {
        self.accounts
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| LedgerError::account_not_found(id))
    }

    pub(crate) fn log(&self) -> &Arc<TransactionLog> {
        &self.log
    }
}

/// Fail with `AccountNotFound` if the (locked) account has been closed
pub(crate) fn ensure_open(account: &Account) -> Result<(), LedgerError> {
    if account.closed {
        return Err(LedgerError::account_not_found(account.id));
    }
    Ok(())
}
