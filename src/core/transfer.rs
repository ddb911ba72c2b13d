//! Transfer coordinator
//!
//! Composes a withdrawal on the source account and a deposit on the
//! destination account into one all-or-nothing transfer.
//!
//! # Phases
//!
//! ```text
//! Pending ──deposit ok──▶ Committed   (two linked records appended)
//!    │
//!    └──deposit failed──▶ RolledBack  (source re-credited, no records)
//! ```
//!
//! Both accounts stay locked for the whole transfer, acquired in ascending
//! `AccountId` order so two opposite transfers cannot deadlock. A caller never
//! observes the pending state.

use crate::core::account_ledger::{
    ensure_open, ensure_positive, lock_account, AccountHandle, AccountLedger,
};
use crate::core::transaction_log::LogEntry;
use crate::types::{Account, AccountId, LedgerError, OperationKind, TransferId};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::{Arc, MutexGuard};
use tracing::{debug, info, warn};

/// Phase of a transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    /// Source debited, destination not yet credited
    Pending,
    /// Both legs applied and recorded
    Committed,
    /// Destination leg failed, source restored
    RolledBack,
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransferState::Pending => "pending",
            TransferState::Committed => "committed",
            TransferState::RolledBack => "rolled-back",
        };
        f.write_str(name)
    }
}

/// Outcome of a committed transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    /// Identifier shared by both records of the transfer
    pub transfer_id: TransferId,
    pub source: AccountId,
    pub destination: AccountId,
    pub amount: Decimal,
    /// Source balance after the transfer
    pub source_balance: Decimal,
    /// Destination balance after the transfer
    pub destination_balance: Decimal,
}

/// Moves funds between two accounts atomically
#[derive(Debug, Clone)]
pub struct TransferCoordinator {
    ledger: Arc<AccountLedger>,
}

impl TransferCoordinator {
    pub fn new(ledger: Arc<AccountLedger>) -> Self {
        TransferCoordinator { ledger }
    }

    /// Transfer `amount` from `source` to `destination`
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if `amount` is not strictly positive
    /// - `SameAccountTransfer` if both ids are equal
    /// - `AccountNotFound` if either account is unknown before the transfer starts
    /// - `InsufficientFunds` if the source cannot cover `amount` (nothing changes)
    /// - `TransferFailed` if the destination could not be credited; the source
    ///   has been re-credited and no records were written
    pub fn transfer(
        &self,
        source: AccountId,
        destination: AccountId,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        ensure_positive(amount)?;
        if source == destination {
            return Err(LedgerError::same_account_transfer(source));
        }

        let source_handle = self.ledger.handle(source)?;
        let destination_handle = self.ledger.handle(destination)?;

        self.execute(&source_handle, &destination_handle, amount)
    }

    fn execute(
        &self,
        source_handle: &AccountHandle,
        destination_handle: &AccountHandle,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        let (mut source, mut destination) = lock_in_order(source_handle, destination_handle);
        ensure_open(&source)?;

        let transfer_id = TransferId::new();
        let opening_balance = source.balance();

        // Withdraw leg; a failure here has touched nothing
        let source_balance = source.plan_debit(amount)?;
        source.commit(source_balance);
        debug!(
            transfer_id = %transfer_id,
            state = %TransferState::Pending,
            source = %source.id,
            %amount,
            "Transfer source debited"
        );

        // Deposit leg
        let destination_balance = match credit_destination(&destination, amount) {
            Ok(balance) => balance,
            Err(reason) => {
                return Err(roll_back(&mut source, opening_balance, transfer_id, &reason));
            }
        };

        let recorded = self.ledger.log().append_linked(
            LogEntry::transfer_leg(
                source.id,
                OperationKind::TransferOut,
                amount,
                source_balance,
                destination.id,
                transfer_id,
            ),
            LogEntry::transfer_leg(
                destination.id,
                OperationKind::TransferIn,
                amount,
                destination_balance,
                source.id,
                transfer_id,
            ),
        );
        if let Err(error) = recorded {
            return Err(roll_back(
                &mut source,
                opening_balance,
                transfer_id,
                &error.to_string(),
            ));
        }
        destination.commit(destination_balance);

        info!(
            transfer_id = %transfer_id,
            state = %TransferState::Committed,
            source = %source.id,
            destination = %destination.id,
            %amount,
            "Transfer committed"
        );

        Ok(TransferReceipt {
            transfer_id,
            source: source.id,
            destination: destination.id,
            amount,
            source_balance,
            destination_balance,
        })
    }
}

/// Lock two distinct accounts in ascending id order
///
/// Returns the guards as (source, destination) regardless of acquisition order.
fn lock_in_order<'a>(
    source: &'a AccountHandle,
    destination: &'a AccountHandle,
) -> (MutexGuard<'a, Account>, MutexGuard<'a, Account>) {
    // Ids never change, so reading them takes one short lock each
    let source_id = lock_account(source).id;
    let destination_id = lock_account(destination).id;

    if source_id < destination_id {
        let source_guard = lock_account(source);
        let destination_guard = lock_account(destination);
        (source_guard, destination_guard)
    } else {
        let destination_guard = lock_account(destination);
        let source_guard = lock_account(source);
        (source_guard, destination_guard)
    }
}

/// Plan the destination credit, describing why it cannot happen
fn credit_destination(destination: &Account, amount: Decimal) -> Result<Decimal, String> {
    if destination.closed {
        return Err(format!("destination account {} was closed", destination.id));
    }
    destination
        .plan_credit(amount)
        .map_err(|error| error.to_string())
}

fn roll_back(
    source: &mut Account,
    opening_balance: Decimal,
    transfer_id: TransferId,
    reason: &str,
) -> LedgerError {
    source.commit(opening_balance);
    warn!(
        transfer_id = %transfer_id,
        state = %TransferState::RolledBack,
        source = %source.id,
        reason,
        "Transfer rolled back"
    );
    LedgerError::transfer_failed(transfer_id, reason)
}
