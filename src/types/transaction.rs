//! Transaction-related types for the ledger
//!
//! This module defines the operation kinds, the immutable records appended to
//! the transaction log, and the ordering options for reading history back.

use super::ids::{AccountId, TransactionId, TransferId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of operation recorded against an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Funds credited by a deposit
    Deposit,

    /// Funds debited by a withdrawal
    Withdrawal,

    /// Destination leg of a transfer
    TransferIn,

    /// Source leg of a transfer
    TransferOut,
}

impl OperationKind {
    /// Stable lowercase name, matching the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "deposit",
            OperationKind::Withdrawal => "withdrawal",
            OperationKind::TransferIn => "transfer-in",
            OperationKind::TransferOut => "transfer-out",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable record of one successfully applied operation
///
/// Created exactly once by the transaction log when an operation commits.
/// Fields are public for reading; the log hands out clones, so nothing a
/// caller does to a record can reach the stored copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    /// Unique transaction id
    pub id: TransactionId,

    /// Account the operation was applied to
    pub account_id: AccountId,

    /// What happened
    pub kind: OperationKind,

    /// Amount moved, always strictly positive
    pub amount: Decimal,

    /// Account balance right after the operation
    pub balance_after: Decimal,

    /// Wall-clock time the record was appended
    pub timestamp: DateTime<Utc>,

    /// Global append sequence, breaks timestamp ties
    pub sequence: u64,

    /// Other side of a transfer
    pub counterpart: Option<AccountId>,

    /// Logical transfer both legs belong to
    pub transfer_id: Option<TransferId>,
}

/// Order in which history is produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryOrder {
    /// Oldest record first
    #[default]
    Chronological,

    /// Newest record first
    ReverseChronological,
}
