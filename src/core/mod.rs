//! Core business logic module
//!
//! - `account_ledger` - Balances, deposits and withdrawals
//! - `transfer` - Atomic transfers between two accounts
//! - `transaction_log` - Append-only per-account history
//! - `user_directory` - Users, roles and uniqueness rules
//! - `bank` - Facade wiring the components together

pub mod account_ledger;
pub mod bank;
pub mod transaction_log;
pub mod transfer;
pub mod user_directory;

pub use account_ledger::AccountLedger;
pub use bank::Bank;
pub use transaction_log::{History, HistoryIter, LogEntry, TransactionLog};
pub use transfer::{TransferCoordinator, TransferReceipt, TransferState};
pub use user_directory::UserDirectory;
