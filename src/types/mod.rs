//! Types module
//!
//! Contains core data structures used throughout the ledger.
//! This module organizes types into logical submodules:
//! - `ids`: Opaque identifiers for accounts, users, transactions and transfers
//! - `account`: Account state and account types
//! - `transaction`: Transaction records and history ordering
//! - `user`: Users, roles and registration details
//! - `error`: Error type for the ledger

pub mod account;
pub mod error;
pub mod ids;
pub mod transaction;
pub mod user;

pub use account::{Account, AccountType};
pub use error::LedgerError;
pub use ids::{AccountId, TransactionId, TransferId, UserId};
pub use transaction::{HistoryOrder, OperationKind, TransactionRecord};
pub use user::{NewUser, Role, User};
