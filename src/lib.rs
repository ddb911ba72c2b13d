//! Bank Ledger Library
//! # Overview
//!
//! This library provides the account core of a small bank: users with roles,
//! one account per user, deposits, withdrawals, atomic transfers and an
//! append-only transaction history.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Account, User, TransactionRecord, LedgerError)
//! - [`core`] - Business logic components:
//!   - [`core::account_ledger`] - Balances, deposits and withdrawals
//!   - [`core::transfer`] - Atomic transfers with rollback
//!   - [`core::transaction_log`] - Per-account history
//!   - [`core::user_directory`] - Users and uniqueness rules
//!   - [`core::bank`] - Facade over all of the above
//! - [`io`] - CSV operation scripts and reports
//! - [`replay`] - Drives a script through a bank
//! - [`cli`] - CLI arguments parsing
//! - [`logging`] - Log subscriber setup
//!
//! # Concurrency
//!
//! Operations on the same account are serialized; operations on different
//! accounts run in parallel. A transfer locks both accounts in ascending
//! account id order, so two opposite transfers cannot deadlock.
//!
//! # Example
//!
//! ```
//! use bank_ledger::{Bank, NewUser, Role};
//! use rust_decimal::Decimal;
//!
//! let bank = Bank::new();
//! let user = bank
//!     .register_user(
//!         NewUser {
//!             name: "Alice".into(),
//!             document_id: "12345".into(),
//!             username: "alice".into(),
//!             email: "alice@example.com".into(),
//!         },
//!         Role::Client,
//!     )
//!     .unwrap();
//! let account = bank.create_account(user.id).unwrap();
//!
//! assert_eq!(bank.deposit(account, Decimal::new(1000, 2)).unwrap(), Decimal::new(1000, 2));
//! ```

pub mod cli;
pub mod core;
pub mod io;
pub mod logging;
pub mod replay;
pub mod types;

pub use core::{
    AccountLedger, Bank, History, TransactionLog, TransferCoordinator, TransferReceipt,
    UserDirectory,
};
pub use types::{
    Account, AccountId, AccountType, HistoryOrder, LedgerError, NewUser, OperationKind, Role,
    TransactionId, TransactionRecord, TransferId, User, UserId,
};
