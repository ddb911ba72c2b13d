//! Error types for the ledger
//!
//! This module defines every error the ledger can surface to its callers.
//! All of them are recoverable at the caller boundary: a failed operation
//! leaves no partial state behind.
//!
//! # Error Categories
//!
//! - **Amount Errors**: non-positive amounts, insufficient funds, overflow
//! - **Lookup Errors**: unknown accounts or users
//! - **Transfer Errors**: same-account transfers, transfers rolled back mid-way
//! - **User Errors**: duplicate or invalid registration details, unknown roles
//! - **Account Errors**: unknown account types, opening deposits below the minimum
//! - **Access Errors**: a caller operating an account they may not touch
//!
//! Each variant maps to a stable outward-facing code through [`LedgerError::code`].

use super::account::AccountType;
use super::ids::{AccountId, TransferId, UserId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Main error type for the ledger
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// Amount is zero or negative
    #[error("Invalid amount {amount}: amounts must be strictly positive")]
    InvalidAmount {
        /// The rejected amount
        amount: Decimal,
    },

    /// Withdrawal or transfer larger than the current balance
    #[error("Insufficient funds in account {account}: balance {balance}, requested {requested}")]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
    },

    /// Account id is unknown or the account has been closed
    #[error("Account {account} not found")]
    AccountNotFound { account: AccountId },

    /// Source and destination of a transfer are the same account
    #[error("Cannot transfer from account {account} to itself")]
    SameAccountTransfer { account: AccountId },

    /// The deposit half of a transfer failed and the withdrawal was rolled back
    #[error("Transfer {transfer_id} failed and was rolled back: {reason}")]
    TransferFailed {
        transfer_id: TransferId,
        /// Why the deposit half could not complete
        reason: String,
    },

    /// No user matches the given id or username
    #[error("User {user} not found")]
    UserNotFound {
        /// The id or username that was looked up
        user: String,
    },

    /// A unique user attribute is already registered
    #[error("A user with {field} '{value}' already exists")]
    DuplicateUser {
        /// Which attribute collided (document_id, email or username)
        field: String,
        value: String,
    },

    /// A credit would leave the representable decimal range
    #[error("Arithmetic overflow in {operation} for account {account}")]
    ArithmeticOverflow {
        operation: String,
        account: AccountId,
    },

    /// Registration details failed validation
    #[error("Invalid {field}: {reason}")]
    InvalidUserField { field: String, reason: String },

    /// Unknown user role
    #[error("Invalid role '{role}': expected 'client' or 'manager'")]
    InvalidRole { role: String },

    /// Caller may not operate on the account
    #[error("User {user} is not allowed to operate account {account}")]
    Unauthorized { user: UserId, account: AccountId },

    /// Unknown account type
    #[error("Invalid account type '{account_type}': expected 'checking' or 'savings'")]
    InvalidAccountType { account_type: String },

    /// Opening deposit below what the account type requires
    #[error("A {account_type} account needs an opening deposit of at least {required}, got {provided}")]
    OpeningBalanceTooLow {
        account_type: AccountType,
        required: Decimal,
        provided: Decimal,
    },
}

// Helper functions for creating common errors

impl LedgerError {
    /// Stable outward-facing code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidAmount { .. } => "INVALID_AMOUNT",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            LedgerError::SameAccountTransfer { .. } => "SAME_ACCOUNT_TRANSFER",
            LedgerError::TransferFailed { .. } => "TRANSFER_FAILED",
            LedgerError::UserNotFound { .. } => "USER_NOT_FOUND",
            LedgerError::DuplicateUser { .. } => "DUPLICATE_USER",
            LedgerError::ArithmeticOverflow { .. } => "ARITHMETIC_OVERFLOW",
            LedgerError::InvalidUserField { .. } => "INVALID_USER_FIELD",
            LedgerError::InvalidRole { .. } => "INVALID_ROLE",
            LedgerError::Unauthorized { .. } => "UNAUTHORIZED",
            LedgerError::InvalidAccountType { .. } => "INVALID_ACCOUNT_TYPE",
            LedgerError::OpeningBalanceTooLow { .. } => "OPENING_BALANCE_TOO_LOW",
        }
    }

    /// Create an InvalidAmount error
    pub fn invalid_amount(amount: Decimal) -> Self {
        LedgerError::InvalidAmount { amount }
    }

    /// Create an InsufficientFunds error
    pub fn insufficient_funds(account: AccountId, balance: Decimal, requested: Decimal) -> Self {
        LedgerError::InsufficientFunds {
            account,
            balance,
            requested,
        }
    }

    /// Create an AccountNotFound error
    pub fn account_not_found(account: AccountId) -> Self {
        LedgerError::AccountNotFound { account }
    }

    /// Create a SameAccountTransfer error
    pub fn same_account_transfer(account: AccountId) -> Self {
        LedgerError::SameAccountTransfer { account }
    }

    /// Create a TransferFailed error
    pub fn transfer_failed(transfer_id: TransferId, reason: &str) -> Self {
        LedgerError::TransferFailed {
            transfer_id,
            reason: reason.to_string(),
        }
    }

    /// Create a UserNotFound error
    pub fn user_not_found(user: impl ToString) -> Self {
        LedgerError::UserNotFound {
            user: user.to_string(),
        }
    }

    /// Create a DuplicateUser error
    pub fn duplicate_user(field: &str, value: &str) -> Self {
        LedgerError::DuplicateUser {
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    /// Create an ArithmeticOverflow error
    pub fn arithmetic_overflow(operation: &str, account: AccountId) -> Self {
        LedgerError::ArithmeticOverflow {
            operation: operation.to_string(),
            account,
        }
    }

    /// Create an InvalidUserField error
    pub fn invalid_user_field(field: &str, reason: &str) -> Self {
        LedgerError::InvalidUserField {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create an InvalidRole error
    pub fn invalid_role(role: &str) -> Self {
        LedgerError::InvalidRole {
            role: role.to_string(),
        }
    }

    /// Create an Unauthorized error
    pub fn unauthorized(user: UserId, account: AccountId) -> Self {
        LedgerError::Unauthorized { user, account }
    }

    /// Create an InvalidAccountType error
    pub fn invalid_account_type(account_type: &str) -> Self {
        LedgerError::InvalidAccountType {
            account_type: account_type.to_string(),
        }
    }

    /// Create an OpeningBalanceTooLow error
    pub fn opening_balance_too_low(
        account_type: AccountType,
        required: Decimal,
        provided: Decimal,
    ) -> Self {
        LedgerError::OpeningBalanceTooLow {
            account_type,
            required,
            provided,
        }
    }
}
