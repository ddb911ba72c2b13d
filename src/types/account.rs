//! Account-related types for the ledger
//!
//! This module defines the Account structure and the account types. The
//! balance is private: it can be read by anyone, but only the ledger inside
//! this crate can move it, and only through checked credit/debit plans
//! followed by a commit.

use super::error::LedgerError;
use super::ids::{AccountId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of account a user holds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Everyday account, may open empty
    #[default]
    Checking,

    /// Savings account, opens with a minimum deposit
    Savings,
}

impl AccountType {
    /// Smallest opening deposit this account type accepts
    pub fn minimum_opening_balance(&self) -> Decimal {
        match self {
            AccountType::Checking => Decimal::ZERO,
            AccountType::Savings => Decimal::ONE_HUNDRED,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "checking" => Ok(AccountType::Checking),
            "savings" => Ok(AccountType::Savings),
            other => Err(LedgerError::invalid_account_type(other)),
        }
    }
}

/// Account state
///
/// One account per user. The balance never drops below zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    /// The account ID
    pub id: AccountId,

    /// The user owning this account
    pub owner: UserId,

    pub account_type: AccountType,

    /// Current balance (single implicit currency)
    balance: Decimal,

    /// When the account was opened
    pub opened_at: DateTime<Utc>,

    /// Set once the account has been closed; closed accounts accept no operations
    #[serde(skip)]
    pub(crate) closed: bool,
}

impl Account {
    /// Create a new open account with a zero balance
    ///
    /// # Arguments
    ///
    /// * `owner` - The user this account belongs to
    /// * `account_type` - Checking or savings
    pub fn new(owner: UserId, account_type: AccountType) -> Self {
        Account {
            id: AccountId::new(),
            owner,
            account_type,
            balance: Decimal::ZERO,
            opened_at: Utc::now(),
            closed: false,
        }
    }

    /// Current balance
    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Compute the balance after crediting `amount`, without applying it
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the sum leaves the decimal range.
    pub(crate) fn plan_credit(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        self.balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::arithmetic_overflow("credit", self.id))
    }

    /// Compute the balance after debiting `amount`, without applying it
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if `amount` exceeds the current balance.
    pub(crate) fn plan_debit(&self, amount: Decimal) -> Result<Decimal, LedgerError> {
        if amount > self.balance {
            return Err(LedgerError::insufficient_funds(
                self.id,
                self.balance,
                amount,
            ));
        }
        // amount <= balance, so the subtraction stays in range and non-negative
        Ok(self.balance - amount)
    }

    /// Apply a balance previously produced by `plan_credit` or `plan_debit`
    pub(crate) fn commit(&mut self, planned: Decimal) {
        debug_assert!(planned >= Decimal::ZERO);
        self.balance = planned;
    }
}
