//! CSV format handling for operation scripts and reports
//!
//! This module centralizes all CSV format concerns, providing:
//! - OperationRow structure for deserialization
//! - Conversion from rows to [`Operation`]s
//! - Balance and history report serialization
//!
//! All functions are pure (no file I/O) for easy testing.

use crate::core::History;
use crate::types::{AccountId, AccountType, Role};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV row structure for deserialization
///
/// Matches the script format with columns: op, user, target, amount.
/// `target` and `amount` are optional because only some operations use them.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct OperationRow {
    pub op: String,
    pub user: String,
    pub target: Option<String>,
    pub amount: Option<String>,
}

/// One step of an operation script
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Register a user and open their account
    Register {
        username: String,
        role: Role,
        account_type: AccountType,
        opening: Decimal,
    },
    Deposit { username: String, amount: Decimal },
    Withdraw { username: String, amount: Decimal },
    Transfer {
        from: String,
        to: String,
        amount: Decimal,
    },
    /// Delete a user, closing their account
    Close { username: String },
}

/// Convert an OperationRow to an Operation
///
/// Operation names are matched case-insensitively. Amounts are parsed but not
/// range-checked; a zero or negative amount is left for the bank to reject.
///
/// # Arguments
///
/// * `row` - The deserialized CSV row
///
/// # Returns
///
/// Result containing either:
/// - Ok(Operation) - Successfully converted row
/// - Err(String) - Error message describing the conversion failure
pub fn convert_operation_row(row: OperationRow) -> Result<Operation, String> {
    let username = row.user.trim().to_string();
    if username.is_empty() {
        return Err(format!("Operation '{}' has no user", row.op));
    }

    let target = row
        .target
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    match row.op.trim().to_lowercase().as_str() {
        "register" => {
            let (role, account_type) = parse_registration(target.as_deref())?;
            let opening = match row.amount.filter(|a| !a.trim().is_empty()) {
                Some(amount) => parse_amount("register", &username, Some(amount))?,
                None => Decimal::ZERO,
            };
            Ok(Operation::Register {
                username,
                role,
                account_type,
                opening,
            })
        }
        "deposit" => {
            let amount = parse_amount("deposit", &username, row.amount)?;
            Ok(Operation::Deposit { username, amount })
        }
        "withdraw" | "withdrawal" => {
            let amount = parse_amount("withdraw", &username, row.amount)?;
            Ok(Operation::Withdraw { username, amount })
        }
        "transfer" => {
            let to = target.ok_or_else(|| {
                format!("Transfer from '{}' requires a target user", username)
            })?;
            let amount = parse_amount("transfer", &username, row.amount)?;
            Ok(Operation::Transfer {
                from: username,
                to,
                amount,
            })
        }
        "close" => Ok(Operation::Close { username }),
        _ => Err(format!(
            "Invalid operation: '{}' for user '{}'",
            row.op, username
        )),
    }
}

/// Split a register target of the form `role` or `role:type`
fn parse_registration(target: Option<&str>) -> Result<(Role, AccountType), String> {
    let Some(target) = target else {
        return Ok((Role::default(), AccountType::default()));
    };
    let (role, account_type) = match target.split_once(':') {
        Some((role, account_type)) => (role, Some(account_type)),
        None => (target, None),
    };

    let role = if role.trim().is_empty() {
        Role::default()
    } else {
        Role::from_str(role).map_err(|e| e.to_string())?
    };
    let account_type = match account_type {
        Some(t) => AccountType::from_str(t).map_err(|e| e.to_string())?,
        None => AccountType::default(),
    };
    Ok((role, account_type))
}

fn parse_amount(op: &str, username: &str, amount: Option<String>) -> Result<Decimal, String> {
    match amount {
        Some(amount_str) if !amount_str.trim().is_empty() => Decimal::from_str(amount_str.trim())
            .map_err(|_| format!("Invalid amount '{}' for user '{}'", amount_str, username)),
        _ => Err(format!(
            "{} for user '{}' requires an amount",
            op, username
        )),
    }
}

/// Render an amount for a report
///
/// At least two decimals are shown; extra precision is printed as is, never rounded.
pub fn format_amount(amount: Decimal) -> String {
    if amount.scale() < 2 {
        let mut padded = amount;
        padded.rescale(2);
        padded.to_string()
    } else {
        amount.to_string()
    }
}

/// One line of the balance report
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceRow {
    pub username: String,
    pub account: AccountId,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub transactions: usize,
}

/// Write the balance report
///
/// Columns: user, account, type, balance, transactions. Rows are sorted by
/// username for deterministic output. Balances go through [`format_amount`].
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_balances_csv(rows: &[BalanceRow], output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["user", "account", "type", "balance", "transactions"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| a.username.cmp(&b.username));

    for row in sorted {
        writer
            .write_record(&[
                row.username,
                row.account.to_string(),
                row.account_type.to_string(),
                format_amount(row.balance),
                row.transactions.to_string(),
            ])
            .map_err(|e| format!("Failed to write balance record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}

/// Write one account's history in the history's own order
///
/// Columns: sequence, kind, amount, balance_after, counterpart, transfer_id.
/// The last two are empty for deposits and withdrawals.
pub fn write_history_csv(history: &History, output: &mut dyn Write) -> Result<(), String> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record([
            "sequence",
            "kind",
            "amount",
            "balance_after",
            "counterpart",
            "transfer_id",
        ])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    for record in history {
        writer
            .write_record(&[
                record.sequence.to_string(),
                record.kind.to_string(),
                format_amount(record.amount),
                format_amount(record.balance_after),
                record
                    .counterpart
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                record
                    .transfer_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
            ])
            .map_err(|e| format!("Failed to write history record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))
}
