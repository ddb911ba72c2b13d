//! Script replay
//!
//! Drives an operation script through a [`Bank`]. Bad rows and rejected
//! operations are logged and skipped; only I/O failures stop the replay.
//!
//! Scripts only name users by username. Each registration gets a numbered
//! document id and email so that any valid username, whatever its length or
//! case, maps to a distinct user.

use crate::core::Bank;
use crate::io::{BalanceRow, Operation, ScriptReader};
use crate::types::{AccountId, HistoryOrder, LedgerError, NewUser};
use std::path::Path;
use tracing::{debug, info, warn};

/// Domain used for the synthetic emails of replayed users
pub const REPLAY_EMAIL_DOMAIN: &str = "replay.invalid";

/// Prefix of the synthetic document ids; the number is zero-padded to 13 digits
const REPLAY_DOCUMENT_PREFIX: char = 'R';

/// Outcome counters of a replay
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: usize,
    pub rejected: usize,
}

/// Replay the script at `path` against `bank`
///
/// # Errors
///
/// Returns `Err(String)` only if the script cannot be opened.
pub fn replay(path: &Path, bank: &Bank) -> Result<ReplaySummary, String> {
    let reader = ScriptReader::new(path)?;
    let summary = replay_operations(reader, bank);

    info!(
        script = %path.display(),
        applied = summary.applied,
        rejected = summary.rejected,
        "Replay finished"
    );
    Ok(summary)
}

/// Apply a stream of parsed rows, counting what was applied and what was not
pub fn replay_operations<I>(operations: I, bank: &Bank) -> ReplaySummary
where
    I: IntoIterator<Item = Result<Operation, String>>,
{
    let mut summary = ReplaySummary::default();
    let mut replayer = Replayer::new(bank);

    for result in operations {
        match result {
            Ok(operation) => match replayer.apply(&operation) {
                Ok(()) => {
                    debug!(?operation, "Operation applied");
                    summary.applied += 1;
                }
                Err(e) => {
                    warn!(code = e.code(), error = %e, ?operation, "Operation rejected");
                    summary.rejected += 1;
                }
            },
            Err(e) => {
                warn!(error = %e, "Skipping malformed row");
                summary.rejected += 1;
            }
        }
    }

    summary
}

/// Applies operations to a bank, numbering the users it registers
#[derive(Debug)]
pub struct Replayer<'a> {
    bank: &'a Bank,
    registrations: u64,
}

impl<'a> Replayer<'a> {
    pub fn new(bank: &'a Bank) -> Self {
        Replayer {
            bank,
            registrations: 0,
        }
    }

    /// Apply one operation
    ///
    /// A `Register` either registers the user and opens their account or
    /// leaves no trace.
    pub fn apply(&mut self, operation: &Operation) -> Result<(), LedgerError> {
        let bank = self.bank;
        match operation {
            Operation::Register {
                username,
                role,
                account_type,
                opening,
            } => {
                let details = self.next_details(username);
                let user = bank.register_user(details, *role)?;
                if let Err(e) = bank.open_account(user.id, *account_type, *opening) {
                    bank.delete_user(user.id)?;
                    return Err(e);
                }
            }
            Operation::Deposit { username, amount } => {
                bank.deposit(account_of(bank, username)?, *amount)?;
            }
            Operation::Withdraw { username, amount } => {
                bank.withdraw(account_of(bank, username)?, *amount)?;
            }
            Operation::Transfer { from, to, amount } => {
                let source = account_of(bank, from)?;
                let destination = account_of(bank, to)?;
                bank.transfer(source, destination, *amount)?;
            }
            Operation::Close { username } => {
                let user = bank.user_by_username(username)?;
                bank.delete_user(user.id)?;
            }
        }
        Ok(())
    }

    fn next_details(&mut self, username: &str) -> NewUser {
        self.registrations += 1;
        let n = self.registrations;
        NewUser {
            name: username.to_string(),
            document_id: format!("{}{:013}", REPLAY_DOCUMENT_PREFIX, n),
            username: username.to_string(),
            email: format!("user{}@{}", n, REPLAY_EMAIL_DOMAIN),
        }
    }
}

/// Account of a replayed user
///
/// `create_account` hands back the existing account, so this never opens a
/// second one.
fn account_of(bank: &Bank, username: &str) -> Result<AccountId, LedgerError> {
    let user = bank.user_by_username(username)?;
    bank.create_account(user.id)
}

/// One report line per user that owns an open account
pub fn balance_rows(bank: &Bank) -> Vec<BalanceRow> {
    bank.users()
        .into_iter()
        .filter_map(|user| {
            let account = bank.account(user.account_id?).ok()?;
            let transactions = bank
                .get_history(account.id, HistoryOrder::Chronological)
                .ok()?
                .len();
            Some(BalanceRow {
                username: user.username,
                account: account.id,
                account_type: account.account_type,
                balance: account.balance(),
                transactions,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ScriptReader;
    use crate::types::{AccountType, Role};
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn run(script: &str) -> (Bank, ReplaySummary) {
        let bank = Bank::new();
        let summary = replay_operations(ScriptReader::from_reader(script.as_bytes()), &bank);
        (bank, summary)
    }

    fn balance(bank: &Bank, username: &str) -> rust_decimal::Decimal {
        let user = bank.user_by_username(username).unwrap();
        bank.get_balance(user.account_id.unwrap()).unwrap()
    }

    #[test]
    fn test_replay_happy_path() {
        let (bank, summary) = run("op,user,target,amount\n\
             register,alice,client,\n\
             register,bob,manager,\n\
             deposit,alice,,150.00\n\
             deposit,bob,,20.00\n\
             transfer,alice,bob,100.00\n");

        assert_eq!(summary, ReplaySummary { applied: 5, rejected: 0 });
        assert_eq!(balance(&bank, "alice"), dec!(50.00));
        assert_eq!(balance(&bank, "bob"), dec!(120.00));

        let bob = bank.user_by_username("bob").unwrap();
        assert_eq!(bob.role, Role::Manager);
        assert_eq!(bob.email, "user2@replay.invalid");
        assert_eq!(bob.document_id, "R0000000000002");
    }

    #[rstest]
    #[case::fifteen_chars("abcdefghijklmno")]
    #[case::long_name("alexander_hamilton")]
    #[case::fifty_chars("a_username_that_is_exactly_fifty_characters_long_x")]
    fn test_register_accepts_usernames_longer_than_document_ids(#[case] username: &str) {
        let (bank, summary) = run(&format!(
            "op,user,target,amount\nregister,{0},client,\ndeposit,{0},,7.25\n",
            username
        ));

        assert_eq!(summary, ReplaySummary { applied: 2, rejected: 0 });
        assert_eq!(balance(&bank, username), dec!(7.25));
    }

    #[test]
    fn test_usernames_differing_in_case_are_distinct_users() {
        let (bank, summary) = run("op,user,target,amount\n\
             register,Alice,client,\n\
             register,alice,client,\n\
             deposit,Alice,,3\n\
             deposit,alice,,4\n");

        assert_eq!(summary, ReplaySummary { applied: 4, rejected: 0 });
        assert_eq!(balance(&bank, "Alice"), dec!(3));
        assert_eq!(balance(&bank, "alice"), dec!(4));
        assert_ne!(
            bank.user_by_username("Alice").unwrap().email,
            bank.user_by_username("alice").unwrap().email
        );
    }

    #[test]
    fn test_register_opens_typed_account_with_opening_deposit() {
        let (bank, summary) = run("op,user,target,amount\n\
             register,alice,client:savings,150\n\
             register,bob,client:savings,99.99\n\
             register,bob,client,\n");

        assert_eq!(summary, ReplaySummary { applied: 2, rejected: 1 });
        assert_eq!(balance(&bank, "alice"), dec!(150));
        assert_eq!(balance(&bank, "bob"), dec!(0));

        let rows = balance_rows(&bank);
        let alice = rows.iter().find(|r| r.username == "alice").unwrap();
        assert_eq!(alice.account_type, AccountType::Savings);
        assert_eq!(alice.transactions, 1);
        let bob = rows.iter().find(|r| r.username == "bob").unwrap();
        assert_eq!(bob.account_type, AccountType::Checking);
    }

    #[test]
    fn test_rejections_are_counted_and_skipped() {
        let (bank, summary) = run("op,user,target,amount\n\
             register,alice,client,\n\
             register,alice,client,\n\
             deposit,alice,,10\n\
             withdraw,alice,,25\n\
             transfer,alice,alice,1\n\
             deposit,ghost,,5\n\
             deposit,alice,,zero\n\
             deposit,alice,,0\n");

        assert_eq!(summary, ReplaySummary { applied: 2, rejected: 6 });
        assert_eq!(balance(&bank, "alice"), dec!(10));
    }

    #[test]
    fn test_apply_reports_ledger_errors() {
        let bank = Bank::new();
        let mut replayer = Replayer::new(&bank);
        replayer
            .apply(&Operation::Register {
                username: "alice".into(),
                role: Role::Client,
                account_type: AccountType::Checking,
                opening: dec!(0),
            })
            .unwrap();

        let err = replayer
            .apply(&Operation::Withdraw {
                username: "alice".into(),
                amount: dec!(1),
            })
            .unwrap_err();

        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
    }

    #[test]
    fn test_failed_register_leaves_no_user() {
        let bank = Bank::new();
        let mut replayer = Replayer::new(&bank);

        let err = replayer
            .apply(&Operation::Register {
                username: "alice".into(),
                role: Role::Client,
                account_type: AccountType::Savings,
                opening: dec!(10),
            })
            .unwrap_err();

        assert_eq!(err.code(), "OPENING_BALANCE_TOO_LOW");
        assert!(bank.users().is_empty());
        assert!(bank.accounts().is_empty());
    }

    #[test]
    fn test_close_removes_user_from_report() {
        let (bank, summary) = run("op,user,target,amount\n\
             register,alice,client,\n\
             register,bob,client,\n\
             deposit,alice,,5\n\
             close,alice,,\n\
             deposit,alice,,5\n");

        assert_eq!(summary.rejected, 1);
        let rows = balance_rows(&bank);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].username, "bob");
        assert_eq!(rows[0].transactions, 0);
    }

    #[test]
    fn test_balance_rows_count_history() {
        let (bank, _) = run("op,user,target,amount\n\
             register,alice,client,\n\
             register,bob,client,\n\
             deposit,alice,,50\n\
             transfer,alice,bob,20\n\
             withdraw,bob,,5\n");

        let mut rows = balance_rows(&bank);
        rows.sort_by(|a, b| a.username.cmp(&b.username));

        assert_eq!(
            rows.iter()
                .map(|r| (r.username.as_str(), r.balance, r.transactions))
                .collect::<Vec<_>>(),
            vec![("alice", dec!(30), 2), ("bob", dec!(15), 2)]
        );
    }

    #[test]
    fn test_replay_missing_file() {
        let bank = Bank::new();
        assert!(replay(Path::new("nonexistent.csv"), &bank).is_err());
    }
}
