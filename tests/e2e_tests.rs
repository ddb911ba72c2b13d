//! End-to-end integration tests
//!
//! These tests write an operation script to a temporary file, run the
//! `bank-ledger` binary on it and check the CSV report on stdout.
//!
//! Account ids are random, so reports are compared column by column with the
//! account column checked only for shape.

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use std::io::Write;
    use std::process::{Command, Output};
    use tempfile::NamedTempFile;

    const HEADER: &str = "op,user,target,amount\n";

    fn create_script(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(HEADER.as_bytes())
            .expect("Failed to write to temp file");
        file.write_all(body.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    fn run_cli(script: &NamedTempFile, extra: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_bank-ledger"))
            .args(extra)
            .arg(script.path())
            .env("RUST_LOG", "warn")
            .output()
            .expect("Failed to run bank-ledger")
    }

    type Row = (String, String, String, String);

    /// Rows of the balance report as (user, type, balance, transactions)
    fn balances(output: &Output) -> Vec<Row> {
        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut lines = stdout.lines();
        assert_eq!(lines.next(), Some("user,account,type,balance,transactions"));

        lines
            .map(|line| {
                let fields: Vec<&str> = line.split(',').collect();
                assert_eq!(fields.len(), 5, "unexpected row: {}", line);
                assert_eq!(fields[1].len(), 36, "account is not a uuid: {}", fields[1]);
                (
                    fields[0].to_string(),
                    fields[2].to_string(),
                    fields[3].to_string(),
                    fields[4].to_string(),
                )
            })
            .collect()
    }

    fn row(user: &str, balance: &str, transactions: &str) -> Row {
        (user.into(), "checking".into(), balance.into(), transactions.into())
    }

    fn savings(user: &str, balance: &str, transactions: &str) -> Row {
        (user.into(), "savings".into(), balance.into(), transactions.into())
    }

    #[rstest]
    #[case::happy_path(
        "register,alice,client,\n\
         register,bob,client,\n\
         deposit,alice,,150.00\n\
         deposit,bob,,20\n\
         transfer,alice,bob,100.00\n",
        vec![row("alice", "50.00", "2"), row("bob", "120.00", "2")]
    )]
    #[case::insufficient_funds(
        "register,alice,client,\n\
         deposit,alice,,150.00\n\
         withdraw,alice,,200.00\n",
        vec![row("alice", "150.00", "1")]
    )]
    #[case::same_account_transfer(
        "register,alice,client,\n\
         deposit,alice,,50\n\
         transfer,alice,alice,10\n",
        vec![row("alice", "50.00", "1")]
    )]
    #[case::invalid_amounts(
        "register,alice,client,\n\
         deposit,alice,,0\n\
         deposit,alice,,-3\n\
         withdraw,alice,,abc\n",
        vec![row("alice", "0.00", "0")]
    )]
    #[case::close_removes_user(
        "register,bob,client,\n\
         register,alice,manager,\n\
         deposit,alice,,10\n\
         close,alice,,\n\
         transfer,bob,alice,1\n",
        vec![row("bob", "0.00", "0")]
    )]
    #[case::sorted_by_username(
        "register,zoe,client,\n\
         register,adam,client,\n\
         register,mia,client,\n",
        vec![row("adam", "0.00", "0"), row("mia", "0.00", "0"), row("zoe", "0.00", "0")]
    )]
    #[case::malformed_rows_skipped(
        "register,alice,client,\n\
         launder,alice,,100\n\
         register,eve,admin,\n\
         deposit,alice,,12.5\n",
        vec![row("alice", "12.50", "1")]
    )]
    #[case::sub_cent_amounts_not_rounded(
        "register,alice,client,\n\
         deposit,alice,,0.004\n\
         deposit,alice,,10.995\n",
        vec![row("alice", "10.999", "2")]
    )]
    #[case::long_usernames(
        "register,alexander_hamilton,client,\n\
         register,a_username_that_is_exactly_fifty_characters_long_x,client,\n\
         deposit,alexander_hamilton,,5\n",
        vec![
            row("a_username_that_is_exactly_fifty_characters_long_x", "0.00", "0"),
            row("alexander_hamilton", "5.00", "1"),
        ]
    )]
    #[case::usernames_differing_in_case(
        "register,Alice,client,\n\
         register,alice,client,\n\
         deposit,Alice,,1\n\
         deposit,alice,,2\n",
        vec![row("Alice", "1.00", "1"), row("alice", "2.00", "1")]
    )]
    #[case::savings_opening_deposit(
        "register,alice,client:savings,100\n\
         register,bob,client:savings,99.99\n\
         register,carol,manager:checking,15\n",
        vec![savings("alice", "100.00", "1"), row("carol", "15.00", "1")]
    )]
    fn test_balance_report(#[case] script: &str, #[case] expected: Vec<Row>) {
        let file = create_script(script);

        let output = run_cli(&file, &[]);

        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        assert_eq!(balances(&output), expected);
    }

    #[rstest]
    #[case::chronological("chronological", vec!["deposit", "withdrawal", "transfer-out"])]
    #[case::reverse("reverse-chronological", vec!["transfer-out", "withdrawal", "deposit"])]
    fn test_history_report(#[case] order: &str, #[case] kinds: Vec<&str>) {
        let file = create_script(
            "register,alice,client,\n\
             register,bob,client,\n\
             deposit,alice,,100\n\
             withdraw,alice,,10\n\
             transfer,alice,bob,40\n",
        );

        let output = run_cli(&file, &["--history", "alice", "--order", order]);

        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        let mut lines = stdout.lines();
        assert_eq!(
            lines.next(),
            Some("sequence,kind,amount,balance_after,counterpart,transfer_id")
        );
        let records: Vec<Vec<String>> = lines
            .map(|line| line.split(',').map(str::to_string).collect())
            .collect();

        let actual: Vec<&str> = records.iter().map(|r| r[1].as_str()).collect();
        assert_eq!(actual, kinds);

        let sequences: Vec<u64> = records.iter().map(|r| r[0].parse().unwrap()).collect();
        let mut sorted = sequences.clone();
        sorted.sort_unstable();
        if order == "reverse-chronological" {
            sorted.reverse();
        }
        assert_eq!(sequences, sorted);

        let transfer = records.iter().find(|r| r[1] == "transfer-out").unwrap();
        assert_eq!(transfer[2], "40.00");
        assert_eq!(transfer[3], "50.00");
        assert!(!transfer[4].is_empty());
        assert!(!transfer[5].is_empty());
    }

    #[test]
    fn test_history_of_unknown_user_fails() {
        let file = create_script("register,alice,client,\n");

        let output = run_cli(&file, &["--history", "nobody"]);

        assert_eq!(output.status.code(), Some(1));
        assert!(output.stdout.is_empty());
    }

    #[test]
    fn test_missing_input_file_fails() {
        let output = Command::new(env!("CARGO_BIN_EXE_bank-ledger"))
            .arg("does/not/exist.csv")
            .output()
            .expect("Failed to run bank-ledger");

        assert_eq!(output.status.code(), Some(1));
        assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to open file"));
    }

    #[test]
    fn test_json_logs_go_to_stderr() {
        let file = create_script("register,alice,client,\nwithdraw,alice,,5\n");

        let output = run_cli(&file, &["--log-format", "json"]);

        assert!(output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        let warning = stderr
            .lines()
            .find(|line| line.contains("Operation rejected"))
            .unwrap();
        assert!(warning.starts_with('{'));
        assert!(warning.contains("INSUFFICIENT_FUNDS"));
        assert_eq!(balances(&output), vec![row("alice", "0.00", "0")]);
    }
}
