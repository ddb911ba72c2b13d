//! Bank Ledger CLI
//!
//! Replays a CSV operation script against an in-memory bank.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- script.csv > balances.csv
//! cargo run -- --history alice script.csv > alice.csv
//! cargo run -- --history alice --order reverse-chronological script.csv
//! RUST_LOG=debug cargo run -- --log-format json script.csv
//! ```
//!
//! The report goes to stdout, logs go to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (file not found, unknown history user, write failure, etc.)

use bank_ledger::cli::{self, CliArgs};
use bank_ledger::io::{write_balances_csv, write_history_csv};
use bank_ledger::logging::init_logging;
use bank_ledger::replay::{balance_rows, replay};
use bank_ledger::Bank;
use std::process;
use tracing::error;

fn main() {
    let args = cli::parse_args();

    if let Err(e) = init_logging(args.log_format) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    if let Err(e) = run(&args) {
        error!(error = %e, "Replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: &CliArgs) -> Result<(), String> {
    let bank = Bank::new();
    replay(&args.input_file, &bank)?;

    let mut output = std::io::stdout();
    match &args.history {
        Some(username) => {
            let user = bank.user_by_username(username).map_err(|e| e.to_string())?;
            let account = user
                .account_id
                .ok_or_else(|| format!("User '{}' has no account", username))?;
            let history = bank
                .get_history(account, args.order.into())
                .map_err(|e| e.to_string())?;
            write_history_csv(&history, &mut output)
        }
        None => write_balances_csv(&balance_rows(&bank), &mut output),
    }
}
