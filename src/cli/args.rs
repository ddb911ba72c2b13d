use crate::types::HistoryOrder;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay an operation script against an in-memory bank
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "Replay an operation script against an in-memory bank", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing the operation script
    #[arg(value_name = "INPUT", help = "Path to the input CSV file")]
    pub input_file: PathBuf,

    /// Print this user's account history instead of the balance report
    #[arg(long = "history", value_name = "USER")]
    pub history: Option<String>,

    /// Order of history records
    #[arg(
        long = "order",
        value_name = "ORDER",
        value_enum,
        default_value_t = OrderArg::Chronological
    )]
    pub order: OrderArg,

    /// Format of the log lines written to stderr
    #[arg(
        long = "log-format",
        value_name = "FORMAT",
        value_enum,
        default_value_t = LogFormat::Text
    )]
    pub log_format: LogFormat,
}

/// History orders accepted on the command line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    #[default]
    Chronological,
    ReverseChronological,
}

impl From<OrderArg> for HistoryOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Chronological => HistoryOrder::Chronological,
            OrderArg::ReverseChronological => HistoryOrder::ReverseChronological,
        }
    }
}

/// Log line formats
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
