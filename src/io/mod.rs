//! I/O module
//!
//! Handles CSV operation scripts and reports.
//!
//! # Components
//!
//! - `csv_format` - Row conversion and report serialization
//! - `script_reader` - Streaming iterator over a script file

pub mod csv_format;
pub mod script_reader;

pub use csv_format::{
    convert_operation_row, format_amount, write_balances_csv, write_history_csv, BalanceRow,
    Operation, OperationRow,
};
pub use script_reader::ScriptReader;
