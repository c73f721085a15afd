//! Delimited text parsing and the adapter built on it.

mod adapter;
mod parse;

pub use adapter::CsvAdapter;
pub use parse::{CsvOptions, CsvTable, infer_cell, parse_csv, parse_csv_line, read_csv};
