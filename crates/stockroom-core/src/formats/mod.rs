//! # Formats
//!
//! Interchange formats for moving stock data in and out of the ledger.

mod csv;

pub use csv::{export_history_csv, export_items_csv, parse_items_csv};
