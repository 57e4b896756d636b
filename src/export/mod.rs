//! Export module for Tallybook
//!
//! Provides complete data export functionality in multiple formats:
//! - CSV: customer balances and ledger entries (spreadsheet-compatible)
//! - JSON: machine-readable full ledger export
//! - YAML: human-readable full ledger export
//!
//! JSON and YAML exports can be imported back; an import replaces all data.

pub mod csv;
pub mod json;
pub mod yaml;

pub use self::csv::{export_balances_csv, export_entries_csv};
pub use json::{export_full_json, import_from_json, FullExport, EXPORT_SCHEMA_VERSION};
pub use yaml::{export_full_yaml, import_from_yaml};
