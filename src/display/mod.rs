//! Display formatting for terminal output
//!
//! Provides utilities for formatting customers, entries and reports as
//! plain-text tables.

pub mod customer;
pub mod entry;
pub mod report;

pub use customer::{format_customer_details, format_customer_list, format_customer_records};
pub use entry::{format_entry_details, format_entry_list};
pub use report::{format_aging, format_monthly, format_top_debtors};
