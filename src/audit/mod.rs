//! Audit logging for Tallybook
//!
//! Records every create, update and delete of customers and ledger entries,
//! plus bulk replaces, in an append-only JSONL log.
//!
//! - `AuditEntry`: one operation with timestamp, record id and optional
//!   before/after values.
//! - `AuditLogger`: appends entries to the log and reads them back.
//! - `generate_diff`: one-line summary of what changed between two versions.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
