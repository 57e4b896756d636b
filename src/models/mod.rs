//! Core data models for Tallybook
//!
//! This module contains the data structures of the ledger domain: customers,
//! their debt and payment entries, and the backup snapshot that bundles them.

pub mod customer;
pub mod entry;
pub mod ids;
pub mod money;
pub mod snapshot;

pub use customer::{Customer, PhotoKind, PhotoSlots, MAX_PHOTOS};
pub use entry::{EntryKind, LedgerEntry};
pub use ids::{CustomerId, EntryId};
pub use money::Money;
pub use snapshot::{BackupSnapshot, SNAPSHOT_VERSION};
