//! Backup snapshot model
//!
//! The wire shape of a backup file: a version tag, a timestamp and the full
//! customer and entry lists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::customer::Customer;
use super::entry::LedgerEntry;

/// Current backup schema version
pub const SNAPSHOT_VERSION: u32 = 1;

/// A full point-in-time copy of the ledger, used for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    /// Schema version tag
    pub version: u32,

    /// When the snapshot was taken (milliseconds since the epoch on disk)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    #[serde(default)]
    pub customers: Vec<Customer>,

    #[serde(default)]
    pub entries: Vec<LedgerEntry>,
}

impl BackupSnapshot {
    /// Bundle customer and entry lists into a snapshot taken now
    pub fn new(customers: Vec<Customer>, entries: Vec<LedgerEntry>) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            timestamp: Utc::now(),
            customers,
            entries,
        }
    }

    /// Check that this snapshot can be read by this build
    pub fn check_version(&self) -> Result<(), String> {
        if self.version == 0 || self.version > SNAPSHOT_VERSION {
            return Err(format!(
                "Unsupported snapshot version {} (this build reads up to {})",
                self.version, SNAPSHOT_VERSION
            ));
        }
        Ok(())
    }
}
