//! JSON Export functionality
//!
//! Exports the live ledger to JSON format with schema versioning.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TallyError, TallyResult};
use crate::models::{BackupSnapshot, Customer, LedgerEntry, SNAPSHOT_VERSION};
use crate::reports::{customers_with_balance, total_debt};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full ledger export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    /// Schema version for compatibility checking
    pub schema_version: String,

    /// Export timestamp
    pub exported_at: DateTime<Utc>,

    /// Application version that created the export
    pub app_version: String,

    /// All live customers
    pub customers: Vec<Customer>,

    /// All entries of those customers
    pub entries: Vec<LedgerEntry>,

    /// Export metadata
    pub metadata: ExportMetadata,
}

/// Export metadata for reference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub customer_count: usize,

    pub entry_count: usize,

    /// Total owed to the business at export time, in cents
    pub total_debt_cents: i64,

    /// Timestamp of the oldest entry
    pub earliest_entry: Option<DateTime<Utc>>,

    /// Timestamp of the newest entry
    pub latest_entry: Option<DateTime<Utc>>,
}

impl FullExport {
    /// Create a new full export from storage
    pub fn from_storage(storage: &Storage) -> TallyResult<Self> {
        let snapshot = storage.snapshot();
        let customers: Vec<Customer> = snapshot.live_customers().cloned().collect();
        let entries = snapshot.live_entries();
        Ok(Self::from_parts(customers, entries))
    }

    /// Build an export from customer and entry lists
    pub fn from_parts(customers: Vec<Customer>, entries: Vec<LedgerEntry>) -> Self {
        let metadata = ExportMetadata {
            customer_count: customers.len(),
            entry_count: entries.len(),
            total_debt_cents: total_debt(&customers_with_balance(&customers, &entries)).cents(),
            earliest_entry: entries.iter().map(|e| e.timestamp).min(),
            latest_entry: entries.iter().map(|e| e.timestamp).max(),
        };

        Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            customers,
            entries,
            metadata,
        }
    }

    /// Validate the export structure
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let mut customer_ids = HashSet::new();
        for customer in &self.customers {
            if !customer_ids.insert(customer.id) {
                return Err(format!("Duplicate customer id {}", customer.id));
            }
        }

        let mut entry_ids = HashSet::new();
        for entry in &self.entries {
            if !entry_ids.insert(entry.id) {
                return Err(format!("Duplicate entry id {}", entry.id));
            }
            if !customer_ids.contains(&entry.customer_id) {
                return Err(format!(
                    "Entry {} references unknown customer {}",
                    entry.id, entry.customer_id
                ));
            }
        }

        Ok(())
    }

    /// The export as a backup snapshot, ready for a replace
    pub fn into_snapshot(self) -> BackupSnapshot {
        BackupSnapshot {
            version: SNAPSHOT_VERSION,
            timestamp: self.exported_at,
            customers: self.customers,
            entries: self.entries,
        }
    }
}

/// Export the full ledger to JSON
pub fn export_full_json<W: Write>(storage: &Storage, writer: &mut W, pretty: bool) -> TallyResult<()> {
    let export = FullExport::from_storage(storage)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| TallyError::Export(e.to_string()))?;

    Ok(())
}

/// Import from a JSON export
pub fn import_from_json(json_str: &str) -> TallyResult<FullExport> {
    let export: FullExport =
        serde_json::from_str(json_str).map_err(|e| TallyError::Import(e.to_string()))?;

    export.validate().map_err(TallyError::Import)?;

    Ok(export)
}
