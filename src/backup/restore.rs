//! Backup restoration for Tallybook
//!
//! Reads a backup file and replaces the ledger with its contents.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{TallyError, TallyResult};
use crate::models::BackupSnapshot;
use crate::storage::Storage;

use super::manager::BackupManager;
use super::replace::{
    check_snapshot_version, prepare_replacement, replace_checked_snapshot, ReplaceSummary,
};

/// Handles restoring from backups
pub struct RestoreManager<'a> {
    storage: &'a Storage,
    safety_backup: Option<&'a BackupManager>,
}

impl<'a> RestoreManager<'a> {
    /// Create a new RestoreManager
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            safety_backup: None,
        }
    }

    /// Back up the current ledger with `manager` before each restore
    pub fn with_safety_backup(mut self, manager: &'a BackupManager) -> Self {
        self.safety_backup = Some(manager);
        self
    }

    /// Restore data from a backup file
    ///
    /// Everything currently stored is replaced. Soft-deleted customers and
    /// entries without a customer in the file are skipped.
    pub fn restore_from_file(&self, backup_path: &Path) -> TallyResult<RestoreResult> {
        let snapshot = read_backup(backup_path)?;
        let label = backup_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "backup".to_string());
        self.restore_snapshot(snapshot, &label)
    }

    /// Restore data from a parsed snapshot
    pub fn restore_snapshot(
        &self,
        snapshot: BackupSnapshot,
        source: &str,
    ) -> TallyResult<RestoreResult> {
        check_snapshot_version(&snapshot)?;

        let safety_backup = match self.safety_backup {
            Some(manager) => Some(manager.create_backup(self.storage)?),
            None => None,
        };

        let version = snapshot.version;
        let backup_date = snapshot.timestamp;
        let summary = replace_checked_snapshot(self.storage, snapshot, source)?;

        Ok(RestoreResult {
            version,
            backup_date,
            summary,
            safety_backup,
        })
    }

    /// Validate a backup file without restoring it
    pub fn validate_backup(&self, backup_path: &Path) -> TallyResult<ValidationResult> {
        let snapshot = read_backup(backup_path)?;
        let version_error = snapshot.check_version().err();
        let version = snapshot.version;
        let backup_date = snapshot.timestamp;
        let customer_count = snapshot.customers.len();
        let entry_count = snapshot.entries.len();
        let prepared = prepare_replacement(snapshot.customers, snapshot.entries);

        Ok(ValidationResult {
            is_valid: version_error.is_none(),
            version_error,
            version,
            backup_date,
            customer_count,
            entry_count,
            restorable_customers: prepared.customers.len(),
            restorable_entries: prepared.entries.len(),
        })
    }
}

fn read_backup(path: &Path) -> TallyResult<BackupSnapshot> {
    let contents = fs::read_to_string(path)
        .map_err(|e| TallyError::Io(format!("Failed to read backup file: {}", e)))?;
    serde_json::from_str(&contents)
        .map_err(|e| TallyError::Json(format!("Failed to parse backup file: {}", e)))
}

/// Result of a restore operation
#[derive(Debug)]
pub struct RestoreResult {
    /// Schema version of the restored backup
    pub version: u32,
    /// Date the backup was created
    pub backup_date: DateTime<Utc>,
    pub summary: ReplaceSummary,
    /// Backup of the data that was replaced, when one was taken
    pub safety_backup: Option<PathBuf>,
}

impl RestoreResult {
    /// Get a summary of what was restored
    pub fn summary(&self) -> String {
        format!("Restored: {}", self.summary.summary())
    }
}

/// Result of validating a backup
#[derive(Debug)]
pub struct ValidationResult {
    /// Whether the backup can be restored by this build
    pub is_valid: bool,
    pub version_error: Option<String>,
    /// Schema version of the backup
    pub version: u32,
    /// Date the backup was created
    pub backup_date: DateTime<Utc>,
    /// Records in the file
    pub customer_count: usize,
    pub entry_count: usize,
    /// Records that would survive filtering
    pub restorable_customers: usize,
    pub restorable_entries: usize,
}

impl ValidationResult {
    /// Get a summary of the backup contents
    pub fn summary(&self) -> String {
        if let Some(err) = &self.version_error {
            return format!("Invalid backup: {}", err);
        }
        let skipped = (self.customer_count - self.restorable_customers)
            + (self.entry_count - self.restorable_entries);
        if skipped == 0 {
            format!(
                "Valid backup (v{}): {} customers, {} entries",
                self.version, self.customer_count, self.entry_count
            )
        } else {
            format!(
                "Valid backup (v{}): {} customers, {} entries ({} records will be skipped)",
                self.version, self.restorable_customers, self.restorable_entries, skipped
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::config::settings::BackupRetention;
    use crate::models::{Customer, CustomerId, LedgerEntry, Money};
    use tempfile::TempDir;

    fn create_test_env() -> (TempDir, Storage, BackupManager) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths.clone()).unwrap();
        let manager = BackupManager::new(&paths, BackupRetention::default());
        (temp_dir, storage, manager)
    }

    fn add_customer(storage: &Storage, name: &str, cents: i64) -> CustomerId {
        storage
            .transaction(|t| {
                let c = t.create_customer(Customer::new(name))?;
                t.create_entry(LedgerEntry::debt(c.id, Money::from_cents(cents), Utc::now()))?;
                Ok(c.id)
            })
            .unwrap()
    }

    #[test]
    fn test_restore_from_backup() {
        let (_temp, storage, manager) = create_test_env();
        add_customer(&storage, "Amina", 1000);
        let backup_path = manager.create_backup(&storage).unwrap();

        add_customer(&storage, "Later", 500);
        assert_eq!(storage.customer_count().unwrap(), 2);

        let result = RestoreManager::new(&storage)
            .restore_from_file(&backup_path)
            .unwrap();
        assert_eq!(result.summary.customers_restored, 1);
        assert_eq!(result.summary.entries_restored, 1);
        assert_eq!(result.summary.customers_removed, 2);
        assert!(result.safety_backup.is_none());
        assert!(result.summary().contains("1 customers and 1 entries"));

        let names: Vec<String> = storage
            .read(|t| t.customers().iter().map(|c| c.name.clone()).collect())
            .unwrap();
        assert_eq!(names, vec!["Amina".to_string()]);
    }

    #[test]
    fn test_safety_backup_is_taken() {
        let (_temp, storage, manager) = create_test_env();
        add_customer(&storage, "Amina", 1000);
        let backup_path = manager.create_backup(&storage).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        let result = RestoreManager::new(&storage)
            .with_safety_backup(&manager)
            .restore_from_file(&backup_path)
            .unwrap();
        let safety = result.safety_backup.unwrap();
        assert!(safety.exists());
        assert_ne!(safety, backup_path);
        assert_eq!(manager.list_backups().unwrap().len(), 2);
    }

    #[test]
    fn test_validate_backup() {
        let (temp, storage, _manager) = create_test_env();
        let mut hidden = Customer::new("Hidden");
        hidden.id = CustomerId::new(2);
        hidden.is_deleted = true;
        let mut shown = Customer::new("Shown");
        shown.id = CustomerId::new(1);
        let snapshot = BackupSnapshot::new(
            vec![shown, hidden],
            vec![LedgerEntry::debt(CustomerId::new(2), Money::from_cents(5), Utc::now())],
        );
        let path = temp.path().join("handmade.json");
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let restore = RestoreManager::new(&storage);
        let validation = restore.validate_backup(&path).unwrap();
        assert!(validation.is_valid);
        assert_eq!(validation.customer_count, 2);
        assert_eq!(validation.restorable_customers, 1);
        assert_eq!(validation.restorable_entries, 0);
        assert!(validation.summary().contains("2 records will be skipped"));

        // Validation never touches the store
        assert_eq!(storage.customer_count().unwrap(), 0);
    }

    #[test]
    fn test_future_version_is_rejected() {
        let (temp, storage, _manager) = create_test_env();
        add_customer(&storage, "Amina", 1000);
        let mut snapshot = BackupSnapshot::new(vec![], vec![]);
        snapshot.version = 42;
        let path = temp.path().join("future.json");
        fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let restore = RestoreManager::new(&storage);
        assert!(!restore.validate_backup(&path).unwrap().is_valid);
        let err = restore.restore_from_file(&path).unwrap_err();
        assert!(matches!(err, TallyError::Backup(_)));
        assert_eq!(storage.customer_count().unwrap(), 1);
    }

    #[test]
    fn test_future_version_takes_no_safety_backup() {
        let (_temp, storage, manager) = create_test_env();
        add_customer(&storage, "Amina", 1000);
        let mut snapshot = BackupSnapshot::new(vec![], vec![]);
        snapshot.version = 42;

        let err = RestoreManager::new(&storage)
            .with_safety_backup(&manager)
            .restore_snapshot(snapshot, "future")
            .unwrap_err();
        assert!(matches!(err, TallyError::Backup(_)));
        assert!(manager.list_backups().unwrap().is_empty());
        assert_eq!(storage.customer_count().unwrap(), 1);
    }

    #[test]
    fn test_unreadable_backup() {
        let (temp, storage, _manager) = create_test_env();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = RestoreManager::new(&storage)
            .restore_from_file(&path)
            .unwrap_err();
        assert!(matches!(err, TallyError::Json(_)));
    }
}
