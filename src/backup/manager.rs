//! Backup manager for Tallybook
//!
//! Writes the live ledger to dated snapshot files and prunes old ones
//! according to the retention policy.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::paths::TallyPaths;
use crate::config::settings::BackupRetention;
use crate::error::{TallyError, TallyResult};
use crate::models::BackupSnapshot;
use crate::storage::{write_json_atomic, LedgerSnapshot, Storage};

/// Metadata about a backup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupInfo {
    /// Backup filename
    pub filename: String,
    /// Full path to backup
    pub path: PathBuf,
    /// When the backup was created
    pub created_at: DateTime<Utc>,
    /// Size in bytes
    pub size_bytes: u64,
    /// Whether this is the first backup of its month (kept longer)
    pub is_monthly: bool,
}

/// Manages backup creation and retention
pub struct BackupManager {
    backup_dir: PathBuf,
    retention: BackupRetention,
}

impl BackupManager {
    /// Create a new BackupManager
    pub fn new(paths: &TallyPaths, retention: BackupRetention) -> Self {
        Self {
            backup_dir: paths.backup_dir(),
            retention,
        }
    }

    /// Back up the committed state of a store
    ///
    /// Returns the path to the created backup file.
    pub fn create_backup(&self, storage: &Storage) -> TallyResult<PathBuf> {
        self.create_backup_from(&storage.snapshot())
    }

    /// Back up a ledger snapshot. Soft-deleted customers and their entries
    /// are left out.
    pub fn create_backup_from(&self, snapshot: &LedgerSnapshot) -> TallyResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir)
            .map_err(|e| TallyError::Io(format!("Failed to create backup directory: {}", e)))?;

        let backup = BackupSnapshot::new(
            snapshot.live_customers().cloned().collect(),
            snapshot.live_entries(),
        );
        let filename = backup_filename(backup.timestamp);
        let backup_path = self.backup_dir.join(&filename);

        write_json_atomic(&backup_path, &backup)
            .map_err(|e| TallyError::Backup(format!("Failed to write {}: {}", filename, e)))?;

        tracing::info!(
            path = %backup_path.display(),
            customers = backup.customers.len(),
            entries = backup.entries.len(),
            "backup created"
        );
        Ok(backup_path)
    }

    /// List all available backups, newest first
    pub fn list_backups(&self) -> TallyResult<Vec<BackupInfo>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.backup_dir)
            .map_err(|e| TallyError::Io(format!("Failed to read backup directory: {}", e)))?
        {
            let entry = entry
                .map_err(|e| TallyError::Io(format!("Failed to read directory entry: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(info) = parse_backup_info(&path) {
                    backups.push(info);
                }
            }
        }

        mark_monthly(&mut backups);
        backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(backups)
    }

    /// Delete backups beyond the retention policy
    ///
    /// The first backup of each month counts against the monthly allowance,
    /// every other one against the daily allowance.
    pub fn enforce_retention(&self) -> TallyResult<Vec<PathBuf>> {
        let (monthly, daily): (Vec<_>, Vec<_>) =
            self.list_backups()?.into_iter().partition(|b| b.is_monthly);

        let expired = daily
            .into_iter()
            .skip(self.retention.daily_count as usize)
            .chain(
                monthly
                    .into_iter()
                    .skip(self.retention.monthly_count as usize),
            );

        let mut deleted = Vec::new();
        for backup in expired {
            fs::remove_file(&backup.path)
                .map_err(|e| TallyError::Io(format!("Failed to delete old backup: {}", e)))?;
            tracing::debug!(path = %backup.path.display(), "old backup removed");
            deleted.push(backup.path);
        }
        Ok(deleted)
    }

    /// Create a backup and then enforce retention policy
    pub fn create_backup_with_retention(
        &self,
        storage: &Storage,
    ) -> TallyResult<(PathBuf, Vec<PathBuf>)> {
        let backup_path = self.create_backup(storage)?;
        let deleted = self.enforce_retention()?;
        Ok((backup_path, deleted))
    }

    /// Get backup directory path
    pub fn backup_dir(&self) -> &PathBuf {
        &self.backup_dir
    }

    /// Get a specific backup by filename
    pub fn get_backup(&self, filename: &str) -> TallyResult<Option<BackupInfo>> {
        Ok(self
            .list_backups()?
            .into_iter()
            .find(|b| b.filename == filename))
    }

    /// Get the most recent backup
    pub fn get_latest_backup(&self) -> TallyResult<Option<BackupInfo>> {
        Ok(self.list_backups()?.into_iter().next())
    }
}

/// `backup-YYYYMMDD-HHMMSS-mmm.json`
fn backup_filename(timestamp: DateTime<Utc>) -> String {
    format!(
        "backup-{}-{:03}.json",
        timestamp.format("%Y%m%d-%H%M%S"),
        timestamp.timestamp_subsec_millis()
    )
}

fn parse_backup_info(path: &Path) -> Option<BackupInfo> {
    let filename = path.file_name()?.to_string_lossy().to_string();
    let date_part = filename.strip_prefix("backup-")?.strip_suffix(".json")?;
    let created_at = parse_backup_timestamp(date_part)?;
    let size_bytes = fs::metadata(path).ok()?.len();

    Some(BackupInfo {
        filename,
        path: path.to_path_buf(),
        created_at,
        size_bytes,
        is_monthly: false,
    })
}

/// Flag the earliest backup of every calendar month
fn mark_monthly(backups: &mut [BackupInfo]) {
    backups.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    let mut last_month = None;
    for backup in backups.iter_mut() {
        let month = (backup.created_at.year(), backup.created_at.month());
        backup.is_monthly = last_month != Some(month);
        last_month = Some(month);
    }
}

/// Parse `YYYYMMDD-HHMMSS` or `YYYYMMDD-HHMMSS-mmm`
fn parse_backup_timestamp(date_str: &str) -> Option<DateTime<Utc>> {
    let mut parts = date_str.split('-');
    let date_part = parts.next()?;
    let time_part = parts.next()?;
    let millis: u32 = match parts.next() {
        Some(ms) => ms.parse().ok()?,
        None => 0,
    };
    if parts.next().is_some() || date_part.len() != 8 || time_part.len() != 6 {
        return None;
    }

    let date = NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()?;
    let time = chrono::NaiveTime::parse_from_str(time_part, "%H%M%S")
        .ok()?
        .with_nanosecond(millis.checked_mul(1_000_000)?)?;

    Some(DateTime::from_naive_utc_and_offset(
        chrono::NaiveDateTime::new(date, time),
        Utc,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, LedgerEntry, Money};
    use tempfile::TempDir;

    fn create_test_env() -> (TempDir, Storage, BackupManager) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths.clone()).unwrap();
        let retention = BackupRetention {
            daily_count: 3,
            monthly_count: 2,
        };
        let manager = BackupManager::new(&paths, retention);
        (temp_dir, storage, manager)
    }

    fn pause() {
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    #[test]
    fn test_create_backup_contains_live_data_only() {
        let (_temp, storage, manager) = create_test_env();
        storage
            .transaction(|t| {
                let keep = t.create_customer(Customer::new("Keep"))?;
                let mut hidden = Customer::new("Hidden");
                hidden.is_deleted = true;
                let hidden = t.create_customer(hidden)?;
                t.create_entry(LedgerEntry::debt(keep.id, Money::from_cents(100), Utc::now()))?;
                t.create_entry(LedgerEntry::debt(hidden.id, Money::from_cents(200), Utc::now()))?;
                Ok(())
            })
            .unwrap();

        let path = manager.create_backup(&storage).unwrap();
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("backup-"));

        let backup: BackupSnapshot =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(backup.version, crate::models::SNAPSHOT_VERSION);
        assert_eq!(backup.customers.len(), 1);
        assert_eq!(backup.customers[0].name, "Keep");
        assert_eq!(backup.entries.len(), 1);
    }

    #[test]
    fn test_list_backups_newest_first() {
        let (_temp, storage, manager) = create_test_env();
        assert!(manager.list_backups().unwrap().is_empty());

        manager.create_backup(&storage).unwrap();
        pause();
        let newest = manager.create_backup(&storage).unwrap();

        let backups = manager.list_backups().unwrap();
        assert_eq!(backups.len(), 2);
        assert!(backups[0].created_at >= backups[1].created_at);
        assert_eq!(backups[0].path, newest);
        assert_eq!(manager.get_latest_backup().unwrap().unwrap().path, newest);
    }

    #[test]
    fn test_retention_policy() {
        let (_temp, storage, manager) = create_test_env();
        for _ in 0..6 {
            manager.create_backup(&storage).unwrap();
            pause();
        }

        // One monthly (the earliest) plus five daily; three daily are kept
        let deleted = manager.enforce_retention().unwrap();
        assert_eq!(deleted.len(), 2);

        let remaining = manager.list_backups().unwrap();
        assert_eq!(remaining.len(), 4);
        assert_eq!(remaining.iter().filter(|b| b.is_monthly).count(), 1);
    }

    #[test]
    fn test_get_backup_by_name() {
        let (_temp, storage, manager) = create_test_env();
        let path = manager.create_backup(&storage).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();

        let info = manager.get_backup(&name).unwrap().unwrap();
        assert_eq!(info.path, path);
        assert!(info.size_bytes > 0);
        assert!(manager.get_backup("backup-nope.json").unwrap().is_none());
    }

    #[test]
    fn test_parse_backup_timestamp() {
        let timestamp = parse_backup_timestamp("20251127-143022").unwrap();
        assert_eq!(timestamp.year(), 2025);
        assert_eq!(timestamp.month(), 11);
        assert_eq!(timestamp.day(), 27);

        let timestamp = parse_backup_timestamp("20251127-143022-456").unwrap();
        assert_eq!(timestamp.timestamp_subsec_millis(), 456);

        assert!(parse_backup_timestamp("2025-11-27").is_none());
        assert!(parse_backup_timestamp("20251127-1430").is_none());
    }

    #[test]
    fn test_filename_round_trips_timestamp() {
        let now = Utc::now();
        let name = backup_filename(now);
        let parsed = parse_backup_timestamp(
            name.strip_prefix("backup-")
                .and_then(|s| s.strip_suffix(".json"))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(parsed.timestamp_millis(), now.timestamp_millis());
    }
}
