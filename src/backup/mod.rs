//! Backup system for Tallybook
//!
//! Provides rolling backups with configurable retention policies, restore
//! functionality and the whole-ledger replace that restores are built on.
//!
//! # Architecture
//!
//! - `replace_all_data`: swaps every stored customer and entry for new data
//!   in one all-or-nothing transaction
//! - `BackupManager`: creates and manages backups with retention policies
//! - `RestoreManager`: validates and restores backups
//!
//! # Backup Format
//!
//! Backups are JSON files holding a `BackupSnapshot`:
//! - `version`: schema version
//! - `timestamp`: creation time in milliseconds since the epoch
//! - `customers`: live customers
//! - `entries`: ledger entries of those customers
//!
//! # Retention Policy
//!
//! By default, the system keeps:
//! - 30 daily backups
//! - 12 monthly backups (first backup of each month)
//!
//! # Example
//!
//! ```rust,ignore
//! use tallybook::backup::{BackupManager, RestoreManager};
//! use tallybook::config::{paths::TallyPaths, settings::BackupRetention};
//! use tallybook::storage::Storage;
//!
//! let paths = TallyPaths::new()?;
//! let storage = Storage::open(paths.clone())?;
//! let backup_manager = BackupManager::new(&paths, BackupRetention::default());
//!
//! let backup_path = backup_manager.create_backup(&storage)?;
//! backup_manager.enforce_retention()?;
//!
//! // Later, restore from backup
//! let result = RestoreManager::new(&storage).restore_from_file(&backup_path)?;
//! println!("{}", result.summary());
//! ```

mod manager;
mod replace;
mod restore;

pub use manager::{BackupInfo, BackupManager};
pub use replace::{
    check_snapshot_version, prepare_replacement, replace_all_data, replace_from_snapshot,
    ReplaceSummary, Replacement,
};
pub use restore::{RestoreManager, RestoreResult, ValidationResult};
