//! Whole-ledger replacement
//!
//! Swaps every persisted customer and entry for the contents of a snapshot
//! in a single storage transaction. Soft-deleted customers are dropped from
//! the incoming data, and so are entries whose customer did not survive.

use std::collections::HashSet;

use crate::audit::AuditEntry;
use crate::error::{TallyError, TallyResult};
use crate::models::{BackupSnapshot, Customer, CustomerId, LedgerEntry};
use crate::storage::Storage;

/// Incoming data after filtering
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Replacement {
    pub customers: Vec<Customer>,
    pub entries: Vec<LedgerEntry>,
    /// Soft-deleted customers left out
    pub skipped_customers: usize,
    /// Entries left out because their customer is missing or soft-deleted
    pub skipped_entries: usize,
}

/// Filter incoming data down to what will be persisted
pub fn prepare_replacement(customers: Vec<Customer>, entries: Vec<LedgerEntry>) -> Replacement {
    let incoming_customers = customers.len();
    let incoming_entries = entries.len();

    let customers: Vec<Customer> = customers.into_iter().filter(Customer::is_live).collect();
    let kept: HashSet<CustomerId> = customers.iter().map(|c| c.id).collect();
    let entries: Vec<LedgerEntry> = entries
        .into_iter()
        .filter(|e| kept.contains(&e.customer_id))
        .collect();

    Replacement {
        skipped_customers: incoming_customers - customers.len(),
        skipped_entries: incoming_entries - entries.len(),
        customers,
        entries,
    }
}

/// Outcome of a replace
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceSummary {
    /// Records that were in the store before
    pub customers_removed: usize,
    pub entries_removed: usize,
    /// Records now in the store
    pub customers_restored: usize,
    pub entries_restored: usize,
    /// Records filtered out of the incoming data
    pub customers_skipped: usize,
    pub entries_skipped: usize,
}

impl ReplaceSummary {
    pub fn summary(&self) -> String {
        let mut text = format!(
            "{} customers and {} entries restored",
            self.customers_restored, self.entries_restored
        );
        if self.customers_skipped > 0 || self.entries_skipped > 0 {
            text.push_str(&format!(
                " ({} deleted customers and {} orphaned entries skipped)",
                self.customers_skipped, self.entries_skipped
            ));
        }
        text
    }
}

/// Replace all persisted data with the given customers and entries
///
/// Deletes every entry, then every customer, then inserts the filtered
/// customers and entries, all in one transaction. If any step fails
/// (duplicate ids, disk error) nothing changes, in memory or on disk.
pub fn replace_all_data(
    storage: &Storage,
    customers: Vec<Customer>,
    entries: Vec<LedgerEntry>,
) -> TallyResult<ReplaceSummary> {
    apply(storage, prepare_replacement(customers, entries), "replace")
}

/// Replace all persisted data with the contents of a snapshot
pub fn replace_from_snapshot(
    storage: &Storage,
    snapshot: BackupSnapshot,
    source: &str,
) -> TallyResult<ReplaceSummary> {
    check_snapshot_version(&snapshot)?;
    replace_checked_snapshot(storage, snapshot, source)
}

/// Reject a snapshot written with a schema this build cannot read
pub fn check_snapshot_version(snapshot: &BackupSnapshot) -> TallyResult<()> {
    snapshot.check_version().map_err(TallyError::Backup)
}

/// Replace from a snapshot whose version has already been checked
pub(super) fn replace_checked_snapshot(
    storage: &Storage,
    snapshot: BackupSnapshot,
    source: &str,
) -> TallyResult<ReplaceSummary> {
    apply(
        storage,
        prepare_replacement(snapshot.customers, snapshot.entries),
        source,
    )
}

fn apply(storage: &Storage, replacement: Replacement, source: &str) -> TallyResult<ReplaceSummary> {
    let Replacement {
        customers,
        entries,
        skipped_customers,
        skipped_entries,
    } = replacement;

    let summary = storage.transaction(|tables| {
        let entries_removed = tables.delete_all_entries();
        let customers_removed = tables.delete_all_customers()?;

        let customers_restored = customers.len();
        for customer in customers {
            tables.insert_customer(customer)?;
        }
        let entries_restored = entries.len();
        for entry in entries {
            tables.insert_entry(entry)?;
        }

        Ok(ReplaceSummary {
            customers_removed,
            entries_removed,
            customers_restored,
            entries_restored,
            customers_skipped: skipped_customers,
            entries_skipped: skipped_entries,
        })
    })?;

    tracing::info!(
        source,
        customers = summary.customers_restored,
        entries = summary.entries_restored,
        skipped_customers = summary.customers_skipped,
        skipped_entries = summary.entries_skipped,
        "ledger replaced"
    );
    storage.record_audit(AuditEntry::replace(source, summary.summary()));

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::Money;
    use crate::reports::customers_with_balance;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    fn customer(id: i64, name: &str, deleted: bool) -> Customer {
        let mut c = Customer::new(name);
        c.id = CustomerId::new(id);
        c.is_deleted = deleted;
        c
    }

    fn debt(id: i64, customer: i64, cents: i64) -> LedgerEntry {
        let mut e = LedgerEntry::debt(
            CustomerId::new(customer),
            Money::from_cents(cents),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(id),
        );
        e.id = crate::models::EntryId::new(id);
        e
    }

    fn seed(storage: &Storage) {
        replace_all_data(
            storage,
            vec![customer(1, "Old", false)],
            vec![debt(1, 1, 100), debt(2, 1, 200)],
        )
        .unwrap();
    }

    fn stored(storage: &Storage) -> (Vec<Customer>, Vec<LedgerEntry>) {
        storage
            .read(|t| {
                (
                    t.customers().iter().cloned().collect(),
                    t.entries().iter().cloned().collect(),
                )
            })
            .unwrap()
    }

    #[test]
    fn test_prepare_filters_deleted_and_orphans() {
        let prepared = prepare_replacement(
            vec![customer(1, "A", false), customer(2, "B", true)],
            vec![debt(1, 1, 10), debt(2, 2, 20), debt(3, 3, 30)],
        );
        assert_eq!(prepared.customers.len(), 1);
        assert_eq!(prepared.entries.len(), 1);
        assert_eq!(prepared.entries[0].customer_id, CustomerId::new(1));
        assert_eq!(prepared.skipped_customers, 1);
        assert_eq!(prepared.skipped_entries, 2);
    }

    #[test]
    fn test_replace_keeps_only_live_data() {
        let (_temp_dir, storage) = create_test_storage();
        seed(&storage);

        let summary = replace_all_data(
            &storage,
            vec![customer(10, "A", false), customer(11, "B", true)],
            vec![debt(5, 10, 100), debt(6, 11, 200), debt(7, 12, 300)],
        )
        .unwrap();

        assert_eq!(summary.customers_removed, 1);
        assert_eq!(summary.entries_removed, 2);
        assert_eq!(summary.customers_restored, 1);
        assert_eq!(summary.entries_restored, 1);

        let (customers, entries) = stored(&storage);
        assert_eq!(customers, vec![customer(10, "A", false)]);
        assert_eq!(entries, vec![debt(5, 10, 100)]);
    }

    #[test]
    fn test_replace_survives_reload() {
        let (temp_dir, storage) = create_test_storage();
        replace_all_data(
            &storage,
            vec![customer(3, "A", false)],
            vec![debt(9, 3, 100)],
        )
        .unwrap();

        let reopened =
            Storage::open(TallyPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(stored(&reopened), stored(&storage));

        // Fresh ids continue after the restored ones
        let next = reopened
            .transaction(|t| t.create_customer(Customer::new("New")))
            .unwrap();
        assert_eq!(next.id, CustomerId::new(4));
    }

    #[test]
    fn test_replace_is_idempotent() {
        let (_temp_dir, storage) = create_test_storage();
        let customers = vec![customer(1, "A", false), customer(2, "B", true)];
        let entries = vec![debt(1, 1, 10), debt(2, 2, 20)];

        replace_all_data(&storage, customers.clone(), entries.clone()).unwrap();
        let once = stored(&storage);
        replace_all_data(&storage, customers, entries).unwrap();
        assert_eq!(stored(&storage), once);
    }

    #[test]
    fn test_duplicate_ids_roll_back() {
        let (_temp_dir, storage) = create_test_storage();
        seed(&storage);
        let before = stored(&storage);
        let revision = storage.snapshot().revision;

        let err = replace_all_data(
            &storage,
            vec![customer(5, "A", false), customer(5, "A again", false)],
            vec![],
        )
        .unwrap_err();
        assert!(err.is_duplicate());

        assert_eq!(stored(&storage), before);
        assert_eq!(storage.snapshot().revision, revision);

        let on_disk = Storage::open(storage.paths().clone()).unwrap();
        assert_eq!(stored(&on_disk), before);
    }

    #[test]
    fn test_commit_failure_rolls_back() {
        let (_temp_dir, storage) = create_test_storage();
        seed(&storage);
        let before = stored(&storage);

        // Make the final rename impossible
        let ledger = storage.paths().ledger_file();
        std::fs::remove_file(&ledger).unwrap();
        std::fs::create_dir(&ledger).unwrap();

        let result = replace_all_data(&storage, vec![customer(9, "New", false)], vec![]);
        assert!(result.is_err());
        assert_eq!(stored(&storage), before);
    }

    #[test]
    fn test_replace_from_snapshot_checks_version() {
        let (_temp_dir, storage) = create_test_storage();
        let mut snapshot = BackupSnapshot::new(vec![customer(1, "A", false)], vec![]);
        snapshot.version = 99;
        let err = replace_from_snapshot(&storage, snapshot, "test").unwrap_err();
        assert!(matches!(err, TallyError::Backup(_)));
        assert_eq!(storage.customer_count().unwrap(), 0);
    }

    #[test]
    fn test_max_id_rolls_back_and_storage_stays_usable() {
        let (_temp_dir, storage) = create_test_storage();
        seed(&storage);
        let before = stored(&storage);
        let revision = storage.snapshot().revision;

        let err = replace_all_data(&storage, vec![customer(i64::MAX, "Last", false)], vec![])
            .unwrap_err();
        assert!(matches!(err, TallyError::Storage(_)));
        assert_eq!(stored(&storage), before);
        assert_eq!(storage.snapshot().revision, revision);

        let err = replace_all_data(
            &storage,
            vec![customer(1, "A", false)],
            vec![debt(i64::MAX, 1, 100)],
        )
        .unwrap_err();
        assert!(matches!(err, TallyError::Storage(_)));
        assert_eq!(stored(&storage), before);

        let created = storage
            .transaction(|t| t.create_customer(Customer::new("After")))
            .unwrap();
        assert_eq!(created.id, CustomerId::new(2));
        assert_eq!(storage.customer_count().unwrap(), 2);
    }

    #[test]
    fn test_replace_is_audited() {
        let (_temp_dir, storage) = create_test_storage();
        seed(&storage);
        let audit = storage.audit().read_all().unwrap();
        let last = audit.last().unwrap();
        assert_eq!(last.operation, crate::audit::Operation::Replace);
        assert!(last
            .diff_summary
            .as_deref()
            .unwrap_or_default()
            .contains("1 customers and 2 entries restored"));
    }

    #[test]
    fn test_large_replace() {
        let (_temp_dir, storage) = create_test_storage();
        let customers: Vec<Customer> = (1..=100)
            .map(|i| customer(i, &format!("Customer {:03}", i), false))
            .collect();
        let entries: Vec<LedgerEntry> = (1..=100)
            .flat_map(|c| (0..50).map(move |n| debt(c * 100 + n, c, 100)))
            .collect();

        let summary = replace_all_data(&storage, customers, entries).unwrap();
        assert_eq!(summary.customers_restored, 100);
        assert_eq!(summary.entries_restored, 5000);
        assert_eq!(storage.entry_count().unwrap(), 5000);

        let snapshot = storage.snapshot();
        let rows = customers_with_balance(&snapshot.customers, &snapshot.entries);
        assert_eq!(rows.len(), 100);
        assert!(rows.iter().all(|r| r.balance == Money::from_units(50, 0)));
    }
}
