//! Storage layer for Tallybook
//!
//! A single-writer store holding two tables, `customers` and
//! `ledger_entries`, persisted together in one JSON document so that a
//! transaction touching both tables commits with one atomic rename.
//!
//! Every write goes through [`Storage::transaction`]: the closure runs on a
//! working copy while the write lock is held, the copy is written to disk,
//! and only then does it replace the live tables. A failure anywhere leaves
//! memory and disk exactly as they were.

pub mod customers;
pub mod entries;
pub mod feed;
pub mod file_io;

pub use customers::CustomerTable;
pub use entries::EntryTable;
pub use feed::LedgerSnapshot;
pub use file_io::{read_json, read_json_required, write_json_atomic};

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::TallyPaths;
use crate::error::{TallyError, TallyResult};
use crate::models::{Customer, CustomerId, EntryId, LedgerEntry};

/// On-disk layout of `ledger.json`
#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    #[serde(default)]
    customers: Vec<Customer>,
    #[serde(default)]
    ledger_entries: Vec<LedgerEntry>,
    #[serde(default)]
    next_customer_id: Option<CustomerId>,
    #[serde(default)]
    next_entry_id: Option<EntryId>,
}

/// Both tables plus id counters. Inside a transaction this is the working
/// copy handed to the closure.
#[derive(Debug, Clone)]
pub struct LedgerTables {
    customers: CustomerTable,
    entries: EntryTable,
    next_customer_id: CustomerId,
    next_entry_id: EntryId,
    revision: u64,
}

impl Default for LedgerTables {
    fn default() -> Self {
        Self {
            customers: CustomerTable::default(),
            entries: EntryTable::default(),
            next_customer_id: CustomerId::new(1),
            next_entry_id: EntryId::new(1),
            revision: 0,
        }
    }
}

impl LedgerTables {
    fn from_file(file: LedgerFile) -> TallyResult<Self> {
        let customers = CustomerTable::from_rows(file.customers)?;
        let entries = EntryTable::from_rows(file.ledger_entries)?;

        let orphans = entries
            .iter()
            .filter(|e| !customers.contains(e.customer_id))
            .count();
        if orphans > 0 {
            tracing::warn!(orphans, "ledger file has entries without a customer");
        }

        let mut tables = Self {
            customers,
            entries,
            ..Self::default()
        };
        tables.bump_customer_counter(file.next_customer_id.unwrap_or(CustomerId::new(1)));
        tables.bump_entry_counter(file.next_entry_id.unwrap_or(EntryId::new(1)));
        if let Some(max) = tables.customers.max_id() {
            match max.next() {
                Some(next) => tables.bump_customer_counter(next),
                None => tracing::warn!(%max, "customer ids exhausted"),
            }
        }
        if let Some(max) = tables.entries.max_id() {
            match max.next() {
                Some(next) => tables.bump_entry_counter(next),
                None => tracing::warn!(%max, "entry ids exhausted"),
            }
        }
        Ok(tables)
    }

    fn to_file(&self) -> LedgerFile {
        LedgerFile {
            customers: self.customers.iter().cloned().collect(),
            ledger_entries: self.entries.iter().cloned().collect(),
            next_customer_id: Some(self.next_customer_id),
            next_entry_id: Some(self.next_entry_id),
        }
    }

    fn bump_customer_counter(&mut self, candidate: CustomerId) {
        if candidate > self.next_customer_id {
            self.next_customer_id = candidate;
        }
    }

    fn bump_entry_counter(&mut self, candidate: EntryId) {
        if candidate > self.next_entry_id {
            self.next_entry_id = candidate;
        }
    }

    pub fn customers(&self) -> &CustomerTable {
        &self.customers
    }

    pub fn entries(&self) -> &EntryTable {
        &self.entries
    }

    /// Commit counter of the state these tables were copied from
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Insert a customer under a freshly assigned id
    pub fn create_customer(&mut self, mut customer: Customer) -> TallyResult<Customer> {
        customer.id = self.next_customer_id;
        let next = customer.id.next().ok_or_else(|| ids_exhausted(customer.id))?;
        self.customers.insert(customer.clone())?;
        self.next_customer_id = next;
        Ok(customer)
    }

    /// Insert a customer keeping its id
    pub fn insert_customer(&mut self, customer: Customer) -> TallyResult<()> {
        let next = customer.id.next().ok_or_else(|| ids_exhausted(customer.id))?;
        self.customers.insert(customer)?;
        self.bump_customer_counter(next);
        Ok(())
    }

    /// Replace a customer record. Returns the previous version, or None when
    /// the id is unknown.
    pub fn update_customer(&mut self, customer: Customer) -> Option<Customer> {
        self.customers.replace(customer)
    }

    /// Delete a customer and all its entries
    pub fn delete_customer(&mut self, id: CustomerId) -> Option<(Customer, Vec<LedgerEntry>)> {
        let customer = self.customers.remove(id)?;
        let entries = self.entries.remove_for_customer(id);
        Some((customer, entries))
    }

    /// Insert an entry under a freshly assigned id
    pub fn create_entry(&mut self, mut entry: LedgerEntry) -> TallyResult<LedgerEntry> {
        self.check_customer_reference(&entry)?;
        entry.id = self.next_entry_id;
        let next = entry.id.next().ok_or_else(|| ids_exhausted(entry.id))?;
        self.entries.insert(entry.clone())?;
        self.next_entry_id = next;
        Ok(entry)
    }

    /// Insert an entry keeping its id
    pub fn insert_entry(&mut self, entry: LedgerEntry) -> TallyResult<()> {
        self.check_customer_reference(&entry)?;
        let next = entry.id.next().ok_or_else(|| ids_exhausted(entry.id))?;
        self.entries.insert(entry)?;
        self.bump_entry_counter(next);
        Ok(())
    }

    /// Replace an entry record. Returns the previous version, or None when
    /// the id is unknown.
    pub fn update_entry(&mut self, entry: LedgerEntry) -> TallyResult<Option<LedgerEntry>> {
        if self.entries.get(entry.id).is_none() {
            return Ok(None);
        }
        self.check_customer_reference(&entry)?;
        Ok(self.entries.replace(entry))
    }

    pub fn delete_entry(&mut self, id: EntryId) -> Option<LedgerEntry> {
        self.entries.remove(id)
    }

    /// Delete every ledger entry
    pub fn delete_all_entries(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Delete every customer. Entries must have been deleted first.
    pub fn delete_all_customers(&mut self) -> TallyResult<usize> {
        if !self.entries.is_empty() {
            return Err(TallyError::Storage(format!(
                "Cannot delete all customers while {} ledger entries still reference them",
                self.entries.len()
            )));
        }
        let count = self.customers.len();
        self.customers.clear();
        Ok(count)
    }

    fn check_customer_reference(&self, entry: &LedgerEntry) -> TallyResult<()> {
        if self.customers.contains(entry.customer_id) {
            Ok(())
        } else {
            Err(TallyError::Storage(format!(
                "Ledger entry {} references missing customer {}",
                entry.id, entry.customer_id
            )))
        }
    }
}

fn ids_exhausted(last: impl std::fmt::Display) -> TallyError {
    TallyError::Storage(format!("No ids left after {}", last))
}

/// Main storage coordinator: the tables, their file, the snapshot feed and
/// the audit log
pub struct Storage {
    paths: TallyPaths,
    tables: RwLock<LedgerTables>,
    feed: watch::Sender<LedgerSnapshot>,
    audit: AuditLogger,
}

impl Storage {
    /// Create a new, empty Storage instance
    pub fn new(paths: TallyPaths) -> TallyResult<Self> {
        paths.ensure_directories()?;

        let (feed, _) = watch::channel(LedgerSnapshot::default());
        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            tables: RwLock::new(LedgerTables::default()),
            feed,
            paths,
        })
    }

    /// Create a Storage instance and load the ledger from disk
    pub fn open(paths: TallyPaths) -> TallyResult<Self> {
        let storage = Self::new(paths)?;
        storage.load()?;
        Ok(storage)
    }

    /// Get the paths configuration
    pub fn paths(&self) -> &TallyPaths {
        &self.paths
    }

    /// The audit log
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// (Re)load the tables from disk and publish them
    pub fn load(&self) -> TallyResult<()> {
        let file: LedgerFile = read_json(self.paths.ledger_file())?;
        let loaded = LedgerTables::from_file(file)?;

        let mut tables = self
            .tables
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;
        let revision = tables.revision + 1;
        *tables = LedgerTables {
            revision,
            ..loaded
        };
        self.feed.send_replace(LedgerSnapshot::capture(&tables));

        tracing::debug!(
            customers = tables.customers.len(),
            entries = tables.entries.len(),
            "loaded ledger"
        );
        Ok(())
    }

    /// Run a read-only query against the committed tables
    pub fn read<T>(&self, query: impl FnOnce(&LedgerTables) -> T) -> TallyResult<T> {
        let tables = self
            .tables
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;
        Ok(query(&tables))
    }

    /// Run an all-or-nothing write
    ///
    /// The closure works on a copy of the tables. If it returns an error, or
    /// the copy cannot be written to disk, the copy is discarded and the
    /// committed state is untouched. Readers are blocked for the duration, so
    /// nobody observes an intermediate state.
    pub fn transaction<T, F>(&self, work: F) -> TallyResult<T>
    where
        F: FnOnce(&mut LedgerTables) -> TallyResult<T>,
    {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        let mut working = tables.clone();
        let value = match work(&mut working) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, "transaction rolled back");
                return Err(err);
            }
        };

        if let Err(err) = write_json_atomic(self.paths.ledger_file(), &working.to_file()) {
            tracing::warn!(error = %err, "transaction commit failed, rolled back");
            return Err(err);
        }

        working.revision = tables.revision + 1;
        *tables = working;
        self.feed.send_replace(LedgerSnapshot::capture(&tables));

        tracing::debug!(revision = tables.revision, "transaction committed");
        Ok(value)
    }

    /// Latest committed snapshot
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.feed.borrow().clone()
    }

    /// Subscribe to committed snapshots
    pub fn subscribe(&self) -> watch::Receiver<LedgerSnapshot> {
        self.feed.subscribe()
    }

    /// Number of persisted customers (including soft-deleted ones)
    pub fn customer_count(&self) -> TallyResult<usize> {
        self.read(|t| t.customers.len())
    }

    /// Number of persisted ledger entries
    pub fn entry_count(&self) -> TallyResult<usize> {
        self.read(|t| t.entries.len())
    }

    /// Check if storage has been initialized (settings file written)
    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    /// Append an audit record. The write has already committed, so a failing
    /// audit log is reported but not propagated.
    pub fn record_audit(&self, entry: AuditEntry) {
        if let Err(err) = self.audit.log(&entry) {
            tracing::warn!(error = %err, "failed to write audit entry");
        }
    }

    pub(crate) fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.record_audit(AuditEntry::create(entity_type, entity_id, entity_name, entity));
    }

    pub(crate) fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) {
        let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
            (Ok(b), Ok(a)) => crate::audit::generate_diff(&b, &a),
            _ => None,
        };
        self.record_audit(AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff,
        ));
    }

    pub(crate) fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) {
        self.record_audit(AuditEntry::delete(entity_type, entity_id, entity_name, entity));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    fn debt(customer: CustomerId, cents: i64) -> LedgerEntry {
        LedgerEntry::debt(
            customer,
            Money::from_cents(cents),
            Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        )
    }

    #[test]
    fn test_storage_creation() {
        let (temp_dir, storage) = create_test_storage();
        assert!(temp_dir.path().join("data").exists());
        assert!(temp_dir.path().join("backups").exists());
        assert!(!storage.is_initialized());
        assert_eq!(storage.customer_count().unwrap(), 0);
    }

    #[test]
    fn test_ids_are_assigned_in_sequence() {
        let (_temp, storage) = create_test_storage();
        let (a, b) = storage
            .transaction(|tx| {
                let a = tx.create_customer(Customer::new("Amina"))?;
                let b = tx.create_customer(Customer::new("Brian"))?;
                Ok((a.id, b.id))
            })
            .unwrap();
        assert_eq!(a, CustomerId::new(1));
        assert_eq!(b, CustomerId::new(2));
    }

    #[test]
    fn test_commit_persists_and_reloads() {
        let (temp_dir, storage) = create_test_storage();
        storage
            .transaction(|tx| {
                let c = tx.create_customer(Customer::new("Amina"))?;
                tx.create_entry(debt(c.id, 500))?;
                Ok(())
            })
            .unwrap();

        let reopened =
            Storage::open(TallyPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        assert_eq!(reopened.customer_count().unwrap(), 1);
        assert_eq!(reopened.entry_count().unwrap(), 1);

        // Counters survive the reload
        let next = reopened
            .transaction(|tx| tx.create_customer(Customer::new("Brian")))
            .unwrap();
        assert_eq!(next.id, CustomerId::new(2));
    }

    #[test]
    fn test_failed_closure_rolls_back() {
        let (_temp, storage) = create_test_storage();
        storage
            .transaction(|tx| tx.create_customer(Customer::new("Amina")).map(|_| ()))
            .unwrap();
        let before = storage.snapshot();

        let result: TallyResult<()> = storage.transaction(|tx| {
            tx.delete_all_entries();
            tx.delete_all_customers()?;
            tx.create_customer(Customer::new("Brian"))?;
            Err(TallyError::Storage("boom".into()))
        });

        assert!(result.is_err());
        let after = storage.snapshot();
        assert_eq!(after.revision, before.revision);
        assert_eq!(after.customers.len(), 1);
        assert_eq!(after.customers[0].name, "Amina");
    }

    #[test]
    fn test_entry_requires_existing_customer() {
        let (_temp, storage) = create_test_storage();
        let err = storage
            .transaction(|tx| tx.create_entry(debt(CustomerId::new(42), 100)))
            .unwrap_err();
        assert!(matches!(err, TallyError::Storage(_)));
        assert_eq!(storage.entry_count().unwrap(), 0);
    }

    #[test]
    fn test_delete_customer_cascades() {
        let (_temp, storage) = create_test_storage();
        let id = storage
            .transaction(|tx| {
                let a = tx.create_customer(Customer::new("Amina"))?;
                let b = tx.create_customer(Customer::new("Brian"))?;
                tx.create_entry(debt(a.id, 100))?;
                tx.create_entry(debt(a.id, 200))?;
                tx.create_entry(debt(b.id, 300))?;
                Ok(a.id)
            })
            .unwrap();

        let removed = storage
            .transaction(|tx| Ok(tx.delete_customer(id)))
            .unwrap()
            .unwrap();
        assert_eq!(removed.1.len(), 2);
        assert_eq!(storage.entry_count().unwrap(), 1);
    }

    #[test]
    fn test_delete_all_customers_refuses_orphans() {
        let (_temp, storage) = create_test_storage();
        storage
            .transaction(|tx| {
                let a = tx.create_customer(Customer::new("Amina"))?;
                tx.create_entry(debt(a.id, 100))?;
                Ok(())
            })
            .unwrap();

        assert!(storage.transaction(|tx| tx.delete_all_customers()).is_err());
        assert_eq!(storage.customer_count().unwrap(), 1);
    }

    #[test]
    fn test_commits_publish_snapshots() {
        let (_temp, storage) = create_test_storage();
        let mut rx = storage.subscribe();
        let start = rx.borrow_and_update().revision;

        storage
            .transaction(|tx| tx.create_customer(Customer::new("Amina")).map(|_| ()))
            .unwrap();

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.revision, start + 1);
        assert_eq!(snapshot.customers.len(), 1);
    }

    #[test]
    fn test_rolled_back_transaction_publishes_nothing() {
        let (_temp, storage) = create_test_storage();
        let mut rx = storage.subscribe();
        rx.borrow_and_update();

        let _ = storage.transaction(|_| -> TallyResult<()> { Err(TallyError::Storage("no".into())) });
        assert!(!rx.has_changed().unwrap());
    }
}
