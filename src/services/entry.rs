//! Ledger entry service
//!
//! Records debts and payments against customers.

use chrono::{DateTime, Utc};

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{CustomerId, EntryId, EntryKind, LedgerEntry, Money};
use crate::storage::Storage;

/// Input for recording a new entry
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub customer_id: CustomerId,
    pub kind: EntryKind,
    pub amount: Money,
    /// Defaults to now
    pub timestamp: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Service for ledger entry management
pub struct EntryService<'a> {
    storage: &'a Storage,
}

impl<'a> EntryService<'a> {
    /// Create a new entry service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a debt or payment for a live customer
    pub fn add(&self, input: NewEntry) -> TallyResult<LedgerEntry> {
        let mut entry = LedgerEntry::new(
            input.customer_id,
            input.kind,
            input.amount,
            input.timestamp.unwrap_or_else(Utc::now),
        );
        entry.note = clean_note(input.note);
        entry
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        let (entry, customer_name) = self.storage.transaction(|tables| {
            let customer = tables
                .customers()
                .get_live(entry.customer_id)
                .ok_or_else(|| TallyError::customer_not_found(entry.customer_id.to_string()))?;
            let name = customer.name.clone();
            Ok((tables.create_entry(entry)?, name))
        })?;

        tracing::info!(
            entry = %entry.id,
            customer = %entry.customer_id,
            kind = %entry.kind,
            amount = %entry.amount,
            "entry recorded"
        );
        self.storage.log_create(
            EntityType::LedgerEntry,
            entry.id.to_string(),
            Some(customer_name),
            &entry,
        );

        Ok(entry)
    }

    /// Shorthand for a DEBT entry timestamped now
    pub fn add_debt(&self, customer_id: CustomerId, amount: Money) -> TallyResult<LedgerEntry> {
        self.add(NewEntry {
            customer_id,
            kind: EntryKind::Debt,
            amount,
            timestamp: None,
            note: None,
        })
    }

    /// Shorthand for a PAYMENT entry timestamped now
    pub fn add_payment(&self, customer_id: CustomerId, amount: Money) -> TallyResult<LedgerEntry> {
        self.add(NewEntry {
            customer_id,
            kind: EntryKind::Payment,
            amount,
            timestamp: None,
            note: None,
        })
    }

    /// Get an entry by ID
    pub fn get(&self, id: EntryId) -> TallyResult<Option<LedgerEntry>> {
        self.storage.read(|t| t.entries().get(id).cloned())
    }

    /// All entries, oldest first
    pub fn list(&self) -> TallyResult<Vec<LedgerEntry>> {
        let mut entries: Vec<LedgerEntry> =
            self.storage.read(|t| t.entries().iter().cloned().collect())?;
        entries.sort_by_key(|e| (e.timestamp, e.id));
        Ok(entries)
    }

    /// Entries of one customer, oldest first
    pub fn list_for_customer(&self, customer_id: CustomerId) -> TallyResult<Vec<LedgerEntry>> {
        self.storage.read(|t| {
            t.entries()
                .for_customer(customer_id)
                .into_iter()
                .cloned()
                .collect()
        })
    }

    /// Replace an entry record
    ///
    /// Returns false when no entry has the record's id. The entry may be
    /// moved to another customer as long as that customer is live.
    pub fn update(&self, mut entry: LedgerEntry) -> TallyResult<bool> {
        entry.note = clean_note(entry.note.take());
        entry
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        let after = entry.clone();
        let before = self.storage.transaction(|tables| {
            let moved = tables
                .entries()
                .get(entry.id)
                .is_some_and(|current| current.customer_id != entry.customer_id);
            if moved && tables.customers().get_live(entry.customer_id).is_none() {
                return Err(TallyError::customer_not_found(
                    entry.customer_id.to_string(),
                ));
            }
            tables.update_entry(entry)
        })?;

        match before {
            Some(before) => {
                tracing::info!(entry = %after.id, "entry updated");
                self.storage.log_update(
                    EntityType::LedgerEntry,
                    after.id.to_string(),
                    None,
                    &before,
                    &after,
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Delete an entry. Returns false when it does not exist.
    pub fn delete(&self, id: EntryId) -> TallyResult<bool> {
        let removed = self
            .storage
            .transaction(|tables| Ok(tables.delete_entry(id)))?;

        match removed {
            Some(entry) => {
                tracing::info!(entry = %id, "entry deleted");
                self.storage
                    .log_delete(EntityType::LedgerEntry, id.to_string(), None, &entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn clean_note(note: Option<String>) -> Option<String> {
    note.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
