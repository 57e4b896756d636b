//! The `ledger_entries` table
//!
//! Entries keyed by id with a secondary index from customer id to entry ids,
//! so a customer's history and the cascade on customer deletion don't need a
//! full scan.

use std::collections::{BTreeMap, HashMap};

use crate::error::TallyError;
use crate::models::{CustomerId, EntryId, LedgerEntry};

/// Rows of the ledger_entries table
#[derive(Debug, Clone, Default)]
pub struct EntryTable {
    rows: BTreeMap<EntryId, LedgerEntry>,
    /// Index: customer_id -> entry ids
    by_customer: HashMap<CustomerId, Vec<EntryId>>,
}

impl EntryTable {
    /// Build the table from stored rows, rejecting duplicate ids
    pub fn from_rows(rows: Vec<LedgerEntry>) -> Result<Self, TallyError> {
        let mut table = Self::default();
        for entry in rows {
            table.insert(entry)?;
        }
        Ok(table)
    }

    pub fn get(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.rows.get(&id)
    }

    /// Insert a new row; the id must not be taken
    pub fn insert(&mut self, entry: LedgerEntry) -> Result<(), TallyError> {
        if self.rows.contains_key(&entry.id) {
            return Err(TallyError::Duplicate {
                entity_type: "Ledger entry",
                identifier: entry.id.to_string(),
            });
        }
        self.by_customer
            .entry(entry.customer_id)
            .or_default()
            .push(entry.id);
        self.rows.insert(entry.id, entry);
        Ok(())
    }

    /// Replace an existing row, moving it between customers if needed.
    /// Returns the previous version, or None if the id is unknown.
    pub fn replace(&mut self, entry: LedgerEntry) -> Option<LedgerEntry> {
        let previous = self.rows.remove(&entry.id)?;
        self.unindex(&previous);
        self.by_customer
            .entry(entry.customer_id)
            .or_default()
            .push(entry.id);
        self.rows.insert(entry.id, entry);
        Some(previous)
    }

    /// Remove a row
    pub fn remove(&mut self, id: EntryId) -> Option<LedgerEntry> {
        let entry = self.rows.remove(&id)?;
        self.unindex(&entry);
        Some(entry)
    }

    /// Remove every entry of a customer, returning them
    pub fn remove_for_customer(&mut self, customer_id: CustomerId) -> Vec<LedgerEntry> {
        self.by_customer
            .remove(&customer_id)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.rows.remove(&id))
            .collect()
    }

    /// Delete every row
    pub fn clear(&mut self) {
        self.rows.clear();
        self.by_customer.clear();
    }

    /// All rows in id order
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.rows.values()
    }

    /// Entries of one customer, oldest first
    pub fn for_customer(&self, customer_id: CustomerId) -> Vec<&LedgerEntry> {
        let ids = self
            .by_customer
            .get(&customer_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[]);
        let mut entries: Vec<_> = ids.iter().filter_map(|id| self.rows.get(id)).collect();
        entries.sort_by_key(|e| (e.timestamp, e.id));
        entries
    }

    /// Number of entries of one customer
    pub fn count_for_customer(&self, customer_id: CustomerId) -> usize {
        self.by_customer.get(&customer_id).map_or(0, Vec::len)
    }

    /// Largest id in use
    pub fn max_id(&self) -> Option<EntryId> {
        self.rows.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn unindex(&mut self, entry: &LedgerEntry) {
        if let Some(ids) = self.by_customer.get_mut(&entry.customer_id) {
            ids.retain(|&id| id != entry.id);
            if ids.is_empty() {
                self.by_customer.remove(&entry.customer_id);
            }
        }
    }
}
