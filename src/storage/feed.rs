//! Snapshot feed
//!
//! After every committed transaction the store publishes an immutable copy
//! of both tables on a watch channel. Subscribers always see the latest
//! committed state and never a half-applied transaction.

use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{Customer, CustomerId, LedgerEntry};

use super::LedgerTables;

/// Immutable copy of the tables at one committed revision
#[derive(Debug, Clone, Default)]
pub struct LedgerSnapshot {
    /// Commit counter; bumps by one on every committed transaction
    pub revision: u64,
    pub customers: Arc<Vec<Customer>>,
    pub entries: Arc<Vec<LedgerEntry>>,
}

impl LedgerSnapshot {
    pub(crate) fn capture(tables: &LedgerTables) -> Self {
        Self {
            revision: tables.revision(),
            customers: Arc::new(tables.customers().iter().cloned().collect()),
            entries: Arc::new(tables.entries().iter().cloned().collect()),
        }
    }

    /// Build a snapshot from plain lists (used by tests and imports)
    pub fn from_parts(customers: Vec<Customer>, entries: Vec<LedgerEntry>) -> Self {
        Self {
            revision: 0,
            customers: Arc::new(customers),
            entries: Arc::new(entries),
        }
    }

    /// Customers that are not soft-deleted
    pub fn live_customers(&self) -> impl Iterator<Item = &Customer> {
        self.customers.iter().filter(|c| c.is_live())
    }

    /// Entries whose customer exists and is not soft-deleted
    pub fn live_entries(&self) -> Vec<LedgerEntry> {
        let live: HashSet<CustomerId> = self.live_customers().map(|c| c.id).collect();
        self.entries
            .iter()
            .filter(|e| live.contains(&e.customer_id))
            .cloned()
            .collect()
    }
}
