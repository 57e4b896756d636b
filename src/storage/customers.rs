//! The `customers` table
//!
//! An in-memory table keyed by customer id. Mutation happens only inside a
//! storage transaction, on a working copy of the tables.

use std::collections::BTreeMap;

use crate::error::TallyError;
use crate::models::{Customer, CustomerId};

/// Rows of the customers table, ordered by id
#[derive(Debug, Clone, Default)]
pub struct CustomerTable {
    rows: BTreeMap<CustomerId, Customer>,
}

impl CustomerTable {
    /// Build the table from stored rows, rejecting duplicate ids
    pub fn from_rows(rows: Vec<Customer>) -> Result<Self, TallyError> {
        let mut table = Self::default();
        for customer in rows {
            table.insert(customer)?;
        }
        Ok(table)
    }

    /// Get a customer by id (deleted or not)
    pub fn get(&self, id: CustomerId) -> Option<&Customer> {
        self.rows.get(&id)
    }

    /// Get a customer only if it is not soft-deleted
    pub fn get_live(&self, id: CustomerId) -> Option<&Customer> {
        self.rows.get(&id).filter(|c| c.is_live())
    }

    pub fn contains(&self, id: CustomerId) -> bool {
        self.rows.contains_key(&id)
    }

    /// Insert a new row; the id must not be taken
    pub fn insert(&mut self, customer: Customer) -> Result<(), TallyError> {
        if self.rows.contains_key(&customer.id) {
            return Err(TallyError::Duplicate {
                entity_type: "Customer",
                identifier: customer.id.to_string(),
            });
        }
        self.rows.insert(customer.id, customer);
        Ok(())
    }

    /// Replace an existing row. Returns the previous version, or None if the
    /// id is unknown (nothing is written in that case).
    pub fn replace(&mut self, customer: Customer) -> Option<Customer> {
        match self.rows.get_mut(&customer.id) {
            Some(existing) => Some(std::mem::replace(existing, customer)),
            None => None,
        }
    }

    /// Remove a row
    pub fn remove(&mut self, id: CustomerId) -> Option<Customer> {
        self.rows.remove(&id)
    }

    /// Delete every row
    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// All rows in id order
    pub fn iter(&self) -> impl Iterator<Item = &Customer> {
        self.rows.values()
    }

    /// Find a live customer by name (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&Customer> {
        let name = name.trim().to_lowercase();
        self.rows
            .values()
            .find(|c| c.is_live() && c.name.to_lowercase() == name)
    }

    /// Largest id in use
    pub fn max_id(&self) -> Option<CustomerId> {
        self.rows.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
