//! Customer service
//!
//! Business logic for customers: creation with an optional opening balance,
//! full-record updates, hard and soft deletion, photo references and the
//! balance views scoped to customers.

use chrono::{NaiveDate, Utc};

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{Customer, CustomerId, LedgerEntry, Money, PhotoKind, MAX_PHOTOS};
use crate::reports::{
    customer_balance, customers_with_balance, overdue_customers, CustomerBalance,
    CustomerStatement,
};
use crate::storage::Storage;

/// Note attached to the entry created for an opening balance
pub const INITIAL_BALANCE_NOTE: &str = "Initial balance";

/// Service for customer management
pub struct CustomerService<'a> {
    storage: &'a Storage,
}

impl<'a> CustomerService<'a> {
    /// Create a new customer service
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new customer
    ///
    /// A positive `initial_balance` is recorded as a DEBT entry in the same
    /// transaction and marks the customer as having an opening balance.
    pub fn create(
        &self,
        mut customer: Customer,
        initial_balance: Option<Money>,
    ) -> TallyResult<Customer> {
        customer.name = customer.name.trim().to_string();
        customer.is_deleted = false;
        customer.has_initial_balance = false;
        customer
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        if let Some(amount) = initial_balance {
            if !amount.is_positive() {
                return Err(TallyError::Validation(
                    "Initial balance must be greater than zero".into(),
                ));
            }
        }

        let (customer, opening) = self.storage.transaction(|tables| {
            let mut created = tables.create_customer(customer)?;
            let opening = match initial_balance {
                Some(amount) => {
                    created.has_initial_balance = true;
                    tables.update_customer(created.clone());
                    let entry = LedgerEntry::debt(created.id, amount, Utc::now())
                        .with_note(INITIAL_BALANCE_NOTE);
                    Some(tables.create_entry(entry)?)
                }
                None => None,
            };
            Ok((created, opening))
        })?;

        tracing::info!(customer = %customer.id, "customer created");
        self.storage.log_create(
            EntityType::Customer,
            customer.id.to_string(),
            Some(customer.name.clone()),
            &customer,
        );
        if let Some(entry) = &opening {
            self.storage.log_create(
                EntityType::LedgerEntry,
                entry.id.to_string(),
                Some(customer.name.clone()),
                entry,
            );
        }

        Ok(customer)
    }

    /// Get a customer by ID, soft-deleted ones included
    pub fn get(&self, id: CustomerId) -> TallyResult<Option<Customer>> {
        self.storage.read(|t| t.customers().get(id).cloned())
    }

    /// Find a live customer by name (case-insensitive) or ID string
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Customer>> {
        let identifier = identifier.trim();
        self.storage.read(|t| {
            if let Some(customer) = t.customers().find_by_name(identifier) {
                return Some(customer.clone());
            }
            identifier
                .parse::<CustomerId>()
                .ok()
                .and_then(|id| t.customers().get(id).cloned())
        })
    }

    /// All customers ordered by name
    pub fn list(&self, include_deleted: bool) -> TallyResult<Vec<Customer>> {
        let mut customers: Vec<Customer> = self.storage.read(|t| {
            t.customers()
                .iter()
                .filter(|c| include_deleted || c.is_live())
                .cloned()
                .collect()
        })?;
        customers.sort_by_cached_key(|c| (c.name.to_lowercase(), c.id));
        Ok(customers)
    }

    /// Live customers whose name or phone matches the query
    pub fn search(&self, query: &str) -> TallyResult<Vec<Customer>> {
        Ok(self
            .list(false)?
            .into_iter()
            .filter(|c| c.matches(query))
            .collect())
    }

    /// Replace a customer record
    ///
    /// Returns false when no customer has the record's id.
    pub fn update(&self, mut customer: Customer) -> TallyResult<bool> {
        customer.name = customer.name.trim().to_string();
        customer
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        let after = customer.clone();
        let before = self
            .storage
            .transaction(|tables| Ok(tables.update_customer(customer)))?;

        match before {
            Some(before) => {
                tracing::info!(customer = %after.id, "customer updated");
                self.storage.log_update(
                    EntityType::Customer,
                    after.id.to_string(),
                    Some(after.name.clone()),
                    &before,
                    &after,
                );
                Ok(true)
            }
            None => {
                tracing::debug!(customer = %after.id, "update of unknown customer ignored");
                Ok(false)
            }
        }
    }

    /// Permanently delete a customer and every entry recorded against it
    ///
    /// Returns the number of entries removed, or None when the customer does
    /// not exist.
    pub fn delete(&self, id: CustomerId) -> TallyResult<Option<usize>> {
        let removed = self
            .storage
            .transaction(|tables| Ok(tables.delete_customer(id)))?;

        let Some((customer, entries)) = removed else {
            return Ok(None);
        };

        tracing::info!(customer = %id, entries = entries.len(), "customer deleted");
        for entry in &entries {
            self.storage.log_delete(
                EntityType::LedgerEntry,
                entry.id.to_string(),
                Some(customer.name.clone()),
                entry,
            );
        }
        self.storage.log_delete(
            EntityType::Customer,
            id.to_string(),
            Some(customer.name.clone()),
            &customer,
        );

        Ok(Some(entries.len()))
    }

    /// Soft-delete a customer: hidden from every view and from backups
    pub fn archive(&self, id: CustomerId) -> TallyResult<bool> {
        self.set_deleted(id, true)
    }

    /// Undo a soft delete
    pub fn restore(&self, id: CustomerId) -> TallyResult<bool> {
        self.set_deleted(id, false)
    }

    fn set_deleted(&self, id: CustomerId, deleted: bool) -> TallyResult<bool> {
        self.modify(id, |customer| {
            customer.is_deleted = deleted;
            Ok(())
        })
    }

    /// Set or clear a photo reference
    ///
    /// `slot` is zero-based. Returns false when the customer does not exist.
    pub fn set_photo(
        &self,
        id: CustomerId,
        kind: PhotoKind,
        slot: usize,
        reference: Option<String>,
    ) -> TallyResult<bool> {
        if slot >= MAX_PHOTOS {
            return Err(TallyError::Validation(format!(
                "Photo slot must be between 1 and {}",
                MAX_PHOTOS
            )));
        }
        let reference = reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        self.modify(id, |customer| {
            customer.photos_mut(kind).set(slot, reference);
            Ok(())
        })
    }

    /// Record an opening balance for an existing customer
    ///
    /// Returns None when the customer does not exist. A customer can only
    /// have one opening balance.
    pub fn record_initial_balance(
        &self,
        id: CustomerId,
        amount: Money,
    ) -> TallyResult<Option<LedgerEntry>> {
        if !amount.is_positive() {
            return Err(TallyError::Validation(
                "Initial balance must be greater than zero".into(),
            ));
        }

        let recorded = self.storage.transaction(|tables| {
            let Some(customer) = tables.customers().get(id).cloned() else {
                return Ok(None);
            };
            if customer.has_initial_balance {
                return Err(TallyError::Validation(format!(
                    "{} already has an initial balance",
                    customer.name
                )));
            }
            let entry = tables.create_entry(
                LedgerEntry::debt(id, amount, Utc::now()).with_note(INITIAL_BALANCE_NOTE),
            )?;
            let mut updated = customer.clone();
            updated.has_initial_balance = true;
            tables.update_customer(updated.clone());
            Ok(Some((customer, updated, entry)))
        })?;

        Ok(recorded.map(|(before, after, entry)| {
            tracing::info!(customer = %id, entry = %entry.id, "initial balance recorded");
            self.storage.log_create(
                EntityType::LedgerEntry,
                entry.id.to_string(),
                Some(after.name.clone()),
                &entry,
            );
            self.storage.log_update(
                EntityType::Customer,
                id.to_string(),
                Some(after.name.clone()),
                &before,
                &after,
            );
            entry
        }))
    }

    /// Balance of one customer
    pub fn balance(&self, id: CustomerId) -> TallyResult<Money> {
        self.storage
            .read(|t| customer_balance(id, t.entries().for_customer(id)))
    }

    /// Live customers with their balances, ordered by name
    pub fn with_balances(&self) -> TallyResult<Vec<CustomerBalance>> {
        let snapshot = self.storage.snapshot();
        Ok(customers_with_balance(
            &snapshot.customers,
            &snapshot.live_entries(),
        ))
    }

    /// Debtors whose expected repayment date has passed
    pub fn overdue(&self, today: NaiveDate) -> TallyResult<Vec<CustomerBalance>> {
        Ok(overdue_customers(&self.with_balances()?, today))
    }

    /// Chronological statement with running balance
    pub fn statement(&self, id: CustomerId) -> TallyResult<CustomerStatement> {
        CustomerStatement::generate(self.storage, id)
    }

    /// Apply a change to one customer and audit it. Missing ids are a no-op.
    fn modify<F>(&self, id: CustomerId, change: F) -> TallyResult<bool>
    where
        F: FnOnce(&mut Customer) -> TallyResult<()>,
    {
        let changed = self.storage.transaction(|tables| {
            let Some(before) = tables.customers().get(id).cloned() else {
                return Ok(None);
            };
            let mut after = before.clone();
            change(&mut after)?;
            tables.update_customer(after.clone());
            Ok(Some((before, after)))
        })?;

        match changed {
            Some((before, after)) => {
                tracing::debug!(customer = %id, "customer modified");
                self.storage.log_update(
                    EntityType::Customer,
                    id.to_string(),
                    Some(after.name.clone()),
                    &before,
                    &after,
                );
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
