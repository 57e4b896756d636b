//! Customer model
//!
//! A customer buys on credit and pays back over time. Customers are never
//! given a stored balance: it is folded from their ledger entries on read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::CustomerId;

/// Number of photo slots per kind (profile / identity document)
pub const MAX_PHOTOS: usize = 3;

/// Which photo set an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    /// Profile pictures of the customer
    Profile,
    /// Identity card / passport pictures
    Identity,
}

impl PhotoKind {
    /// Parse a photo kind from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "profile" => Some(Self::Profile),
            "identity" | "id" | "passport" => Some(Self::Identity),
            _ => None,
        }
    }
}

impl fmt::Display for PhotoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile => write!(f, "profile"),
            Self::Identity => write!(f, "identity"),
        }
    }
}

/// Up to three opaque photo references (file paths or URIs)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoSlots([Option<String>; MAX_PHOTOS]);

impl PhotoSlots {
    /// Get the reference stored in a slot
    pub fn get(&self, slot: usize) -> Option<&str> {
        self.0.get(slot).and_then(|s| s.as_deref())
    }

    /// Store or clear a reference. Returns false if the slot is out of range.
    pub fn set(&mut self, slot: usize, reference: Option<String>) -> bool {
        match self.0.get_mut(slot) {
            Some(existing) => {
                *existing = reference.filter(|r| !r.trim().is_empty());
                true
            }
            None => false,
        }
    }

    /// Iterate the filled slots as `(slot, reference)`
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_deref().map(|r| (i, r)))
    }

    /// Number of filled slots
    pub fn count(&self) -> usize {
        self.iter().count()
    }
}

/// A customer of the business
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Store-assigned identifier
    pub id: CustomerId,

    /// Display name
    pub name: String,

    #[serde(default)]
    pub phone: String,

    /// Free-text note
    #[serde(default)]
    pub note: String,

    #[serde(default)]
    pub profile_photos: PhotoSlots,

    #[serde(default)]
    pub identity_photos: PhotoSlots,

    /// Date the customer promised to settle by
    #[serde(default)]
    pub expected_repayment_date: Option<NaiveDate>,

    /// An opening balance entry has already been recorded for this customer
    #[serde(default)]
    pub has_initial_balance: bool,

    /// Soft-delete flag: hidden from every view and from backups
    #[serde(default)]
    pub is_deleted: bool,
}

impl Customer {
    /// Create a new customer. The id is replaced by the store on insert.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: CustomerId::new(0),
            name: name.into(),
            phone: String::new(),
            note: String::new(),
            profile_photos: PhotoSlots::default(),
            identity_photos: PhotoSlots::default(),
            expected_repayment_date: None,
            has_initial_balance: false,
            is_deleted: false,
        }
    }

    /// Create a customer with contact details
    pub fn with_contact(name: impl Into<String>, phone: impl Into<String>) -> Self {
        let mut customer = Self::new(name);
        customer.phone = phone.into();
        customer
    }

    /// Whether the customer takes part in balances, reports and backups
    pub fn is_live(&self) -> bool {
        !self.is_deleted
    }

    /// Photo slots of the given kind
    pub fn photos(&self, kind: PhotoKind) -> &PhotoSlots {
        match kind {
            PhotoKind::Profile => &self.profile_photos,
            PhotoKind::Identity => &self.identity_photos,
        }
    }

    /// Mutable photo slots of the given kind
    pub fn photos_mut(&mut self, kind: PhotoKind) -> &mut PhotoSlots {
        match kind {
            PhotoKind::Profile => &mut self.profile_photos,
            PhotoKind::Identity => &mut self.identity_photos,
        }
    }

    /// Case-insensitive match on name or phone
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query) || self.phone.contains(&query)
    }

    /// Validate the customer
    pub fn validate(&self) -> Result<(), CustomerValidationError> {
        if self.name.trim().is_empty() {
            return Err(CustomerValidationError::EmptyName);
        }

        let len = self.name.chars().count();
        if len > 100 {
            return Err(CustomerValidationError::NameTooLong(len));
        }

        Ok(())
    }
}

impl fmt::Display for Customer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.phone.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.phone)
        }
    }
}

/// Validation errors for customers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerValidationError {
    EmptyName,
    NameTooLong(usize),
}

impl fmt::Display for CustomerValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Customer name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Customer name too long ({} chars, max 100)", len)
            }
        }
    }
}

impl std::error::Error for CustomerValidationError {}
