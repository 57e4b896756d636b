//! Ledger entry model
//!
//! A ledger entry records that a customer took goods on credit (`DEBT`) or
//! paid some of it back (`PAYMENT`). Entries are the only source of truth for
//! balances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::ids::{CustomerId, EntryId};
use super::money::Money;

/// Kind of a ledger entry
///
/// Parsing is case-insensitive. Kinds that are neither `DEBT` nor `PAYMENT`
/// can still be read from a data file; they are kept verbatim and count as
/// zero in every balance.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Goods or money given to the customer on credit
    Debt,
    /// Money received from the customer
    Payment,
    /// Anything else found in stored data
    Unrecognized(String),
}

impl EntryKind {
    /// Lenient parse used for stored data
    pub fn from_stored(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "DEBT" => Self::Debt,
            "PAYMENT" => Self::Payment,
            _ => Self::Unrecognized(s.to_string()),
        }
    }

    /// Canonical name as written to disk
    pub fn as_str(&self) -> &str {
        match self {
            Self::Debt => "DEBT",
            Self::Payment => "PAYMENT",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Signed contribution of an amount of this kind to a balance
    pub fn balance_delta(&self, amount: Money) -> Money {
        match self {
            Self::Debt => amount,
            Self::Payment => -amount,
            Self::Unrecognized(_) => Money::zero(),
        }
    }

    pub fn is_debt(&self) -> bool {
        matches!(self, Self::Debt)
    }

    pub fn is_payment(&self) -> bool {
        matches!(self, Self::Payment)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strict parse used for user input
impl FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::from_stored(s) {
            Self::Unrecognized(raw) => Err(format!(
                "Invalid entry kind: '{}'. Valid kinds: debt, payment",
                raw
            )),
            kind => Ok(kind),
        }
    }
}

impl Serialize for EntryKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EntryKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_stored(&raw))
    }
}

/// A single debt or payment recorded against a customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Store-assigned identifier
    pub id: EntryId,

    /// The customer this entry belongs to
    pub customer_id: CustomerId,

    /// DEBT or PAYMENT
    #[serde(rename = "type")]
    pub kind: EntryKind,

    /// Strictly positive amount; the kind carries the sign
    pub amount: Money,

    /// When the entry happened, as milliseconds since the epoch on disk
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl LedgerEntry {
    /// Create a new entry. The id is replaced by the store on insert.
    pub fn new(
        customer_id: CustomerId,
        kind: EntryKind,
        amount: Money,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntryId::new(0),
            customer_id,
            kind,
            amount,
            timestamp,
            note: None,
        }
    }

    /// Shorthand for a debt entry
    pub fn debt(customer_id: CustomerId, amount: Money, timestamp: DateTime<Utc>) -> Self {
        Self::new(customer_id, EntryKind::Debt, amount, timestamp)
    }

    /// Shorthand for a payment entry
    pub fn payment(customer_id: CustomerId, amount: Money, timestamp: DateTime<Utc>) -> Self {
        Self::new(customer_id, EntryKind::Payment, amount, timestamp)
    }

    /// Attach a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        let note = note.into();
        self.note = if note.trim().is_empty() { None } else { Some(note) };
        self
    }

    /// Signed contribution to the customer's balance
    pub fn balance_delta(&self) -> Money {
        self.kind.balance_delta(self.amount)
    }

    /// Timestamp as milliseconds since the epoch
    pub fn timestamp_millis(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    /// Validate a new or updated entry
    pub fn validate(&self) -> Result<(), EntryValidationError> {
        if !self.kind.is_recognized() {
            return Err(EntryValidationError::UnknownKind(self.kind.to_string()));
        }

        if !self.amount.is_positive() {
            return Err(EntryValidationError::NonPositiveAmount(self.amount));
        }

        Ok(())
    }
}

/// Validation errors for ledger entries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryValidationError {
    UnknownKind(String),
    NonPositiveAmount(Money),
}

impl fmt::Display for EntryValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKind(kind) => write!(f, "Unknown entry kind '{}'", kind),
            Self::NonPositiveAmount(amount) => {
                write!(f, "Entry amount must be greater than zero (got {})", amount)
            }
        }
    }
}

impl std::error::Error for EntryValidationError {}
