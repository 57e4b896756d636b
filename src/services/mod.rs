//! Service layer for Tallybook
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, audit records and cross-table operations.

pub mod customer;
pub mod entry;

pub use customer::{CustomerService, INITIAL_BALANCE_NOTE};
pub use entry::{EntryService, NewEntry};
