//! Tallybook - terminal customer ledger
//!
//! This library provides the core functionality for the Tallybook ledger. A
//! small business records what each customer takes on credit and what they
//! pay back; balances and reports are always derived from those entries.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Customers, ledger entries, money and ids
//! - `storage`: JSON file storage with all-or-nothing transactions and a
//!   snapshot feed
//! - `reports`: The balance engine (balances, top debtors, monthly totals,
//!   aging, statements, dashboard)
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `backup`: Backups, restore and the atomic bulk replace
//! - `export`: CSV, JSON and YAML export and import
//!
//! # Example
//!
//! ```rust,ignore
//! use tallybook::config::{paths::TallyPaths, settings::Settings};
//! use tallybook::storage::Storage;
//!
//! let paths = TallyPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{TallyError, TallyResult};
