//! Ledger entry CLI commands
//!
//! Implements CLI commands for recording debts and payments.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use clap::Subcommand;

use super::customer::{parse_amount, resolve_customer};
use crate::config::settings::Settings;
use crate::display::{format_entry_details, format_entry_list};
use crate::error::{TallyError, TallyResult};
use crate::models::{CustomerId, EntryId, EntryKind};
use crate::services::{CustomerService, EntryService, NewEntry};
use crate::storage::Storage;

/// Entry subcommands
#[derive(Subcommand)]
pub enum EntryCommands {
    /// Record a debt or payment
    Add {
        /// Customer name or ID
        customer: String,
        /// Entry kind (debt, payment)
        kind: String,
        /// Amount (e.g. 12.50)
        amount: String,
        /// Note
        #[arg(short, long)]
        note: Option<String>,
        /// When it happened (YYYY-MM-DD or "YYYY-MM-DD HH:MM", UTC); defaults to now
        #[arg(long)]
        at: Option<String>,
    },
    /// Shorthand for `entry add <customer> debt <amount>`
    Lend {
        customer: String,
        amount: String,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// Shorthand for `entry add <customer> payment <amount>`
    Repay {
        customer: String,
        amount: String,
        #[arg(short, long)]
        note: Option<String>,
    },
    /// List entries
    List {
        /// Only entries of this customer
        #[arg(short, long)]
        customer: Option<String>,
        /// Show at most this many of the most recent entries
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show one entry
    Show {
        /// Entry ID
        id: String,
    },
    /// Edit an entry
    Edit {
        /// Entry ID
        id: String,
        /// New kind (debt, payment)
        #[arg(short, long)]
        kind: Option<String>,
        /// New amount
        #[arg(short, long)]
        amount: Option<String>,
        /// New note
        #[arg(short, long)]
        note: Option<String>,
        /// New timestamp
        #[arg(long)]
        at: Option<String>,
        /// Move the entry to another customer
        #[arg(short, long)]
        customer: Option<String>,
    },
    /// Delete an entry
    Delete {
        /// Entry ID
        id: String,
    },
}

/// Handle an entry command
pub fn handle_entry_command(
    storage: &Storage,
    settings: &Settings,
    cmd: EntryCommands,
) -> TallyResult<()> {
    let customers = CustomerService::new(storage);
    let service = EntryService::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        EntryCommands::Add {
            customer,
            kind,
            amount,
            note,
            at,
        } => {
            let kind: EntryKind = kind.parse().map_err(TallyError::Validation)?;
            record(
                &customers,
                &service,
                symbol,
                &customer,
                kind,
                &amount,
                note,
                at.as_deref(),
            )?;
        }

        EntryCommands::Lend {
            customer,
            amount,
            note,
        } => {
            record(
                &customers,
                &service,
                symbol,
                &customer,
                EntryKind::Debt,
                &amount,
                note,
                None,
            )?;
        }

        EntryCommands::Repay {
            customer,
            amount,
            note,
        } => {
            record(
                &customers,
                &service,
                symbol,
                &customer,
                EntryKind::Payment,
                &amount,
                note,
                None,
            )?;
        }

        EntryCommands::List { customer, limit } => {
            let mut entries = match customer {
                Some(identifier) => {
                    let customer = resolve_customer(&customers, &identifier)?;
                    service.list_for_customer(customer.id)?
                }
                None => service.list()?,
            };
            if let Some(limit) = limit {
                let skip = entries.len().saturating_sub(limit);
                entries.drain(..skip);
            }

            println!("{}", format_entry_list(&entries, &customer_names(&customers)?, symbol));
        }

        EntryCommands::Show { id } => {
            let id = parse_entry_id(&id)?;
            let entry = service
                .get(id)?
                .ok_or_else(|| TallyError::entry_not_found(id.to_string()))?;
            let name = customers
                .get(entry.customer_id)?
                .map(|c| c.name)
                .unwrap_or_else(|| entry.customer_id.to_string());
            print!("{}", format_entry_details(&entry, &name, symbol));
        }

        EntryCommands::Edit {
            id,
            kind,
            amount,
            note,
            at,
            customer,
        } => {
            let id = parse_entry_id(&id)?;
            let mut entry = service
                .get(id)?
                .ok_or_else(|| TallyError::entry_not_found(id.to_string()))?;

            if let Some(kind) = kind {
                entry.kind = kind.parse().map_err(TallyError::Validation)?;
            }
            if let Some(amount) = amount {
                entry.amount = parse_amount(&amount)?;
            }
            if let Some(note) = note {
                entry.note = Some(note);
            }
            if let Some(at) = at {
                entry.timestamp = parse_timestamp(&at)?;
            }
            if let Some(identifier) = customer {
                entry.customer_id = resolve_customer(&customers, &identifier)?.id;
            }

            if !service.update(entry)? {
                return Err(TallyError::entry_not_found(id.to_string()));
            }
            println!("Updated entry {}", id);
        }

        EntryCommands::Delete { id } => {
            let id = parse_entry_id(&id)?;
            if !service.delete(id)? {
                return Err(TallyError::entry_not_found(id.to_string()));
            }
            println!("Deleted entry {}", id);
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn record(
    customers: &CustomerService<'_>,
    service: &EntryService<'_>,
    symbol: &str,
    customer: &str,
    kind: EntryKind,
    amount: &str,
    note: Option<String>,
    at: Option<&str>,
) -> TallyResult<()> {
    let customer = resolve_customer(customers, customer)?;
    let entry = service.add(NewEntry {
        customer_id: customer.id,
        kind,
        amount: parse_amount(amount)?,
        timestamp: at.map(parse_timestamp).transpose()?,
        note,
    })?;
    let balance = customers.balance(customer.id)?;

    println!(
        "Recorded {} of {} for {} ({})",
        entry.kind.as_str().to_lowercase(),
        entry.amount.format_with_symbol(symbol),
        customer.name,
        entry.id
    );
    println!("  Balance now: {}", balance.format_with_symbol(symbol));
    Ok(())
}

fn customer_names(customers: &CustomerService<'_>) -> TallyResult<HashMap<CustomerId, String>> {
    Ok(customers
        .list(true)?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect())
}

fn parse_entry_id(s: &str) -> TallyResult<EntryId> {
    s.parse()
        .map_err(|_| TallyError::Validation(format!("Invalid entry ID: '{}'", s)))
}

/// Parse a UTC timestamp given as a date or a date and time
fn parse_timestamp(s: &str) -> TallyResult<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Ok(dt.and_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| {
            TallyError::Validation(format!(
                "Invalid timestamp '{}', expected YYYY-MM-DD or \"YYYY-MM-DD HH:MM\"",
                s
            ))
        })
}
