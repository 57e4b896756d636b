//! Customer CLI commands
//!
//! Implements CLI commands for managing customers.

use chrono::{NaiveDate, Utc};
use clap::Subcommand;

use crate::config::settings::Settings;
use crate::display::{format_customer_details, format_customer_list, format_customer_records};
use crate::error::{TallyError, TallyResult};
use crate::models::{Customer, Money, PhotoKind, MAX_PHOTOS};
use crate::services::CustomerService;
use crate::storage::Storage;

/// Customer subcommands
#[derive(Subcommand)]
pub enum CustomerCommands {
    /// Add a new customer
    Add {
        /// Customer name
        name: String,
        /// Phone number
        #[arg(short, long)]
        phone: Option<String>,
        /// Free-text note
        #[arg(short, long)]
        note: Option<String>,
        /// Expected repayment date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<String>,
        /// Amount already owed, recorded as an opening debt
        #[arg(short, long)]
        initial_balance: Option<String>,
    },
    /// List customers with their balances
    List {
        /// Include archived customers
        #[arg(short, long)]
        all: bool,
    },
    /// Show customer details
    Show {
        /// Customer name or ID
        customer: String,
    },
    /// Edit a customer
    Edit {
        /// Customer name or ID
        customer: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New phone number
        #[arg(short, long)]
        phone: Option<String>,
        /// New note
        #[arg(short, long)]
        note: Option<String>,
        /// New expected repayment date (YYYY-MM-DD)
        #[arg(short, long, conflicts_with = "clear_due")]
        due: Option<String>,
        /// Remove the expected repayment date
        #[arg(long)]
        clear_due: bool,
    },
    /// Delete a customer and all of their entries
    Delete {
        /// Customer name or ID
        customer: String,
        /// Skip confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Archive a customer (hidden from balances, reports and backups)
    Archive {
        /// Customer name or ID
        customer: String,
    },
    /// Bring an archived customer back
    Restore {
        /// Customer name or ID
        customer: String,
    },
    /// Set or clear a photo reference
    Photo {
        /// Customer name or ID
        customer: String,
        /// Photo kind (profile, identity)
        kind: String,
        /// Slot number (1-3)
        slot: usize,
        /// Photo reference (file path or URI)
        reference: Option<String>,
        /// Clear the slot
        #[arg(long, conflicts_with = "reference")]
        clear: bool,
    },
    /// Record an opening balance for an existing customer
    Opening {
        /// Customer name or ID
        customer: String,
        /// Amount owed
        amount: String,
    },
    /// Search customers by name or phone
    Search {
        query: String,
    },
    /// Debtors past their expected repayment date
    Overdue,
}

/// Handle a customer command
pub fn handle_customer_command(
    storage: &Storage,
    settings: &Settings,
    cmd: CustomerCommands,
) -> TallyResult<()> {
    let service = CustomerService::new(storage);
    let symbol = settings.currency_symbol.as_str();
    let date_format = settings.date_format.as_str();

    match cmd {
        CustomerCommands::Add {
            name,
            phone,
            note,
            due,
            initial_balance,
        } => {
            let mut customer = Customer::with_contact(name, phone.unwrap_or_default());
            customer.note = note.unwrap_or_default();
            customer.expected_repayment_date = due.as_deref().map(parse_date).transpose()?;
            let opening = initial_balance.as_deref().map(parse_amount).transpose()?;

            let customer = service.create(customer, opening)?;
            println!("Added customer: {} ({})", customer.name, customer.id);
            if let Some(amount) = opening {
                println!("  Opening balance: {}", amount.format_with_symbol(symbol));
            }
        }

        CustomerCommands::List { all } => {
            if all {
                println!("{}", format_customer_records(&service.list(true)?));
            } else {
                println!("{}", format_customer_list(&service.with_balances()?, symbol, date_format));
            }
        }

        CustomerCommands::Show { customer } => {
            let customer = resolve_customer(&service, &customer)?;
            let balance = service.balance(customer.id)?;
            let entry_count = storage.read(|t| t.entries().for_customer(customer.id).len())?;
            print!(
                "{}",
                format_customer_details(&customer, balance, entry_count, symbol, date_format)
            );
        }

        CustomerCommands::Edit {
            customer,
            name,
            phone,
            note,
            due,
            clear_due,
        } => {
            let mut customer = resolve_customer(&service, &customer)?;

            if name.is_none() && phone.is_none() && note.is_none() && due.is_none() && !clear_due {
                println!("Nothing to change. Use --name, --phone, --note, --due or --clear-due.");
                return Ok(());
            }

            if let Some(name) = name {
                customer.name = name;
            }
            if let Some(phone) = phone {
                customer.phone = phone;
            }
            if let Some(note) = note {
                customer.note = note;
            }
            if clear_due {
                customer.expected_repayment_date = None;
            } else if let Some(due) = due {
                customer.expected_repayment_date = Some(parse_date(&due)?);
            }

            let id = customer.id;
            if !service.update(customer)? {
                return Err(TallyError::customer_not_found(id.to_string()));
            }
            println!("Updated customer {}", id);
        }

        CustomerCommands::Delete { customer, force } => {
            let customer = resolve_customer(&service, &customer)?;

            if !force {
                let entries = storage.read(|t| t.entries().for_customer(customer.id).len())?;
                println!(
                    "This will permanently delete '{}' and {} entries.",
                    customer.name, entries
                );
                println!("To proceed, run again with --force flag:");
                println!("  tally customer delete {} --force", customer.id);
                return Ok(());
            }

            match service.delete(customer.id)? {
                Some(removed) => println!(
                    "Deleted customer '{}' and {} entries",
                    customer.name, removed
                ),
                None => return Err(TallyError::customer_not_found(customer.id.to_string())),
            }
        }

        CustomerCommands::Archive { customer } => {
            let customer = resolve_customer(&service, &customer)?;
            service.archive(customer.id)?;
            println!("Archived customer: {}", customer.name);
        }

        CustomerCommands::Restore { customer } => {
            let customer = resolve_archived_customer(&service, &customer)?;
            service.restore(customer.id)?;
            println!("Restored customer: {}", customer.name);
        }

        CustomerCommands::Photo {
            customer,
            kind,
            slot,
            reference,
            clear,
        } => {
            let customer = resolve_customer(&service, &customer)?;
            let kind = PhotoKind::parse(&kind).ok_or_else(|| {
                TallyError::Validation(format!(
                    "Invalid photo kind: '{}'. Valid kinds: profile, identity",
                    kind
                ))
            })?;
            if slot == 0 || slot > MAX_PHOTOS {
                return Err(TallyError::Validation(format!(
                    "Photo slot must be between 1 and {}",
                    MAX_PHOTOS
                )));
            }
            if reference.is_none() && !clear {
                return Err(TallyError::Validation(
                    "Give a photo reference or --clear".into(),
                ));
            }

            service.set_photo(customer.id, kind, slot - 1, reference)?;
            if clear {
                println!("Cleared {} photo {} for {}", kind, slot, customer.name);
            } else {
                println!("Set {} photo {} for {}", kind, slot, customer.name);
            }
        }

        CustomerCommands::Opening { customer, amount } => {
            let customer = resolve_customer(&service, &customer)?;
            let amount = parse_amount(&amount)?;
            match service.record_initial_balance(customer.id, amount)? {
                Some(entry) => println!(
                    "Recorded opening balance of {} for {} ({})",
                    entry.amount.format_with_symbol(symbol),
                    customer.name,
                    entry.id
                ),
                None => return Err(TallyError::customer_not_found(customer.id.to_string())),
            }
        }

        CustomerCommands::Search { query } => {
            let found = service.search(&query)?;
            if found.is_empty() {
                println!("No customers match '{}'.", query);
            } else {
                print!("{}", format_customer_records(&found));
            }
        }

        CustomerCommands::Overdue => {
            let overdue = service.overdue(Utc::now().date_naive())?;
            if overdue.is_empty() {
                println!("No overdue customers.");
            } else {
                println!("{}", format_customer_list(&overdue, symbol, date_format));
            }
        }
    }

    Ok(())
}

/// Look up a customer by name or ID, failing when there is none
pub(crate) fn resolve_customer(
    service: &CustomerService<'_>,
    identifier: &str,
) -> TallyResult<Customer> {
    service
        .find(identifier)?
        .ok_or_else(|| TallyError::customer_not_found(identifier))
}

/// Like [`resolve_customer`], but names also match archived customers
fn resolve_archived_customer(
    service: &CustomerService<'_>,
    identifier: &str,
) -> TallyResult<Customer> {
    if let Some(customer) = service.find(identifier)? {
        return Ok(customer);
    }
    let name = identifier.trim().to_lowercase();
    service
        .list(true)?
        .into_iter()
        .find(|c| c.name.to_lowercase() == name)
        .ok_or_else(|| TallyError::customer_not_found(identifier))
}

/// Parse a user-entered amount
pub(crate) fn parse_amount(s: &str) -> TallyResult<Money> {
    Money::parse(s).map_err(|e| TallyError::Validation(e.to_string()))
}

fn parse_date(s: &str) -> TallyResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| TallyError::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", s)))
}
