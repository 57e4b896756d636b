//! CLI commands for reports
//!
//! Prints the balance views computed from the current ledger.

use std::path::PathBuf;

use chrono::Utc;
use clap::Subcommand;

use super::create_output;
use super::customer::resolve_customer;
use crate::config::settings::Settings;
use crate::display::{format_aging, format_monthly, format_top_debtors};
use crate::error::TallyResult;
use crate::reports::{aging_report, monthly_stats, Dashboard};
use crate::services::CustomerService;
use crate::storage::Storage;

/// Report subcommands
#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Totals, top debtors, monthly activity and debt aging in one view
    #[command(alias = "dashboard")]
    Summary,

    /// Customers who owe the most
    Top {
        /// How many customers to show (defaults to the configured limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Debt and payment totals per calendar month
    Monthly {
        /// Number of months, ending with the current one
        #[arg(short, long)]
        months: Option<u32>,
    },

    /// Debt entries grouped by age
    Aging,

    /// One customer's entries with a running balance
    Statement {
        /// Customer name or ID
        customer: String,

        /// Export to CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle report commands
pub fn handle_report_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ReportCommands,
) -> TallyResult<()> {
    let symbol = settings.currency_symbol.as_str();
    let mut options = settings.report_options();

    match cmd {
        ReportCommands::Summary => {
            let dashboard = Dashboard::compute(&storage.snapshot(), &options, Utc::now());
            println!("{}", dashboard.format_terminal(symbol));
        }

        ReportCommands::Top { limit } => {
            if let Some(limit) = limit {
                options.top_debtors_limit = limit;
            }
            let dashboard = Dashboard::compute(&storage.snapshot(), &options, Utc::now());
            println!("Top Debtors");
            println!("===========");
            println!("{}", format_top_debtors(&dashboard.top_debtors, symbol));
        }

        ReportCommands::Monthly { months } => {
            let snapshot = storage.snapshot();
            let months = months.unwrap_or(options.monthly_window);
            let stats = monthly_stats(&snapshot.live_entries(), Utc::now(), months);
            println!("Monthly Activity");
            println!("================");
            println!("{}", format_monthly(&stats, symbol));
        }

        ReportCommands::Aging => {
            let snapshot = storage.snapshot();
            let report = aging_report(&snapshot.live_entries(), Utc::now());
            println!("Debt Aging");
            println!("==========");
            println!("{}", format_aging(&report, symbol));
        }

        ReportCommands::Statement { customer, output } => {
            let service = CustomerService::new(storage);
            let customer = resolve_customer(&service, &customer)?;
            let statement = service.statement(customer.id)?;

            if let Some(path) = output {
                let writer = create_output(&path)?;
                statement.export_csv(writer)?;
                println!("Statement exported to: {}", path.display());
            } else {
                println!("{}", statement.format_terminal(symbol));
            }
        }
    }

    Ok(())
}
