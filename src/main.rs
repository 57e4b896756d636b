use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tallybook::cli::{
    handle_backup_command, handle_customer_command, handle_entry_command, handle_export_command,
    handle_import_command, handle_report_command,
};
use tallybook::config::{paths::TallyPaths, settings::Settings};
use tallybook::storage::Storage;

#[derive(Parser)]
#[command(
    name = "tally",
    author = "Kaylee Beyene",
    version,
    about = "Terminal customer ledger for credit sales and repayments",
    long_about = "Tallybook keeps a ledger of what each customer owes. Record debts \
                  and payments, see who owes the most and how old the debt is, and \
                  keep the whole ledger safe with backups and exports."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Customer management commands
    #[command(subcommand)]
    Customer(tallybook::cli::CustomerCommands),

    /// Record and manage debts and payments
    #[command(subcommand, alias = "e")]
    Entry(tallybook::cli::EntryCommands),

    /// Balance reports
    #[command(subcommand)]
    Report(tallybook::cli::ReportCommands),

    /// Backup management commands
    #[command(subcommand)]
    Backup(tallybook::cli::BackupCommands),

    /// Export data to CSV, JSON or YAML
    #[command(subcommand)]
    Export(tallybook::cli::ExportCommands),

    /// Replace all data with a JSON or YAML export
    Import {
        /// Path to the export file
        file: PathBuf,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Show recent changes from the audit log
    History {
        /// Number of records to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },

    /// Initialize a new ledger
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Initialize paths and settings
    let paths = TallyPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let storage = Storage::open(paths.clone())?;

    match cli.command {
        Some(Commands::Customer(cmd)) => handle_customer_command(&storage, &settings, cmd)?,
        Some(Commands::Entry(cmd)) => handle_entry_command(&storage, &settings, cmd)?,
        Some(Commands::Report(cmd)) => handle_report_command(&storage, &settings, cmd)?,
        Some(Commands::Backup(cmd)) => handle_backup_command(&storage, &settings, cmd)?,
        Some(Commands::Export(cmd)) => handle_export_command(&storage, cmd)?,
        Some(Commands::Import { file, force }) => {
            handle_import_command(&storage, &settings, &file, force)?
        }
        Some(Commands::History { limit }) => {
            let records = storage.audit().read_recent(limit)?;
            if records.is_empty() {
                println!("No changes recorded yet.");
            }
            for record in records {
                println!("{}", record.format_human_readable());
            }
        }
        Some(Commands::Init) => {
            println!("Initializing Tallybook at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Add your first customer with: tally customer add <name>");
        }
        Some(Commands::Config) => {
            println!("Tallybook Configuration");
            println!("=======================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Ledger file:      {}", paths.ledger_file().display());
            println!("Backup directory: {}", paths.backup_dir().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol:       {}", settings.currency_symbol);
            println!("  Date format:           {}", settings.date_format);
            println!("  Top debtors shown:     {}", settings.top_debtors_limit);
            println!("  Monthly window:        {} months", settings.monthly_window);
            println!(
                "  Backup retention:      {} daily, {} monthly",
                settings.backup_retention.daily_count, settings.backup_retention.monthly_count
            );
            println!("  Backup before restore: {}", settings.backup_before_restore);
        }
        None => {
            println!("Tallybook - terminal customer ledger");
            println!();
            println!("Run 'tally --help' for usage information.");
        }
    }

    Ok(())
}
