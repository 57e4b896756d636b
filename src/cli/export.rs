//! CLI commands for data export and import
//!
//! Exports go to a file or to stdout. An import replaces every customer and
//! entry with the contents of a JSON or YAML export.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Subcommand, ValueEnum};

use super::create_output;
use crate::backup::{BackupManager, RestoreManager};
use crate::config::settings::Settings;
use crate::error::{TallyError, TallyResult};
use crate::export::{
    export_balances_csv, export_entries_csv, export_full_json, export_full_yaml, import_from_json,
    import_from_yaml, FullExport,
};
use crate::storage::Storage;

/// What a CSV export contains
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CsvTable {
    /// One row per customer with their balance
    Balances,
    /// One row per ledger entry
    Entries,
}

/// Export subcommands
#[derive(Subcommand, Debug)]
pub enum ExportCommands {
    /// Export balances or entries to CSV
    Csv {
        /// Which table to export
        #[arg(value_enum)]
        table: CsvTable,

        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the full ledger as JSON
    Json {
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Export the full ledger as YAML
    Yaml {
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Handle export commands
pub fn handle_export_command(storage: &Storage, cmd: ExportCommands) -> TallyResult<()> {
    match cmd {
        ExportCommands::Csv { table, output } => write_to(output, |mut writer| match table {
            CsvTable::Balances => export_balances_csv(storage, &mut writer),
            CsvTable::Entries => export_entries_csv(storage, &mut writer),
        }),
        ExportCommands::Json { output, pretty } => write_to(output, |mut writer| {
            export_full_json(storage, &mut writer, pretty)
        }),
        ExportCommands::Yaml { output } => {
            write_to(output, |mut writer| export_full_yaml(storage, &mut writer))
        }
    }
}

/// Handle the import command
pub fn handle_import_command(
    storage: &Storage,
    settings: &Settings,
    file: &Path,
    force: bool,
) -> TallyResult<()> {
    if !file.exists() {
        return Err(TallyError::Import(format!(
            "File not found: {}",
            file.display()
        )));
    }

    let contents = std::fs::read_to_string(file)
        .map_err(|e| TallyError::Import(format!("Failed to read file: {}", e)))?;
    let export = parse_export(file, &contents)?;

    println!("Import Preview");
    println!("==============");
    println!("File: {}", file.display());
    println!("Exported: {}", export.exported_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("Customers: {}", export.metadata.customer_count);
    println!("Entries:   {}", export.metadata.entry_count);
    println!();

    if !force {
        println!("WARNING: Importing replaces ALL current customers and entries!");
        println!("To proceed, run again with --force flag:");
        println!("  tally import {} --force", file.display());
        return Ok(());
    }

    let manager = BackupManager::new(storage.paths(), settings.backup_retention.clone());
    let restore = RestoreManager::new(storage);
    let restore = if settings.backup_before_restore {
        restore.with_safety_backup(&manager)
    } else {
        restore
    };

    let label = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "import".to_string());
    let result = restore.restore_snapshot(export.into_snapshot(), &label)?;

    if let Some(safety) = &result.safety_backup {
        println!("Previous data saved to: {}", safety.display());
    }
    println!("Import complete!");
    println!("{}", result.summary.summary());
    Ok(())
}

/// Parse an export, picking the format from the file extension
fn parse_export(file: &Path, contents: &str) -> TallyResult<FullExport> {
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("yaml") | Some("yml") => import_from_yaml(contents),
        _ => import_from_json(contents),
    }
}

fn write_to<F>(output: Option<PathBuf>, export: F) -> TallyResult<()>
where
    F: FnOnce(&mut dyn Write) -> TallyResult<()>,
{
    match output {
        Some(path) => {
            let mut writer = create_output(&path)?;
            export(&mut writer)?;
            writer
                .flush()
                .map_err(|e| TallyError::Export(e.to_string()))?;
            eprintln!("Exported to: {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            export(&mut handle)?;
            writeln!(handle).map_err(|e| TallyError::Export(e.to_string()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::{Customer, Money};
    use crate::services::CustomerService;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TallyPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::open(paths).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_export_then_import_replaces_data() {
        let (temp, storage) = create_test_storage();
        let settings = Settings::default();
        let customers = CustomerService::new(&storage);
        customers
            .create(Customer::new("Amina"), Some(Money::from_cents(900)))
            .unwrap();

        let file = temp.path().join("ledger.yaml");
        handle_export_command(
            &storage,
            ExportCommands::Yaml {
                output: Some(file.clone()),
            },
        )
        .unwrap();

        customers.create(Customer::new("Brian"), None).unwrap();
        handle_import_command(&storage, &settings, &file, true).unwrap();

        assert_eq!(storage.customer_count().unwrap(), 1);
        let amina = customers.find("Amina").unwrap().unwrap();
        assert_eq!(customers.balance(amina.id).unwrap(), Money::from_cents(900));

        // the replaced data was kept as a safety backup
        let manager = BackupManager::new(storage.paths(), settings.backup_retention.clone());
        assert_eq!(manager.list_backups().unwrap().len(), 1);
    }

    #[test]
    fn test_import_without_force_changes_nothing() {
        let (temp, storage) = create_test_storage();
        CustomerService::new(&storage)
            .create(Customer::new("Chen"), None)
            .unwrap();

        let file = temp.path().join("empty.json");
        let export = FullExport::from_parts(Vec::new(), Vec::new());
        std::fs::write(&file, serde_json::to_string(&export).unwrap()).unwrap();

        handle_import_command(&storage, &Settings::default(), &file, false).unwrap();
        assert_eq!(storage.customer_count().unwrap(), 1);
    }

    #[test]
    fn test_import_rejects_invalid_file() {
        let (temp, storage) = create_test_storage();
        let file = temp.path().join("broken.json");
        std::fs::write(&file, "{ not json").unwrap();

        let err =
            handle_import_command(&storage, &Settings::default(), &file, true).unwrap_err();
        assert!(matches!(err, TallyError::Import(_)));
    }
}
