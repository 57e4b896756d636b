//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod backup;
pub mod customer;
pub mod entry;
pub mod export;
pub mod report;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{TallyError, TallyResult};

pub use backup::{handle_backup_command, BackupCommands};
pub use customer::{handle_customer_command, CustomerCommands};
pub use entry::{handle_entry_command, EntryCommands};
pub use export::{handle_export_command, handle_import_command, ExportCommands};
pub use report::{handle_report_command, ReportCommands};

/// Open an output file for an export
pub(crate) fn create_output(path: &Path) -> TallyResult<BufWriter<File>> {
    let file = File::create(path).map_err(|e| {
        TallyError::Export(format!("Failed to create file {}: {}", path.display(), e))
    })?;
    Ok(BufWriter::new(file))
}
