//! YAML Export functionality
//!
//! Exports the live ledger to YAML format for human-readable backup.

use std::io::Write;

use crate::error::{TallyError, TallyResult};
use crate::export::json::FullExport;
use crate::storage::Storage;

/// Export the full ledger to YAML format
pub fn export_full_yaml<W: Write>(storage: &Storage, writer: &mut W) -> TallyResult<()> {
    let export = FullExport::from_storage(storage)?;

    let header = format!(
        "# Tallybook Ledger Export\n# Generated: {}\n# App Version: {}\n#\n# Import with `tally import <file>`; it replaces all current data.\n\n",
        export.exported_at, export.app_version
    );
    writer
        .write_all(header.as_bytes())
        .map_err(|e| TallyError::Export(e.to_string()))?;

    serde_yaml::to_writer(writer, &export).map_err(|e| TallyError::Export(e.to_string()))?;

    Ok(())
}

/// Import from a YAML export
pub fn import_from_yaml(yaml_str: &str) -> TallyResult<FullExport> {
    let export: FullExport =
        serde_yaml::from_str(yaml_str).map_err(|e| TallyError::Import(e.to_string()))?;

    export.validate().map_err(TallyError::Import)?;

    Ok(export)
}
