//! CSV Export functionality
//!
//! Exports customer balances and ledger entries to spreadsheet-friendly CSV.

use std::collections::HashMap;
use std::io::Write;

use crate::error::{TallyError, TallyResult};
use crate::reports::customers_with_balance;
use crate::storage::Storage;

/// Export every live customer with its balance
pub fn export_balances_csv<W: Write>(storage: &Storage, writer: &mut W) -> TallyResult<()> {
    let snapshot = storage.snapshot();
    let rows = customers_with_balance(&snapshot.customers, &snapshot.live_entries());

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "ID",
        "Name",
        "Phone",
        "Balance",
        "Expected Repayment",
        "Note",
    ])?;

    for row in &rows {
        let customer = &row.customer;
        csv.write_record([
            customer.id.get().to_string(),
            customer.name.clone(),
            customer.phone.clone(),
            row.balance.to_string(),
            customer
                .expected_repayment_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            customer.note.clone(),
        ])?;
    }

    csv.flush().map_err(|e| TallyError::Export(e.to_string()))?;
    Ok(())
}

/// Export the entries of every live customer, oldest first
pub fn export_entries_csv<W: Write>(storage: &Storage, writer: &mut W) -> TallyResult<()> {
    let snapshot = storage.snapshot();
    let names: HashMap<_, _> = snapshot
        .live_customers()
        .map(|c| (c.id, c.name.clone()))
        .collect();

    let mut entries = snapshot.live_entries();
    entries.sort_by_key(|e| (e.timestamp, e.id));

    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record([
        "ID",
        "Timestamp",
        "Customer ID",
        "Customer",
        "Type",
        "Amount",
        "Note",
    ])?;

    for entry in &entries {
        csv.write_record([
            entry.id.get().to_string(),
            entry.timestamp.to_rfc3339(),
            entry.customer_id.get().to_string(),
            names.get(&entry.customer_id).cloned().unwrap_or_default(),
            entry.kind.as_str().to_string(),
            entry.amount.to_string(),
            entry.note.clone().unwrap_or_default(),
        ])?;
    }

    csv.flush().map_err(|e| TallyError::Export(e.to_string()))?;
    Ok(())
}
