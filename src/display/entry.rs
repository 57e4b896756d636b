//! Ledger entry display formatting

use std::collections::HashMap;

use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::models::{CustomerId, LedgerEntry};

#[derive(Tabled)]
struct EntryRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Customer")]
    customer: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Note")]
    note: String,
}

/// Format entries as a table. `names` maps customer ids to display names.
pub fn format_entry_list(
    entries: &[LedgerEntry],
    names: &HashMap<CustomerId, String>,
    currency_symbol: &str,
) -> String {
    if entries.is_empty() {
        return "No entries found.".to_string();
    }

    let rows = entries.iter().map(|entry| EntryRow {
        id: entry.id.to_string(),
        when: entry.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        customer: names
            .get(&entry.customer_id)
            .cloned()
            .unwrap_or_else(|| entry.customer_id.to_string()),
        kind: entry.kind.to_string(),
        amount: entry.amount.format_with_symbol(currency_symbol),
        note: truncate(entry.note.as_deref().unwrap_or_default(), 30),
    });

    let mut table = Table::new(rows);
    table.with(Style::psql());
    table.to_string()
}

/// Format one entry
pub fn format_entry_details(entry: &LedgerEntry, customer_name: &str, currency_symbol: &str) -> String {
    let mut output = String::new();
    output.push_str(&format!("Entry:    {}\n", entry.id));
    output.push_str(&format!("Customer: {} ({})\n", customer_name, entry.customer_id));
    output.push_str(&format!("Type:     {}\n", entry.kind));
    output.push_str(&format!(
        "Amount:   {}\n",
        entry.amount.format_with_symbol(currency_symbol)
    ));
    output.push_str(&format!(
        "When:     {}\n",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(note) = &entry.note {
        output.push_str(&format!("Note:     {}\n", note));
    }
    output
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
