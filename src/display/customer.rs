//! Customer display formatting
//!
//! Formats customers for terminal output in table and detail views.

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::models::{Customer, Money, PhotoKind};
use crate::reports::CustomerBalance;

#[derive(Tabled)]
struct CustomerRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Balance")]
    balance: String,
    #[tabled(rename = "Due")]
    due: String,
}

/// Format customers with balances as a table
pub fn format_customer_list(
    rows: &[CustomerBalance],
    currency_symbol: &str,
    date_format: &str,
) -> String {
    if rows.is_empty() {
        return "No customers found.".to_string();
    }

    let table_rows = rows.iter().map(|row| CustomerRow {
        id: row.customer.id.to_string(),
        name: row.customer.name.clone(),
        phone: row.customer.phone.clone(),
        balance: row.balance.format_with_symbol(currency_symbol),
        due: row
            .customer
            .expected_repayment_date
            .map(|d| d.format(date_format).to_string())
            .unwrap_or_default(),
    });

    let mut table = Table::new(table_rows);
    table
        .with(Style::psql())
        .with(Modify::new(Columns::single(3)).with(Alignment::right()));

    let total: Money = rows.iter().map(|r| r.balance.positive_part()).sum();
    format!(
        "{}\n\n{} customers, {} owed",
        table,
        rows.len(),
        total.format_with_symbol(currency_symbol)
    )
}

/// Format plain customer records (no balances), e.g. archived ones
pub fn format_customer_records(customers: &[Customer]) -> String {
    if customers.is_empty() {
        return "No customers found.".to_string();
    }

    let mut output = String::new();
    for customer in customers {
        let status = if customer.is_deleted { "  [archived]" } else { "" };
        output.push_str(&format!("{:<10} {}{}\n", customer.id.to_string(), customer, status));
    }
    output
}

/// Format a single customer's details
pub fn format_customer_details(
    customer: &Customer,
    balance: Money,
    entry_count: usize,
    currency_symbol: &str,
    date_format: &str,
) -> String {
    let mut output = String::new();

    output.push_str(&format!("Customer: {}\n", customer.name));
    output.push_str(&format!("  ID:             {}\n", customer.id));
    if !customer.phone.is_empty() {
        output.push_str(&format!("  Phone:          {}\n", customer.phone));
    }
    output.push_str(&format!(
        "  Balance:        {}{}\n",
        balance.format_with_symbol(currency_symbol),
        if balance.is_negative() { " (credit)" } else { "" }
    ));
    output.push_str(&format!("  Entries:        {}\n", entry_count));
    if let Some(due) = customer.expected_repayment_date {
        output.push_str(&format!("  Repay by:       {}\n", due.format(date_format)));
    }
    output.push_str(&format!(
        "  Opening balance: {}\n",
        if customer.has_initial_balance { "recorded" } else { "none" }
    ));
    if customer.is_deleted {
        output.push_str("  Status:         Archived\n");
    }
    if !customer.note.is_empty() {
        output.push_str(&format!("  Note:           {}\n", customer.note));
    }

    for kind in [PhotoKind::Profile, PhotoKind::Identity] {
        for (slot, reference) in customer.photos(kind).iter() {
            output.push_str(&format!("  {} photo {}: {}\n", kind, slot + 1, reference));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CustomerId;

    fn row(name: &str, cents: i64) -> CustomerBalance {
        let mut customer = Customer::with_contact(name, "0700");
        customer.id = CustomerId::new(1);
        CustomerBalance {
            customer,
            balance: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_format_customer_list() {
        let output = format_customer_list(&[row("Amina", 12000), row("Brian", -500)], "$", "%Y-%m-%d");
        assert!(output.contains("Amina"));
        assert!(output.contains("$120.00"));
        assert!(output.contains("-$5.00"));
        assert!(output.contains("2 customers, $120.00 owed"));
    }

    #[test]
    fn test_format_empty_list() {
        assert_eq!(format_customer_list(&[], "$", "%Y-%m-%d"), "No customers found.");
    }

    #[test]
    fn test_format_customer_details() {
        let mut customer = Customer::with_contact("Amina", "0712");
        customer
            .photos_mut(PhotoKind::Identity)
            .set(0, Some("passport.jpg".into()));
        customer.is_deleted = true;
        customer.expected_repayment_date = chrono::NaiveDate::from_ymd_opt(2025, 7, 1);

        let output =
            format_customer_details(&customer, Money::from_cents(-250), 3, "$", "%d/%m/%Y");
        assert!(output.contains("Customer: Amina"));
        assert!(output.contains("-$2.50 (credit)"));
        assert!(output.contains("Entries:        3"));
        assert!(output.contains("Archived"));
        assert!(output.contains("passport.jpg"));
        assert!(output.contains("Repay by:       01/07/2025"));
    }
}
