//! Report display formatting
//!
//! Tables for the aggregate balance views.

use tabled::settings::object::Columns;
use tabled::settings::{Alignment, Modify, Style};
use tabled::{Table, Tabled};

use crate::models::Money;
use crate::reports::{AgingReport, CustomerBalance, MonthlyStat};

#[derive(Tabled)]
struct DebtorRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "Customer")]
    name: String,
    #[tabled(rename = "Owes")]
    balance: String,
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Lent")]
    debt: String,
    #[tabled(rename = "Repaid")]
    payment: String,
    #[tabled(rename = "Net")]
    net: String,
}

#[derive(Tabled)]
struct AgingRow {
    #[tabled(rename = "Age (days)")]
    bucket: String,
    #[tabled(rename = "Entries")]
    count: usize,
    #[tabled(rename = "Amount")]
    amount: String,
}

fn right_align_from(table: &mut Table, first_column: usize) {
    table
        .with(Style::psql())
        .with(Modify::new(Columns::new(first_column..)).with(Alignment::right()));
}

/// Format the top debtors list
pub fn format_top_debtors(rows: &[CustomerBalance], currency_symbol: &str) -> String {
    if rows.is_empty() {
        return "Nobody owes anything.".to_string();
    }

    let mut table = Table::new(rows.iter().enumerate().map(|(i, row)| DebtorRow {
        rank: i + 1,
        name: row.customer.name.clone(),
        balance: row.balance.format_with_symbol(currency_symbol),
    }));
    right_align_from(&mut table, 2);
    table.to_string()
}

/// Format the monthly debt/payment totals
pub fn format_monthly(stats: &[MonthlyStat], currency_symbol: &str) -> String {
    let mut table = Table::new(stats.iter().map(|s| MonthRow {
        month: s.label(),
        debt: s.debt.format_with_symbol(currency_symbol),
        payment: s.payment.format_with_symbol(currency_symbol),
        net: s.net().format_with_symbol(currency_symbol),
    }));
    right_align_from(&mut table, 1);

    let lent: Money = stats.iter().map(|s| s.debt).sum();
    let repaid: Money = stats.iter().map(|s| s.payment).sum();
    format!(
        "{}\n\nTotal lent {}, repaid {}",
        table,
        lent.format_with_symbol(currency_symbol),
        repaid.format_with_symbol(currency_symbol)
    )
}

/// Format the debt aging buckets
pub fn format_aging(report: &AgingReport, currency_symbol: &str) -> String {
    let mut table = Table::new(report.iter().map(|(bucket, amount)| AgingRow {
        bucket: bucket.label().to_string(),
        count: report.count(bucket),
        amount: amount.format_with_symbol(currency_symbol),
    }));
    right_align_from(&mut table, 1);

    format!(
        "{}\n\nTotal lent: {}",
        table,
        report.total().format_with_symbol(currency_symbol)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, CustomerId, LedgerEntry};
    use crate::reports::{aging_report, monthly_stats};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_format_top_debtors() {
        let rows = vec![CustomerBalance {
            customer: Customer::new("Amina"),
            balance: Money::from_cents(5000),
        }];
        let output = format_top_debtors(&rows, "$");
        assert!(output.contains("Amina"));
        assert!(output.contains("$50.00"));
        assert_eq!(format_top_debtors(&[], "$"), "Nobody owes anything.");
    }

    #[test]
    fn test_format_monthly_and_aging() {
        let now = Utc.with_ymd_and_hms(2025, 3, 20, 0, 0, 0).unwrap();
        let entries = vec![
            LedgerEntry::debt(CustomerId::new(1), Money::from_cents(1000), now),
            LedgerEntry::debt(
                CustomerId::new(1),
                Money::from_cents(2000),
                now - Duration::days(95),
            ),
            LedgerEntry::payment(CustomerId::new(1), Money::from_cents(500), now),
        ];

        let monthly = format_monthly(&monthly_stats(&entries, now, 3), "$");
        assert!(monthly.contains("2025-03"));
        assert!(monthly.contains("2025-01"));
        assert!(monthly.contains("Total lent $10.00, repaid $5.00"));

        let aging = format_aging(&aging_report(&entries, now), "$");
        assert!(aging.contains("90+"));
        assert!(aging.contains("$20.00"));
        assert!(aging.contains("Total lent: $30.00"));
    }
}
