//! Customer Statement
//!
//! One customer's entries in chronological order with the running balance
//! after each one.

use std::io::Write;

use crate::error::{TallyError, TallyResult};
use crate::models::{Customer, CustomerId, LedgerEntry, Money};
use crate::storage::Storage;

/// A statement line: an entry and the balance right after it
#[derive(Debug, Clone)]
pub struct StatementLine {
    pub entry: LedgerEntry,
    pub running_balance: Money,
}

/// Customer Statement
#[derive(Debug, Clone)]
pub struct CustomerStatement {
    pub customer: Customer,
    /// Oldest first
    pub lines: Vec<StatementLine>,
    /// Sum of DEBT amounts
    pub total_debt: Money,
    /// Sum of PAYMENT amounts
    pub total_payment: Money,
    /// Balance after the last entry
    pub closing_balance: Money,
}

impl CustomerStatement {
    /// Generate the statement of a stored customer
    pub fn generate(storage: &Storage, customer_id: CustomerId) -> TallyResult<Self> {
        let found = storage.read(|tables| {
            tables.customers().get(customer_id).cloned().map(|customer| {
                let entries: Vec<LedgerEntry> = tables
                    .entries()
                    .for_customer(customer_id)
                    .into_iter()
                    .cloned()
                    .collect();
                (customer, entries)
            })
        })?;

        let (customer, entries) =
            found.ok_or_else(|| TallyError::customer_not_found(customer_id.to_string()))?;
        Ok(Self::build(customer, entries))
    }

    /// Build a statement from a customer and its entries in any order
    pub fn build(customer: Customer, mut entries: Vec<LedgerEntry>) -> Self {
        entries.retain(|e| e.customer_id == customer.id);
        entries.sort_by_key(|e| (e.timestamp, e.id));

        let mut running = Money::zero();
        let mut total_debt = Money::zero();
        let mut total_payment = Money::zero();

        let lines = entries
            .into_iter()
            .map(|entry| {
                if entry.kind.is_debt() {
                    total_debt += entry.amount;
                } else if entry.kind.is_payment() {
                    total_payment += entry.amount;
                }
                running += entry.balance_delta();
                StatementLine {
                    entry,
                    running_balance: running,
                }
            })
            .collect();

        Self {
            customer,
            lines,
            total_debt,
            total_payment,
            closing_balance: running,
        }
    }

    /// Format the statement for terminal display
    pub fn format_terminal(&self, currency_symbol: &str) -> String {
        let mut output = String::new();

        output.push_str(&format!("Statement: {}\n", self.customer));
        output.push_str(&"=".repeat(70));
        output.push('\n');

        output.push_str(&format!(
            "{:<12} {:<17} {:<8} {:>12} {:>12}\n",
            "Entry", "Date", "Type", "Amount", "Balance"
        ));
        output.push_str(&"-".repeat(70));
        output.push('\n');

        for line in &self.lines {
            output.push_str(&format!(
                "{:<12} {:<17} {:<8} {:>12} {:>12}\n",
                line.entry.id.to_string(),
                line.entry.timestamp.format("%Y-%m-%d %H:%M"),
                line.entry.kind.as_str(),
                line.entry.amount.format_with_symbol(currency_symbol),
                line.running_balance.format_with_symbol(currency_symbol),
            ));
        }

        output.push_str(&"-".repeat(70));
        output.push('\n');
        output.push_str(&format!(
            "Total debt:      {:>15}\n",
            self.total_debt.format_with_symbol(currency_symbol)
        ));
        output.push_str(&format!(
            "Total payments:  {:>15}\n",
            self.total_payment.format_with_symbol(currency_symbol)
        ));
        output.push_str(&format!(
            "Balance:         {:>15}\n",
            self.closing_balance.format_with_symbol(currency_symbol)
        ));

        output
    }

    /// Export the statement to CSV
    pub fn export_csv<W: Write>(&self, writer: W) -> TallyResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["entry_id", "timestamp", "type", "amount", "balance", "note"])?;
        for line in &self.lines {
            csv.write_record([
                line.entry.id.get().to_string(),
                line.entry.timestamp.to_rfc3339(),
                line.entry.kind.as_str().to_string(),
                line.entry.amount.to_string(),
                line.running_balance.to_string(),
                line.entry.note.clone().unwrap_or_default(),
            ])?;
        }
        csv.flush()
            .map_err(|e| TallyError::Export(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::TallyPaths;
    use crate::models::EntryKind;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    #[test]
    fn test_running_balance_is_chronological() {
        let mut customer = Customer::new("Amina");
        customer.id = CustomerId::new(1);
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();

        // Inserted out of order
        let entries = vec![
            LedgerEntry::payment(customer.id, Money::from_units(30, 0), base + Duration::days(2)),
            LedgerEntry::debt(customer.id, Money::from_units(100, 0), base),
            LedgerEntry::new(
                customer.id,
                EntryKind::from_stored("gift"),
                Money::from_units(5, 0),
                base + Duration::days(1),
            ),
            LedgerEntry::debt(CustomerId::new(2), Money::from_units(999, 0), base),
        ];

        let statement = CustomerStatement::build(customer, entries);
        let balances: Vec<i64> = statement
            .lines
            .iter()
            .map(|l| l.running_balance.cents())
            .collect();
        assert_eq!(balances, vec![10000, 10000, 7000]);
        assert_eq!(statement.total_debt.cents(), 10000);
        assert_eq!(statement.total_payment.cents(), 3000);
        assert_eq!(statement.closing_balance.cents(), 7000);
    }

    #[test]
    fn test_generate_from_storage() {
        let temp_dir = TempDir::new().unwrap();
        let storage =
            Storage::open(TallyPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        let now = Utc::now();
        let customer = storage
            .transaction(|t| {
                let c = t.create_customer(Customer::new("Brian"))?;
                t.create_entry(LedgerEntry::debt(c.id, Money::from_units(50, 0), now))?;
                t.create_entry(LedgerEntry::payment(c.id, Money::from_units(80, 0), now))?;
                Ok(c)
            })
            .unwrap();

        let statement = CustomerStatement::generate(&storage, customer.id).unwrap();
        assert_eq!(statement.lines.len(), 2);
        assert_eq!(statement.closing_balance, Money::from_units(-30, 0));

        let text = statement.format_terminal("$");
        assert!(text.contains("Brian"));
        assert!(text.contains("-$30.00"));

        let mut csv_out = Vec::new();
        statement.export_csv(&mut csv_out).unwrap();
        let csv_text = String::from_utf8(csv_out).unwrap();
        assert!(csv_text.starts_with("entry_id,timestamp,type,amount,balance,note"));
        assert!(csv_text.contains("PAYMENT"));
    }

    #[test]
    fn test_unknown_customer() {
        let temp_dir = TempDir::new().unwrap();
        let storage =
            Storage::open(TallyPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        let err = CustomerStatement::generate(&storage, CustomerId::new(42)).unwrap_err();
        assert!(err.is_not_found());
    }
}
