//! Customer balances
//!
//! A balance is never stored. It is folded from the entry list on every
//! read: `Σ DEBT − Σ PAYMENT`, with unrecognised entry kinds counting zero.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::models::{Customer, CustomerId, LedgerEntry, Money};

/// Default size of the top debtors view
pub const TOP_DEBTORS_LIMIT: usize = 10;

/// A live customer paired with its computed balance
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerBalance {
    pub customer: Customer,
    /// Positive: customer owes money. Negative: customer has credit.
    pub balance: Money,
}

impl CustomerBalance {
    /// The customer owes the business money
    pub fn is_debtor(&self) -> bool {
        self.balance.is_positive()
    }

    /// The customer has paid more than they owe
    pub fn has_credit(&self) -> bool {
        self.balance.is_negative()
    }

    pub fn is_settled(&self) -> bool {
        self.balance.is_zero()
    }
}

/// Fold entries into a balance per customer id
pub fn balances_by_customer<'a, I>(entries: I) -> HashMap<CustomerId, Money>
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    entries
        .into_iter()
        .fold(HashMap::new(), |mut balances, entry| {
            *balances.entry(entry.customer_id).or_insert_with(Money::zero) +=
                entry.balance_delta();
            balances
        })
}

/// Balance of one customer
pub fn customer_balance<'a, I>(customer_id: CustomerId, entries: I) -> Money
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    entries
        .into_iter()
        .filter(|e| e.customer_id == customer_id)
        .map(LedgerEntry::balance_delta)
        .sum()
}

/// Every non-deleted customer with its balance, ordered by display name
///
/// Customers without entries get a zero balance. Entries of unknown or
/// deleted customers are ignored.
pub fn customers_with_balance(
    customers: &[Customer],
    entries: &[LedgerEntry],
) -> Vec<CustomerBalance> {
    let balances = balances_by_customer(entries);

    let mut rows: Vec<CustomerBalance> = customers
        .iter()
        .filter(|c| c.is_live())
        .map(|customer| CustomerBalance {
            balance: balances.get(&customer.id).copied().unwrap_or_default(),
            customer: customer.clone(),
        })
        .collect();

    rows.sort_by_cached_key(|row| (row.customer.name.to_lowercase(), row.customer.id));
    rows
}

/// Sum of the positive balances
///
/// A customer in credit does not offset another customer's debt.
pub fn total_debt(balances: &[CustomerBalance]) -> Money {
    balances.iter().map(|row| row.balance.positive_part()).sum()
}

/// Customers that owe money, largest balance first, at most `limit` of them
///
/// The sort is stable, so ties keep the order of the input (display name).
pub fn top_debtors(balances: &[CustomerBalance], limit: usize) -> Vec<CustomerBalance> {
    let mut debtors: Vec<CustomerBalance> = balances
        .iter()
        .filter(|row| row.is_debtor())
        .cloned()
        .collect();
    debtors.sort_by(|a, b| b.balance.cmp(&a.balance));
    debtors.truncate(limit);
    debtors
}

/// Debtors whose promised repayment date is before `today`
pub fn overdue_customers(balances: &[CustomerBalance], today: NaiveDate) -> Vec<CustomerBalance> {
    let mut overdue: Vec<CustomerBalance> = balances
        .iter()
        .filter(|row| {
            row.is_debtor()
                && row
                    .customer
                    .expected_repayment_date
                    .is_some_and(|due| due < today)
        })
        .cloned()
        .collect();
    overdue.sort_by_key(|row| row.customer.expected_repayment_date);
    overdue
}
