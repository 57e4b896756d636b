//! Balance engine for Tallybook
//!
//! Pure computations over customers and ledger entries: balances, total
//! debt, top debtors, monthly totals, debt aging and customer statements.
//! Nothing here is stored; every view is recomputed from the entries.

pub mod aging;
pub mod balances;
pub mod dashboard;
pub mod monthly;
pub mod statement;

pub use aging::{age_in_days, aging_report, AgingBucket, AgingReport};
pub use balances::{
    balances_by_customer, customer_balance, customers_with_balance, overdue_customers,
    top_debtors, total_debt, CustomerBalance, TOP_DEBTORS_LIMIT,
};
pub use dashboard::{Dashboard, DashboardPublisher};
pub use monthly::{
    month_bounds, monthly_stats, MonthlyStat, DEFAULT_MONTH_WINDOW, MAX_MONTHLY_WINDOW,
};
pub use statement::{CustomerStatement, StatementLine};

/// Tunables for the aggregate views
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    /// Length of the top debtors list
    pub top_debtors_limit: usize,
    /// Number of months in the monthly view
    pub monthly_window: u32,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            top_debtors_limit: TOP_DEBTORS_LIMIT,
            monthly_window: DEFAULT_MONTH_WINDOW,
        }
    }
}
