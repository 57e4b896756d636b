//! Dashboard
//!
//! Every balance view computed from one committed snapshot, and the
//! publisher that recomputes it whenever the store commits.

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::models::Money;
use crate::storage::LedgerSnapshot;

use super::aging::{aging_report, AgingReport};
use super::balances::{customers_with_balance, top_debtors, total_debt, CustomerBalance};
use super::monthly::{monthly_stats, MonthlyStat};
use super::ReportOptions;

/// All balance views at one revision
#[derive(Debug, Clone)]
pub struct Dashboard {
    /// Revision of the snapshot this was computed from
    pub revision: u64,
    pub computed_at: DateTime<Utc>,
    /// Live customers with balances, by display name
    pub customers: Vec<CustomerBalance>,
    pub total_debt: Money,
    pub top_debtors: Vec<CustomerBalance>,
    /// Oldest month first
    pub monthly: Vec<MonthlyStat>,
    pub aging: AgingReport,
}

impl Dashboard {
    /// Compute every view from a snapshot
    pub fn compute(snapshot: &LedgerSnapshot, options: &ReportOptions, now: DateTime<Utc>) -> Self {
        let live_entries = snapshot.live_entries();
        let customers = customers_with_balance(&snapshot.customers, &live_entries);

        Self {
            revision: snapshot.revision,
            computed_at: now,
            total_debt: total_debt(&customers),
            top_debtors: top_debtors(&customers, options.top_debtors_limit),
            monthly: monthly_stats(&live_entries, now, options.monthly_window),
            aging: aging_report(&live_entries, now),
            customers,
        }
    }

    /// Format a summary for terminal display
    pub fn format_terminal(&self, currency_symbol: &str) -> String {
        let mut output = String::new();

        output.push_str("Ledger Summary\n");
        output.push_str(&"=".repeat(50));
        output.push('\n');

        let debtors = self.customers.iter().filter(|c| c.is_debtor()).count();
        let in_credit = self.customers.iter().filter(|c| c.has_credit()).count();

        output.push_str(&format!("Customers:        {:>15}\n", self.customers.len()));
        output.push_str(&format!("Owing:            {:>15}\n", debtors));
        output.push_str(&format!("In credit:        {:>15}\n", in_credit));
        output.push_str(&format!(
            "Total owed:       {:>15}\n",
            self.total_debt.format_with_symbol(currency_symbol)
        ));

        if let Some(month) = self.monthly.last() {
            output.push_str(&format!(
                "Lent {}:     {:>15}\n",
                month.label(),
                month.debt.format_with_symbol(currency_symbol)
            ));
            output.push_str(&format!(
                "Repaid {}:   {:>15}\n",
                month.label(),
                month.payment.format_with_symbol(currency_symbol)
            ));
        }

        output
    }
}

/// Keeps a [`Dashboard`] in step with the store's snapshot feed
pub struct DashboardPublisher {
    source: watch::Receiver<LedgerSnapshot>,
    sender: watch::Sender<Dashboard>,
    options: ReportOptions,
    clock: fn() -> DateTime<Utc>,
}

impl DashboardPublisher {
    /// Create a publisher and compute the first dashboard right away
    pub fn new(source: watch::Receiver<LedgerSnapshot>, options: ReportOptions) -> Self {
        Self::with_clock(source, options, Utc::now)
    }

    /// Create a publisher that reads "now" from `clock`
    pub fn with_clock(
        mut source: watch::Receiver<LedgerSnapshot>,
        options: ReportOptions,
        clock: fn() -> DateTime<Utc>,
    ) -> Self {
        let initial = Dashboard::compute(&source.borrow_and_update(), &options, clock());
        let (sender, _) = watch::channel(initial);
        Self {
            source,
            sender,
            options,
            clock,
        }
    }

    /// Subscribe to recomputed dashboards
    pub fn subscribe(&self) -> watch::Receiver<Dashboard> {
        self.sender.subscribe()
    }

    /// Latest published dashboard
    pub fn current(&self) -> Dashboard {
        self.sender.borrow().clone()
    }

    /// Recompute if the store committed since the last computation
    ///
    /// Returns whether a new dashboard was published.
    pub fn refresh(&mut self) -> bool {
        match self.source.has_changed() {
            Ok(true) => {
                self.recompute();
                true
            }
            _ => false,
        }
    }

    /// Recompute on every commit until the store is dropped
    pub async fn run(mut self) {
        while self.source.changed().await.is_ok() {
            self.recompute();
        }
        tracing::debug!("snapshot feed closed, dashboard publisher stopped");
    }

    fn recompute(&mut self) {
        let snapshot = self.source.borrow_and_update().clone();
        let dashboard = Dashboard::compute(&snapshot, &self.options, (self.clock)());
        tracing::trace!(revision = dashboard.revision, "dashboard recomputed");
        self.sender.send_replace(dashboard);
    }
}
