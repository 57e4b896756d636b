//! Monthly debt and payment totals
//!
//! Calendar months are taken in UTC. A month covers
//! `[first instant, last millisecond]` inclusive.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};

use crate::models::{LedgerEntry, Money};

/// Default number of months in the monthly view
pub const DEFAULT_MONTH_WINDOW: u32 = 6;

/// Totals for one calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyStat {
    pub year: i32,
    /// 1-12
    pub month: u32,
    /// First instant of the month
    pub start: DateTime<Utc>,
    /// Last millisecond of the month
    pub end: DateTime<Utc>,
    /// Sum of DEBT amounts
    pub debt: Money,
    /// Sum of PAYMENT amounts
    pub payment: Money,
}

impl MonthlyStat {
    /// "YYYY-MM"
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// Debt taken on minus payments received in the month
    pub fn net(&self) -> Money {
        self.debt - self.payment
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// `[start, end]` of a calendar month, end being its last millisecond
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
    let (next_year, next_month) = shift_month(year, month, 1);
    let next_start = Utc
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()?;
    Some((start, next_start - Duration::milliseconds(1)))
}

/// Move `(year, month)` by `delta` months
fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

/// Longest window `monthly_stats` will cover
pub const MAX_MONTHLY_WINDOW: u32 = 1200;

/// Debt and payment totals for the `months` calendar months ending with the
/// month of `now`, oldest first. Windows longer than `MAX_MONTHLY_WINDOW`
/// are cut to it.
pub fn monthly_stats(entries: &[LedgerEntry], now: DateTime<Utc>, months: u32) -> Vec<MonthlyStat> {
    let months = i32::try_from(months.min(MAX_MONTHLY_WINDOW)).unwrap_or(0);
    (0..months)
        .rev()
        .filter_map(|back| {
            let (year, month) = shift_month(now.year(), now.month(), -back);
            let (start, end) = month_bounds(year, month)?;

            let in_month = entries
                .iter()
                .filter(|e| start <= e.timestamp && e.timestamp <= end);

            let (debt, payment) =
                in_month.fold((Money::zero(), Money::zero()), |(debt, payment), e| {
                    if e.kind.is_debt() {
                        (debt + e.amount, payment)
                    } else if e.kind.is_payment() {
                        (debt, payment + e.amount)
                    } else {
                        (debt, payment)
                    }
                });

            Some(MonthlyStat {
                year,
                month,
                start,
                end,
                debt,
                payment,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerId, EntryKind};

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()
    }

    fn entry(kind: EntryKind, cents: i64, timestamp: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry::new(CustomerId::new(1), kind, Money::from_cents(cents), timestamp)
    }

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds(2024, 2).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap() + Duration::milliseconds(999)
        );

        let (_, december_end) = month_bounds(2024, 12).unwrap();
        assert_eq!(december_end.year(), 2024);
        assert_eq!(december_end.month(), 12);
    }

    #[test]
    fn test_window_is_chronological_and_crosses_years() {
        let stats = monthly_stats(&[], at(2025, 2, 14), 6);
        let labels: Vec<_> = stats.iter().map(MonthlyStat::label).collect();
        assert_eq!(
            labels,
            vec!["2024-09", "2024-10", "2024-11", "2024-12", "2025-01", "2025-02"]
        );
    }

    #[test]
    fn test_sums_per_month() {
        let entries = [
            entry(EntryKind::Debt, 1000, at(2025, 1, 3)),
            entry(EntryKind::Debt, 500, at(2025, 1, 20)),
            entry(EntryKind::Payment, 300, at(2025, 1, 25)),
            entry(EntryKind::Payment, 700, at(2025, 2, 1)),
            entry(EntryKind::from_stored("BONUS"), 9999, at(2025, 2, 2)),
            // Outside the window
            entry(EntryKind::Debt, 4000, at(2024, 6, 1)),
        ];
        let stats = monthly_stats(&entries, at(2025, 2, 14), 6);

        let january = &stats[4];
        assert_eq!(january.label(), "2025-01");
        assert_eq!(january.debt.cents(), 1500);
        assert_eq!(january.payment.cents(), 300);
        assert_eq!(january.net().cents(), 1200);

        let february = &stats[5];
        assert_eq!(february.debt.cents(), 0);
        assert_eq!(february.payment.cents(), 700);

        let total_debt: i64 = stats.iter().map(|s| s.debt.cents()).sum();
        assert_eq!(total_debt, 1500);
    }

    #[test]
    fn test_boundaries_are_inclusive() {
        let (start, end) = month_bounds(2025, 1).unwrap();
        let entries = [
            entry(EntryKind::Debt, 1, start),
            entry(EntryKind::Debt, 10, end),
            entry(EntryKind::Debt, 100, end + Duration::milliseconds(1)),
        ];
        let stats = monthly_stats(&entries, at(2025, 2, 1), 2);
        assert_eq!(stats[0].debt.cents(), 11);
        assert_eq!(stats[1].debt.cents(), 100);
        assert!(stats[0].contains(end));
        assert!(!stats[0].contains(end + Duration::milliseconds(1)));
    }

    #[test]
    fn test_oversized_window_is_capped() {
        let now = at(2025, 3, 15);
        let stats = monthly_stats(&[entry(EntryKind::Debt, 100, now)], now, u32::MAX);
        assert_eq!(stats.len(), MAX_MONTHLY_WINDOW as usize);
        let last = stats.last().unwrap();
        assert_eq!((last.year, last.month), (2025, 3));
        assert_eq!(last.debt, Money::from_cents(100));
    }
}
