//! Debt aging
//!
//! Buckets DEBT entries by how old they are: 0-30, 31-60, 61-90 and 90+
//! days. Each bucket sums the raw debt amounts. Payments are not matched
//! against specific debts, so a customer who has paid off old credit still
//! shows that credit in its original bucket; the four buckets always add up
//! to the total amount ever lent.

use chrono::{DateTime, Utc};

use crate::models::{LedgerEntry, Money};

/// One aging range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgingBucket {
    /// 0 to 30 days old
    Current,
    /// 31 to 60 days old
    Days31To60,
    /// 61 to 90 days old
    Days61To90,
    /// More than 90 days old
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 4] = [
        AgingBucket::Current,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];

    /// Bucket for an age in whole days. Negative ages (future timestamps)
    /// count as brand new.
    pub fn for_age(days: i64) -> Self {
        match days {
            i64::MIN..=30 => Self::Current,
            31..=60 => Self::Days31To60,
            61..=90 => Self::Days61To90,
            _ => Self::Over90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Current => "0-30",
            Self::Days31To60 => "31-60",
            Self::Days61To90 => "61-90",
            Self::Over90 => "90+",
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Current => 0,
            Self::Days31To60 => 1,
            Self::Days61To90 => 2,
            Self::Over90 => 3,
        }
    }
}

impl std::fmt::Display for AgingBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Debt totals per aging bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgingReport {
    amounts: [Money; 4],
    counts: [usize; 4],
}

impl AgingReport {
    /// Total debt in a bucket
    pub fn amount(&self, bucket: AgingBucket) -> Money {
        self.amounts[bucket.index()]
    }

    /// Number of debt entries in a bucket
    pub fn count(&self, bucket: AgingBucket) -> usize {
        self.counts[bucket.index()]
    }

    /// Sum over all buckets
    pub fn total(&self) -> Money {
        self.amounts.iter().sum()
    }

    /// `(bucket, amount)` in age order
    pub fn iter(&self) -> impl Iterator<Item = (AgingBucket, Money)> + '_ {
        AgingBucket::ALL.into_iter().map(|b| (b, self.amount(b)))
    }

    fn add(&mut self, bucket: AgingBucket, amount: Money) {
        self.amounts[bucket.index()] += amount;
        self.counts[bucket.index()] += 1;
    }
}

/// Age of a timestamp in whole days (floored, never negative)
pub fn age_in_days(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - timestamp).num_days().max(0)
}

/// Bucket the DEBT entries by age relative to `now`
pub fn aging_report<'a, I>(entries: I, now: DateTime<Utc>) -> AgingReport
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    entries
        .into_iter()
        .filter(|e| e.kind.is_debt())
        .fold(AgingReport::default(), |mut report, e| {
            report.add(AgingBucket::for_age(age_in_days(e.timestamp, now)), e.amount);
            report
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerId, EntryKind};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn entry(kind: EntryKind, cents: i64, days_ago: i64) -> LedgerEntry {
        LedgerEntry::new(
            CustomerId::new(1),
            kind,
            Money::from_cents(cents),
            now() - Duration::days(days_ago),
        )
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(AgingBucket::for_age(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(30), AgingBucket::Current);
        assert_eq!(AgingBucket::for_age(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(60), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(61), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(91), AgingBucket::Over90);
        assert_eq!(AgingBucket::for_age(-3), AgingBucket::Current);
    }

    #[test]
    fn test_age_is_floored_whole_days() {
        let ts = now() - Duration::days(30) - Duration::hours(23);
        assert_eq!(age_in_days(ts, now()), 30);
        assert_eq!(age_in_days(now() + Duration::days(2), now()), 0);
    }

    #[test]
    fn test_buckets_partition_all_debt() {
        let entries = [
            entry(EntryKind::Debt, 100, 5),
            entry(EntryKind::Debt, 200, 45),
            entry(EntryKind::Debt, 300, 75),
            entry(EntryKind::Debt, 400, 200),
            entry(EntryKind::Debt, 50, 31),
            entry(EntryKind::Payment, 999, 1),
            entry(EntryKind::from_stored("other"), 999, 1),
        ];
        let report = aging_report(&entries, now());

        assert_eq!(report.amount(AgingBucket::Current).cents(), 100);
        assert_eq!(report.amount(AgingBucket::Days31To60).cents(), 250);
        assert_eq!(report.amount(AgingBucket::Days61To90).cents(), 300);
        assert_eq!(report.amount(AgingBucket::Over90).cents(), 400);
        assert_eq!(report.count(AgingBucket::Days31To60), 2);

        let all_debt: Money = entries
            .iter()
            .filter(|e| e.kind.is_debt())
            .map(|e| e.amount)
            .sum();
        assert_eq!(report.total(), all_debt);
    }

    #[test]
    fn test_payments_do_not_offset_oldest_debt() {
        // 100 lent 100 days ago, 100 lent today, 100 paid back yesterday.
        // Aging keeps the raw old debt in 90+: no FIFO matching.
        let entries = [
            entry(EntryKind::Debt, 10000, 100),
            entry(EntryKind::Debt, 10000, 0),
            entry(EntryKind::Payment, 10000, 1),
        ];
        let report = aging_report(&entries, now());
        assert_eq!(report.amount(AgingBucket::Over90).cents(), 10000);
        assert_eq!(report.amount(AgingBucket::Current).cents(), 10000);
        assert_eq!(report.total().cents(), 20000);
    }

    #[test]
    fn test_iter_in_age_order() {
        let labels: Vec<_> = AgingReport::default().iter().map(|(b, _)| b.label()).collect();
        assert_eq!(labels, vec!["0-30", "31-60", "61-90", "90+"]);
    }
}
