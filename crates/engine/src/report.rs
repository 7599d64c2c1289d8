//! Per-user spending report.
//!
//! A report is derived from the full list of a user's records every time it
//! is requested; nothing is cached or stored.
use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};

use crate::ExpenseRecord;

/// How many of the latest records a report lists.
pub const RECENT_ENTRIES: usize = 5;

/// Totals for one report window.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WindowSummary {
    pub total: f64,
    pub entries: usize,
    /// `None` when the window is empty.
    pub mean: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub user: String,
    pub today: NaiveDate,
    /// Records dated today. The mean is per entry.
    pub day: WindowSummary,
    /// Records in today's calendar month. The mean is per day that has at
    /// least one entry.
    pub month: WindowSummary,
    pub active_days: usize,
    /// Latest records regardless of date, oldest first.
    pub recent: Vec<ExpenseRecord>,
}

impl Report {
    /// Builds the report of `user` from records in insertion order.
    ///
    /// Returns `None` when there are no records at all.
    pub fn build(user: &str, records: &[ExpenseRecord], today: NaiveDate) -> Option<Report> {
        if records.is_empty() {
            return None;
        }

        let day_amounts: Vec<f64> = records
            .iter()
            .filter(|r| r.date == today)
            .map(|r| r.amount.value())
            .collect();
        let day_total: f64 = day_amounts.iter().sum();

        let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        let mut month_entries = 0;
        for record in records.iter().filter(|r| same_month(r.date, today)) {
            *daily.entry(record.date).or_default() += record.amount.value();
            month_entries += 1;
        }
        let month_total: f64 = daily.values().sum();

        let start = records.len().saturating_sub(RECENT_ENTRIES);

        Some(Report {
            user: user.to_string(),
            today,
            day: WindowSummary {
                total: day_total,
                entries: day_amounts.len(),
                mean: mean(day_total, day_amounts.len()),
            },
            month: WindowSummary {
                total: month_total,
                entries: month_entries,
                mean: mean(month_total, daily.len()),
            },
            active_days: daily.len(),
            recent: records[start..].to_vec(),
        })
    }

    /// `YYYY-MM` label of the month window.
    pub fn month_label(&self) -> String {
        self.today.format("%Y-%m").to_string()
    }
}

fn same_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

fn mean(total: f64, count: usize) -> Option<f64> {
    (count > 0).then(|| total / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Amount, Category};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(date: NaiveDate, amount: f64, category: &str) -> ExpenseRecord {
        ExpenseRecord::new(date, Amount::new(amount).unwrap(), Category::new(category), "alice")
    }

    #[test]
    fn empty_records_have_no_report() {
        assert_eq!(Report::build("alice", &[], date(2025, 3, 10)), None);
    }

    #[test]
    fn three_entries_today() {
        let today = date(2025, 3, 10);
        let records = vec![
            record(today, 10000.0, "Breakfast"),
            record(today, 20000.0, "Lunch"),
            record(today, 30000.0, "Dinner"),
        ];

        let report = Report::build("alice", &records, today).unwrap();
        assert_eq!(report.day.total, 60000.0);
        assert_eq!(report.day.mean, Some(20000.0));
        assert_eq!(report.month.total, 60000.0);
        assert_eq!(report.month.mean, Some(60000.0));
        assert_eq!(report.active_days, 1);
    }

    #[test]
    fn month_mean_is_per_active_day() {
        let today = date(2025, 3, 10);
        let records = vec![
            record(date(2025, 3, 1), 10000.0, "Lunch"),
            record(date(2025, 3, 1), 5000.0, "Dinner"),
            record(date(2025, 3, 4), 15000.0, "Lunch"),
            record(date(2025, 2, 28), 99999.0, "Lunch"),
            record(date(2024, 3, 4), 77777.0, "Lunch"),
        ];

        let report = Report::build("alice", &records, today).unwrap();
        assert_eq!(report.month.total, 30000.0);
        assert_eq!(report.month.entries, 3);
        assert_eq!(report.active_days, 2);
        assert_eq!(report.month.mean, Some(15000.0));
    }

    #[test]
    fn empty_windows_have_no_mean() {
        let today = date(2025, 3, 10);
        let records = vec![record(date(2024, 1, 1), 100.0, "Lunch")];

        let report = Report::build("alice", &records, today).unwrap();
        assert_eq!(report.day, WindowSummary::default());
        assert_eq!(report.month, WindowSummary::default());
        assert_eq!(report.recent.len(), 1);
    }

    #[test]
    fn recent_are_last_five_in_insertion_order() {
        let today = date(2025, 3, 10);
        let records: Vec<_> = (1..=7)
            .map(|d| record(date(2025, 3, d), d as f64, "Lunch"))
            .collect();

        let report = Report::build("alice", &records, today).unwrap();
        let amounts: Vec<f64> = report.recent.iter().map(|r| r.amount.value()).collect();
        assert_eq!(amounts, vec![3.0, 4.0, 5.0, 6.0, 7.0]);
        assert_eq!(report.month_label(), "2025-03");
    }

    #[test]
    fn building_twice_is_identical() {
        let today = date(2025, 3, 10);
        let records = vec![
            record(today, 1.5, "Lunch"),
            record(date(2025, 3, 2), 2.25, "Dinner"),
        ];
        assert_eq!(
            Report::build("alice", &records, today),
            Report::build("alice", &records, today)
        );
    }
}
