//! Calendar-month helpers for accounting periods.

use chrono::{Datelike, Days, Months, NaiveDate};

/// First day of the month containing `date`.
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date - Days::new(u64::from(date.day0()))
}

/// First day of the month after the one containing `date`.
#[must_use]
pub fn next_month_start(date: NaiveDate) -> NaiveDate {
    month_start(date) + Months::new(1)
}

/// Last day of the month containing `date`.
#[must_use]
pub fn month_end(date: NaiveDate) -> NaiveDate {
    next_month_start(date) - Days::new(1)
}

/// Period name for the month containing `date`, e.g. `2024-05`.
#[must_use]
pub fn period_name(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}
