//! Date and duration helpers.

use chrono::{Datelike, Duration, Months, NaiveDate};

/// Format a duration as `HH:MM`, truncated to whole minutes.
///
/// Negative durations format as `00:00`. Hours are not capped at 24.
#[must_use]
pub fn format_hhmm(d: Duration) -> String {
    let total_minutes = d.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;

    format!("{hours:02}:{minutes:02}")
}

/// Monday of the week containing `date`.
#[must_use]
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// First day of the month containing `date`.
#[must_use]
pub fn start_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month after the one containing `date`.
#[must_use]
pub fn start_of_next_month(date: NaiveDate) -> NaiveDate {
    let first = start_of_month(date);
    first
        .checked_add_months(Months::new(1))
        .unwrap_or(NaiveDate::MAX)
}
