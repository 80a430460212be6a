//! Week bucketing and reporting-period helpers
//!
//! Weeks run Sunday through Saturday. A week is identified by its Sunday.

use chrono::{Datelike, Duration, NaiveDate};

use crate::types::{Period, WeekKey};

/// Map a date to the week containing it.
///
/// `week_start = date - ((weekday_mon0 + 1) mod 7)`; a Sunday maps to itself.
pub fn bucket(date: NaiveDate) -> WeekKey {
    let days_since_sunday = date.weekday().num_days_from_sunday();
    WeekKey::from_sunday(date - Duration::days(days_since_sunday as i64))
}

/// Most recent Saturday on or before `today`
pub fn last_saturday(today: NaiveDate) -> NaiveDate {
    let days_since_saturday = (today.weekday().num_days_from_monday() + 2) % 7;
    today - Duration::days(days_since_saturday as i64)
}

/// `weeks` full weeks ending on the last completed Saturday
pub fn weeks_ending_last_saturday(today: NaiveDate, weeks: u32) -> Period {
    let end = last_saturday(today);
    let start = end - Duration::days(i64::from(weeks.max(1)) * 7 - 1);
    Period::new(start, end)
}

/// First of the month up to `end`
pub fn month_to_date(end: NaiveDate) -> Period {
    Period::new(end.with_day(1).unwrap_or(end), end)
}
