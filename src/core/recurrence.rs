//! Recurrence expansion - turns a weekly delivery pattern into calendar dates.
//!
//! Pure and deterministic: the same (start date, weekday set, week count)
//! always produces the same ordered date list, so re-expanding a schedule and
//! re-inserting it through the store can never create duplicate deliveries.

use crate::errors::{Error, Result};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Expands a weekly recurrence pattern into an ordered list of delivery dates.
///
/// For each week `w` in `[0, weeks)` and each distinct weekday `d`, the
/// candidate date is `start_date + w*7 + ((d - start_weekday + 7) mod 7)`
/// days, with weekdays indexed 0=Sunday…6=Saturday. The first occurrence of a
/// weekday is therefore never before `start_date`.
///
/// Duplicate weekdays in the input are collapsed; the output holds exactly
/// `weeks × |distinct weekdays|` ascending dates.
///
/// # Errors
/// `Error::InvalidRecurrence` if the weekday set is empty or `weeks` is zero.
pub fn expand(start_date: NaiveDate, weekdays: &[Weekday], weeks: u32) -> Result<Vec<NaiveDate>> {
    if weekdays.is_empty() {
        return Err(Error::InvalidRecurrence {
            message: "weekday set must not be empty".to_string(),
        });
    }
    if weeks < 1 {
        return Err(Error::InvalidRecurrence {
            message: "week count must be at least 1".to_string(),
        });
    }

    let start_index = start_date.weekday().num_days_from_sunday();
    let mut offsets: Vec<u32> = weekdays
        .iter()
        .map(|day| (day.num_days_from_sunday() + 7 - start_index) % 7)
        .collect();
    offsets.sort_unstable();
    offsets.dedup();

    let mut dates = Vec::with_capacity(weeks as usize * offsets.len());
    for week in 0..weeks {
        for offset in &offsets {
            let days = i64::from(week) * 7 + i64::from(*offset);
            dates.push(start_date + Duration::days(days));
        }
    }

    Ok(dates)
}
