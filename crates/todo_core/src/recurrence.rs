//! Next-occurrence computation for recurring tasks.
//!
//! Monthly recurrence keeps the day of month when the target month has it and
//! otherwise clamps to the last day of the target month (Jan 31 -> Feb 29 in a
//! leap year, Feb 28 otherwise). The clamped day is not carried forward: the
//! next step is computed from the clamped date.
//!
//! Calendar-day comparisons (end-date cutoff, display order) use the UTC day of
//! each instant so that mixed offsets order consistently.

use crate::model::{Recurrence, Task};
use time::util::days_in_year_month;
use time::{Date, Duration, Month, OffsetDateTime};

const SECONDS_PER_DAY: i64 = 86_400;

/// Days since the Unix epoch of `at`'s UTC calendar date. Unlike an offset
/// conversion this cannot leave the representable range.
pub fn utc_day(at: OffsetDateTime) -> i64 {
    at.unix_timestamp().div_euclid(SECONDS_PER_DAY)
}

pub fn next_occurrence(
    current_due: Option<OffsetDateTime>,
    rule: Recurrence,
    custom_interval_days: Option<u32>,
    end_date: Option<OffsetDateTime>,
) -> Option<OffsetDateTime> {
    let current = current_due?;
    let next = match rule {
        Recurrence::None => return None,
        Recurrence::Daily => current.checked_add(Duration::days(1))?,
        Recurrence::Weekly => current.checked_add(Duration::days(7))?,
        Recurrence::Monthly => current.replace_date(add_one_month(current.date())?),
        Recurrence::Custom => {
            let days = custom_interval_days.filter(|days| *days > 0)?;
            current.checked_add(Duration::days(i64::from(days)))?
        }
    };

    if let Some(end) = end_date
        && utc_day(next) > utc_day(end)
    {
        return None;
    }

    Some(next)
}

/// Next due date for `task`, reading its recurrence fields.
pub fn next_occurrence_for(task: &Task) -> Option<OffsetDateTime> {
    next_occurrence(
        task.due_date,
        task.recurrence,
        task.custom_interval,
        task.end_date,
    )
}

fn add_one_month(date: Date) -> Option<Date> {
    let (year, month) = match date.month() {
        Month::December => (date.year().checked_add(1)?, Month::January),
        other => (date.year(), other.next()),
    };
    let day = date.day().min(days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day).ok()
}
