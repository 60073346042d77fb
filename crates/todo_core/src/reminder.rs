use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime, Time};

/// What to do when a reminder's fire time is not in the future.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PastReminderPolicy {
    /// Shift to the day before the due date unless the due date is today.
    /// The result is still elapsed and is reported as such.
    Legacy,
    /// Deliver right away.
    FireImmediately,
    /// Report as not schedulable.
    #[default]
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireTime {
    At(OffsetDateTime),
    Elapsed(OffsetDateTime),
}

impl FireTime {
    pub fn schedulable(self) -> Option<OffsetDateTime> {
        match self {
            Self::At(at) => Some(at),
            Self::Elapsed(_) => None,
        }
    }

    pub fn instant(self) -> OffsetDateTime {
        match self {
            Self::At(at) | Self::Elapsed(at) => at,
        }
    }
}

/// Parses a strict `HH:MM` 24-hour time of day.
pub fn parse_time_of_day(raw: &str) -> Result<Time, AppError> {
    let malformed = || AppError::validation(format!("reminder time must be HH:MM, got {raw:?}"));
    let (hours, minutes) = raw.trim().split_once(':').ok_or_else(malformed)?;
    if hours.len() != 2 || minutes.len() != 2 {
        return Err(malformed());
    }
    if !hours.bytes().chain(minutes.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let hour: u8 = hours.parse().map_err(|_| malformed())?;
    let minute: u8 = minutes.parse().map_err(|_| malformed())?;
    Time::from_hms(hour, minute, 0).map_err(|_| malformed())
}

pub fn format_time_of_day(time: Time) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

pub fn reminder_fire_time(
    due: OffsetDateTime,
    time_of_day: &str,
    now: OffsetDateTime,
    policy: PastReminderPolicy,
) -> Result<FireTime, AppError> {
    let fire_at = due.replace_time(parse_time_of_day(time_of_day)?);
    if fire_at > now {
        return Ok(FireTime::At(fire_at));
    }

    let fire = match policy {
        PastReminderPolicy::Legacy => {
            let due_is_today = now.to_offset(due.offset()).date() == due.date();
            if due_is_today {
                FireTime::Elapsed(fire_at)
            } else {
                FireTime::Elapsed(fire_at.checked_sub(Duration::days(1)).unwrap_or(fire_at))
            }
        }
        PastReminderPolicy::FireImmediately => FireTime::At(now),
        PastReminderPolicy::Skip => FireTime::Elapsed(fire_at),
    };
    Ok(fire)
}

/// Fire time for a task's reminder, or `None` when the task has nothing to remind about.
pub fn reminder_for_task(
    task: &Task,
    now: OffsetDateTime,
    policy: PastReminderPolicy,
) -> Result<Option<FireTime>, AppError> {
    if task.completed || !task.has_reminder {
        return Ok(None);
    }
    let (Some(due), Some(time_of_day)) = (task.due_date, task.reminder_time.as_deref()) else {
        return Ok(None);
    };
    reminder_fire_time(due, time_of_day, now, policy).map(Some)
}
