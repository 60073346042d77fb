use crate::error::AppError;
use crate::recurrence::utc_day;
use crate::reminder::parse_time_of_day;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const MAX_TITLE_CHARS: usize = 100;
pub const MAX_DESCRIPTION_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Sort weight, higher is more important.
    pub fn weight(self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recurrence {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl Recurrence {
    pub fn is_recurring(self) -> bool {
        !matches!(self, Self::None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_interval: Option<u32>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub end_date: Option<OffsetDateTime>,
    #[serde(default)]
    pub has_reminder: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder_time: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Task {
    pub(crate) fn from_draft(id: String, draft: TaskDraft, now: OffsetDateTime) -> Self {
        let mut task = Self {
            id,
            title: draft.title,
            description: draft.description,
            category: draft.category,
            priority: draft.priority,
            due_date: draft.due_date,
            recurrence: draft.recurrence,
            custom_interval: draft.custom_interval,
            end_date: draft.end_date,
            has_reminder: draft.has_reminder,
            reminder_time: draft.reminder_time,
            completed: false,
            created_at: now,
            updated_at: now,
        };
        task.normalize();
        task
    }

    /// Copy of a recurring task for its next occurrence: fresh identity, pending.
    pub(crate) fn spawn_next(&self, id: String, due: OffsetDateTime, now: OffsetDateTime) -> Self {
        Self {
            id,
            due_date: Some(due),
            completed: false,
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.title = self.title.trim().to_string();
        self.description = self.description.trim().to_string();
        self.category = self
            .category
            .take()
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        if self.recurrence != Recurrence::Custom {
            self.custom_interval = None;
        }
        self.reminder_time = self
            .reminder_time
            .take()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(AppError::validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }
        if self.description.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(AppError::validation(format!(
                "description must be at most {MAX_DESCRIPTION_CHARS} characters"
            )));
        }

        match (self.recurrence, self.custom_interval) {
            (Recurrence::Custom, Some(days)) if days > 0 => {}
            (Recurrence::Custom, _) => {
                return Err(AppError::validation(
                    "custom recurrence requires a positive interval in days",
                ));
            }
            (_, Some(_)) => {
                return Err(AppError::validation(
                    "custom interval is only allowed with custom recurrence",
                ));
            }
            _ => {}
        }

        if self.has_reminder {
            let time_of_day = self
                .reminder_time
                .as_deref()
                .ok_or_else(|| AppError::validation("reminder time is required"))?;
            parse_time_of_day(time_of_day)?;
        }

        if let (Some(due), Some(end)) = (self.due_date, self.end_date)
            && utc_day(end) < utc_day(due)
        {
            return Err(AppError::validation("end date must not precede due date"));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub priority: Priority,
    pub due_date: Option<OffsetDateTime>,
    pub recurrence: Recurrence,
    pub custom_interval: Option<u32>,
    pub end_date: Option<OffsetDateTime>,
    pub has_reminder: bool,
    pub reminder_time: Option<String>,
}

impl TaskDraft {
    pub fn new<T: Into<String>>(title: T) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Partial update. Outer `None` leaves a field untouched; for clearable
/// fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Option<String>>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<OffsetDateTime>>,
    pub recurrence: Option<Recurrence>,
    pub custom_interval: Option<Option<u32>>,
    pub end_date: Option<Option<OffsetDateTime>>,
    pub has_reminder: Option<bool>,
    pub reminder_time: Option<Option<String>>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub(crate) fn apply_to(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title;
        }
        if let Some(description) = self.description {
            task.description = description;
        }
        if let Some(category) = self.category {
            task.category = category;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(recurrence) = self.recurrence {
            task.recurrence = recurrence;
        }
        if let Some(custom_interval) = self.custom_interval {
            task.custom_interval = custom_interval;
        }
        if let Some(end_date) = self.end_date {
            task.end_date = end_date;
        }
        if let Some(has_reminder) = self.has_reminder {
            task.has_reminder = has_reminder;
        }
        if let Some(reminder_time) = self.reminder_time {
            task.reminder_time = reminder_time;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        task.normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::{Priority, Recurrence, Task, TaskDraft, TaskPatch};
    use time::macros::datetime;

    fn draft_task(draft: TaskDraft) -> Task {
        Task::from_draft("task-1".to_string(), draft, datetime!(2024-01-01 08:00 UTC))
    }

    #[test]
    fn from_draft_trims_and_defaults() {
        let task = draft_task(TaskDraft {
            title: "  buy milk ".into(),
            category: Some("   ".into()),
            ..TaskDraft::default()
        });

        assert_eq!(task.title, "buy milk");
        assert_eq!(task.category, None);
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.recurrence, Recurrence::None);
        assert!(!task.completed);
        assert_eq!(task.created_at, task.updated_at);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_and_long_titles() {
        let blank = draft_task(TaskDraft::new("   "));
        assert_eq!(blank.validate().unwrap_err().code(), "validation");

        let long = draft_task(TaskDraft::new("x".repeat(101)));
        assert_eq!(long.validate().unwrap_err().code(), "validation");

        let exact = draft_task(TaskDraft::new("x".repeat(100)));
        assert!(exact.validate().is_ok());
    }

    #[test]
    fn validate_rejects_long_description() {
        let task = draft_task(TaskDraft {
            title: "demo".into(),
            description: "d".repeat(501),
            ..TaskDraft::default()
        });

        assert_eq!(task.validate().unwrap_err().code(), "validation");
    }

    #[test]
    fn custom_recurrence_requires_positive_interval() {
        let missing = draft_task(TaskDraft {
            title: "water plants".into(),
            recurrence: Recurrence::Custom,
            ..TaskDraft::default()
        });
        assert!(missing.validate().is_err());

        let zero = draft_task(TaskDraft {
            title: "water plants".into(),
            recurrence: Recurrence::Custom,
            custom_interval: Some(0),
            ..TaskDraft::default()
        });
        assert!(zero.validate().is_err());

        let ok = draft_task(TaskDraft {
            title: "water plants".into(),
            recurrence: Recurrence::Custom,
            custom_interval: Some(3),
            ..TaskDraft::default()
        });
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn interval_is_dropped_for_non_custom_recurrence() {
        let task = draft_task(TaskDraft {
            title: "stretch".into(),
            recurrence: Recurrence::Weekly,
            custom_interval: Some(4),
            ..TaskDraft::default()
        });

        assert_eq!(task.custom_interval, None);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn reminder_requires_well_formed_time() {
        let missing = draft_task(TaskDraft {
            title: "call mom".into(),
            has_reminder: true,
            ..TaskDraft::default()
        });
        assert!(missing.validate().is_err());

        let malformed = draft_task(TaskDraft {
            title: "call mom".into(),
            has_reminder: true,
            reminder_time: Some("24:00".into()),
            ..TaskDraft::default()
        });
        assert!(malformed.validate().is_err());

        let ok = draft_task(TaskDraft {
            title: "call mom".into(),
            has_reminder: true,
            reminder_time: Some("09:30".into()),
            ..TaskDraft::default()
        });
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn end_date_before_due_date_is_rejected() {
        let task = draft_task(TaskDraft {
            title: "gym".into(),
            recurrence: Recurrence::Daily,
            due_date: Some(datetime!(2024-03-10 00:00 UTC)),
            end_date: Some(datetime!(2024-03-09 00:00 UTC)),
            ..TaskDraft::default()
        });

        assert!(task.validate().is_err());
    }

    #[test]
    fn end_date_check_uses_utc_day() {
        let task = draft_task(TaskDraft {
            title: "gym".into(),
            recurrence: Recurrence::Daily,
            due_date: Some(datetime!(2024-03-10 00:30 +2)),
            end_date: Some(datetime!(2024-03-09 23:00 UTC)),
            ..TaskDraft::default()
        });

        assert!(task.validate().is_ok());
    }

    #[test]
    fn patch_sets_and_clears_fields() {
        let mut task = draft_task(TaskDraft {
            title: "demo".into(),
            category: Some("Work".into()),
            due_date: Some(datetime!(2024-03-10 00:00 UTC)),
            ..TaskDraft::default()
        });

        TaskPatch {
            title: Some(" renamed ".into()),
            category: Some(None),
            priority: Some(Priority::High),
            ..TaskPatch::default()
        }
        .apply_to(&mut task);

        assert_eq!(task.title, "renamed");
        assert_eq!(task.category, None);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.due_date, Some(datetime!(2024-03-10 00:00 UTC)));
    }

    #[test]
    fn deserializes_legacy_record_with_defaults() {
        let json = serde_json::json!({
            "id": "1700000000000abc",
            "title": "legacy",
            "completed": false,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-01-01T00:00:00Z"
        });

        let task: Task = serde_json::from_value(json).unwrap();

        assert_eq!(task.description, "");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.recurrence, Recurrence::None);
        assert!(!task.has_reminder);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn priority_weights_are_ordered() {
        assert!(Priority::High.weight() > Priority::Medium.weight());
        assert!(Priority::Medium.weight() > Priority::Low.weight());
    }
}
