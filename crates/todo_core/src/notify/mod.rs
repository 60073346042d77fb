use crate::error::AppError;
use std::collections::BTreeMap;
use time::OffsetDateTime;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::LinuxPresenter;

#[cfg(windows)]
mod windows;
#[cfg(windows)]
pub use windows::WindowsPresenter;

pub const REMINDER_SUMMARY: &str = "Task Reminder";

pub type NotificationHandle = String;

/// Device-side reminder scheduling, keyed by task id: scheduling a task that
/// already has a reminder replaces it.
pub trait NotificationScheduler: Send {
    fn schedule(
        &mut self,
        task_id: &str,
        title: &str,
        body: &str,
        fire_at: OffsetDateTime,
    ) -> Result<Option<NotificationHandle>, AppError>;

    fn cancel(&mut self, task_id: &str) -> Result<(), AppError>;

    fn cancel_all(&mut self) -> Result<(), AppError>;

    /// Delivers whatever is due. Schedulers backed by the platform deliver on
    /// their own and have nothing to do here.
    fn dispatch_due(&mut self, now: OffsetDateTime) -> DispatchOutcome {
        let _ = now;
        DispatchOutcome::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub task_id: String,
    pub title: String,
    pub body: String,
    pub fire_at: OffsetDateTime,
}

impl Reminder {
    pub fn text(&self) -> String {
        reminder_text(&self.title, &self.body)
    }
}

pub fn reminder_text(title: &str, body: &str) -> String {
    if body.trim().is_empty() {
        title.to_string()
    } else {
        format!("{title} - {body}")
    }
}

#[derive(Debug, Default)]
pub struct DispatchOutcome {
    pub delivered: Vec<Reminder>,
    pub failures: Vec<NotificationFailure>,
}

#[derive(Debug)]
pub struct NotificationFailure {
    pub task_id: String,
    pub error: AppError,
}

pub struct NoopScheduler;

impl NotificationScheduler for NoopScheduler {
    fn schedule(
        &mut self,
        _task_id: &str,
        _title: &str,
        _body: &str,
        _fire_at: OffsetDateTime,
    ) -> Result<Option<NotificationHandle>, AppError> {
        Ok(None)
    }

    fn cancel(&mut self, _task_id: &str) -> Result<(), AppError> {
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Shows a single reminder on screen.
pub trait Presenter: Send {
    fn present(&self, reminder: &Reminder) -> Result<(), AppError>;
}

/// Holds pending reminders in memory and hands them to a presenter once due.
pub struct ReminderQueue<P> {
    presenter: P,
    pending: BTreeMap<String, Reminder>,
}

impl<P: Presenter> ReminderQueue<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            pending: BTreeMap::new(),
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &Reminder> {
        self.pending.values()
    }

    pub fn next_fire_time(&self) -> Option<OffsetDateTime> {
        self.pending.values().map(|reminder| reminder.fire_at).min()
    }
}

impl<P: Presenter> NotificationScheduler for ReminderQueue<P> {
    fn schedule(
        &mut self,
        task_id: &str,
        title: &str,
        body: &str,
        fire_at: OffsetDateTime,
    ) -> Result<Option<NotificationHandle>, AppError> {
        self.pending.insert(
            task_id.to_string(),
            Reminder {
                task_id: task_id.to_string(),
                title: title.to_string(),
                body: body.to_string(),
                fire_at,
            },
        );
        Ok(Some(task_id.to_string()))
    }

    fn cancel(&mut self, task_id: &str) -> Result<(), AppError> {
        self.pending.remove(task_id);
        Ok(())
    }

    fn cancel_all(&mut self) -> Result<(), AppError> {
        self.pending.clear();
        Ok(())
    }

    fn dispatch_due(&mut self, now: OffsetDateTime) -> DispatchOutcome {
        let due: Vec<String> = self
            .pending
            .values()
            .filter(|reminder| reminder.fire_at <= now)
            .map(|reminder| reminder.task_id.clone())
            .collect();

        let mut outcome = DispatchOutcome::default();
        for task_id in due {
            let Some(reminder) = self.pending.remove(&task_id) else {
                continue;
            };
            match self.presenter.present(&reminder) {
                Ok(()) => outcome.delivered.push(reminder),
                Err(error) => {
                    tracing::warn!(task_id = %task_id, error = %error, "reminder delivery failed");
                    outcome.failures.push(NotificationFailure { task_id, error });
                }
            }
        }
        outcome
    }
}

pub fn scheduler_from_env() -> Box<dyn NotificationScheduler> {
    if std::env::var("TODOAPP_DISABLE_NOTIFICATIONS").is_ok() {
        return Box::new(NoopScheduler);
    }
    platform_scheduler()
}

#[cfg(target_os = "linux")]
pub fn platform_scheduler() -> Box<dyn NotificationScheduler> {
    Box::new(ReminderQueue::new(LinuxPresenter))
}

#[cfg(windows)]
pub fn platform_scheduler() -> Box<dyn NotificationScheduler> {
    Box::new(ReminderQueue::new(WindowsPresenter))
}

#[cfg(not(any(target_os = "linux", windows)))]
pub fn platform_scheduler() -> Box<dyn NotificationScheduler> {
    tracing::info!("notifications are not supported on this platform");
    Box::new(NoopScheduler)
}
