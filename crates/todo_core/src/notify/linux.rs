use crate::error::AppError;
use crate::notify::{Presenter, REMINDER_SUMMARY, Reminder};
use notify_rust::Notification;

pub struct LinuxPresenter;

impl Presenter for LinuxPresenter {
    fn present(&self, reminder: &Reminder) -> Result<(), AppError> {
        let mut notification = Notification::new();
        notification.summary(REMINDER_SUMMARY);
        notification.body(&reminder.text());
        notification.appname("todoapp");

        notification
            .show()
            .map_err(|err| AppError::notification(err.to_string()))?;
        tracing::debug!(task_id = %reminder.task_id, "reminder shown");
        Ok(())
    }
}
