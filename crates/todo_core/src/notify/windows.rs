use crate::error::AppError;
use crate::notify::{Presenter, REMINDER_SUMMARY, Reminder};
use tauri_winrt_notification::Toast;

pub struct WindowsPresenter;

impl Presenter for WindowsPresenter {
    fn present(&self, reminder: &Reminder) -> Result<(), AppError> {
        let mut toast = Toast::new(Toast::POWERSHELL_APP_ID)
            .title(REMINDER_SUMMARY)
            .text1(&reminder.title);
        if !reminder.body.trim().is_empty() {
            toast = toast.text2(&reminder.body);
        }

        toast
            .show()
            .map_err(|err| AppError::notification(err.to_string()))?;
        tracing::debug!(task_id = %reminder.task_id, "reminder shown");
        Ok(())
    }
}
