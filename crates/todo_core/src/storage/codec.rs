//! JSON layout of the persisted task collection and settings.

use crate::error::AppError;
use crate::model::{AppSettings, Task};
use crate::storage::KeyValueStore;

pub const TODOS_KEY: &str = "@todos";
pub const SETTINGS_KEY: &str = "@settings";

#[derive(Debug, Clone)]
pub struct TaskLoad {
    pub tasks: Vec<Task>,
    pub error: Option<AppError>,
}

#[derive(Debug, Clone)]
pub struct SettingsLoad {
    pub settings: AppSettings,
    pub error: Option<AppError>,
}

pub fn encode_tasks(tasks: &[Task]) -> Result<String, AppError> {
    Ok(serde_json::to_string(tasks)?)
}

pub fn decode_tasks(content: &str) -> Result<Vec<Task>, AppError> {
    serde_json::from_str(content)
        .map_err(|err| AppError::parse(format!("invalid task collection: {err}")))
}

pub fn read_tasks(store: &dyn KeyValueStore) -> Result<Vec<Task>, AppError> {
    match store.get(TODOS_KEY)? {
        Some(content) if !content.trim().is_empty() => decode_tasks(&content),
        _ => Ok(Vec::new()),
    }
}

/// Never fails: unreadable or corrupt data yields an empty collection plus the error.
pub fn load_tasks(store: &dyn KeyValueStore) -> TaskLoad {
    match read_tasks(store) {
        Ok(tasks) => TaskLoad { tasks, error: None },
        Err(err) => {
            tracing::warn!(error = %err, "failed to load tasks, starting empty");
            TaskLoad {
                tasks: Vec::new(),
                error: Some(err),
            }
        }
    }
}

pub fn save_tasks(store: &mut dyn KeyValueStore, tasks: &[Task]) -> Result<(), AppError> {
    let content = encode_tasks(tasks)?;
    store.set(TODOS_KEY, &content)
}

pub fn clear_tasks(store: &mut dyn KeyValueStore) -> Result<(), AppError> {
    store.remove(TODOS_KEY)
}

pub fn load_settings(store: &dyn KeyValueStore, defaults: &AppSettings) -> SettingsLoad {
    let read = store.get(SETTINGS_KEY).and_then(|content| match content {
        Some(content) if !content.trim().is_empty() => serde_json::from_str(&content)
            .map_err(|err| AppError::parse(format!("invalid settings: {err}"))),
        _ => Ok(defaults.clone()),
    });

    match read {
        Ok(settings) => SettingsLoad {
            settings,
            error: None,
        },
        Err(err) => {
            tracing::warn!(error = %err, "failed to load settings, using defaults");
            SettingsLoad {
                settings: defaults.clone(),
                error: Some(err),
            }
        }
    }
}

pub fn save_settings(store: &mut dyn KeyValueStore, settings: &AppSettings) -> Result<(), AppError> {
    let content = serde_json::to_string(settings)?;
    store.set(SETTINGS_KEY, &content)
}
