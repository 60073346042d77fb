mod settings;
mod task;

pub use settings::{AppSettings, ColorScheme};
pub use task::{
    MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, Priority, Recurrence, Task, TaskDraft, TaskPatch,
};
