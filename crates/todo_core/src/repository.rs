//! The task collection and every mutation on it.
//!
//! Mutations update memory first and then write the whole collection through
//! the store. A failed write is logged and recorded in [`Durability`]; memory
//! stays authoritative and is never rolled back. Callers that need to know
//! whether the last mutation reached storage check [`TaskRepository::durability`].

use crate::config::EngineConfig;
use crate::error::AppError;
use crate::model::{AppSettings, ColorScheme, Task, TaskDraft, TaskPatch};
use crate::notify::{DispatchOutcome, NotificationScheduler};
use crate::recurrence::next_occurrence_for;
use crate::reminder::{PastReminderPolicy, reminder_for_task};
use crate::storage::{KeyValueStore, codec};
use crate::view::{FilterExpr, TaskStats, stats, view};
use rand::Rng;
use time::OffsetDateTime;

const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Durability {
    Saved,
    Failed(AppError),
}

impl Durability {
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Result of flipping a task's completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toggled {
    pub task: Task,
    /// The next occurrence created when a recurring task was completed.
    pub next: Option<Task>,
}

pub struct TaskRepository {
    tasks: Vec<Task>,
    settings: AppSettings,
    store: Box<dyn KeyValueStore>,
    scheduler: Box<dyn NotificationScheduler>,
    past_reminders: PastReminderPolicy,
    durability: Durability,
}

impl TaskRepository {
    /// Empty repository; nothing is read from `store`.
    pub fn new(
        store: Box<dyn KeyValueStore>,
        scheduler: Box<dyn NotificationScheduler>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            tasks: Vec::new(),
            settings: AppSettings {
                color_scheme: config.default_color_scheme(),
            },
            store,
            scheduler,
            past_reminders: config.past_reminders,
            durability: Durability::Saved,
        }
    }

    /// Loads tasks and settings from `store`. Corrupt or unreadable data
    /// falls back to an empty collection and default settings.
    pub fn open(
        store: Box<dyn KeyValueStore>,
        scheduler: Box<dyn NotificationScheduler>,
        config: &EngineConfig,
    ) -> Self {
        let mut repository = Self::new(store, scheduler, config);
        let defaults = repository.settings.clone();
        repository.settings = codec::load_settings(repository.store.as_ref(), &defaults).settings;
        repository.tasks = codec::load_tasks(repository.store.as_ref()).tasks;
        repository.resync_reminders();
        tracing::info!(tasks = repository.tasks.len(), "task repository opened");
        repository
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub fn view(&self, filter: &FilterExpr) -> Vec<&Task> {
        view(&self.tasks, filter)
    }

    pub fn stats(&self) -> TaskStats {
        stats(&self.tasks)
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn store(&self) -> &dyn KeyValueStore {
        self.store.as_ref()
    }

    pub fn durability(&self) -> &Durability {
        &self.durability
    }

    pub fn add(&mut self, draft: TaskDraft) -> Result<Task, AppError> {
        let now = OffsetDateTime::now_utc();
        let task = Task::from_draft(self.fresh_id(now), draft, now);
        task.validate()?;

        self.tasks.push(task.clone());
        tracing::debug!(task_id = %task.id, "task added");
        self.persist();
        sync_reminder(self.scheduler.as_mut(), &task, self.past_reminders);

        Ok(task)
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task, AppError> {
        let index = self.index_of(id)?;

        let mut candidate = self.tasks[index].clone();
        patch.apply_to(&mut candidate);
        candidate.validate()?;
        candidate.updated_at = OffsetDateTime::now_utc();

        self.tasks[index] = candidate.clone();
        tracing::debug!(task_id = %id, "task updated");
        self.persist();
        sync_reminder(self.scheduler.as_mut(), &candidate, self.past_reminders);

        Ok(candidate)
    }

    /// Deleting an unknown id is a no-op and writes nothing.
    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let Some(index) = self.tasks.iter().position(|task| task.id == id) else {
            tracing::debug!(task_id = %id, "remove ignored, task not found");
            return None;
        };

        let removed = self.tasks.remove(index);
        tracing::debug!(task_id = %id, "task removed");
        self.persist();
        cancel_reminder(self.scheduler.as_mut(), id);

        Some(removed)
    }

    /// Completing a recurring task keeps it as a completed record and appends
    /// its next occurrence, unless the recurrence has run past its end date.
    pub fn toggle_completion(&mut self, id: &str) -> Result<Toggled, AppError> {
        let index = self.index_of(id)?;
        let now = OffsetDateTime::now_utc();

        let original = &self.tasks[index];
        let completing = !original.completed;
        let next = if completing && original.recurrence.is_recurring() {
            next_occurrence_for(original)
                .map(|due| original.spawn_next(self.fresh_id(now), due, now))
        } else {
            None
        };

        let mut toggled = original.clone();
        toggled.completed = completing;
        toggled.updated_at = now;

        self.tasks[index] = toggled.clone();
        if let Some(next) = next.as_ref() {
            self.tasks.push(next.clone());
            tracing::debug!(task_id = %id, next_id = %next.id, "next occurrence created");
        }
        tracing::debug!(task_id = %id, completed = completing, "task toggled");
        self.persist();

        sync_reminder(self.scheduler.as_mut(), &toggled, self.past_reminders);
        if let Some(next) = next.as_ref() {
            sync_reminder(self.scheduler.as_mut(), next, self.past_reminders);
        }

        Ok(Toggled {
            task: toggled,
            next,
        })
    }

    /// Drops every completed task, keeping the relative order of the rest.
    pub fn clear_completed(&mut self) -> Vec<Task> {
        let (removed, kept): (Vec<Task>, Vec<Task>) =
            std::mem::take(&mut self.tasks).into_iter().partition(|task| task.completed);
        self.tasks = kept;

        tracing::debug!(removed = removed.len(), "completed tasks cleared");
        self.persist();
        for task in &removed {
            cancel_reminder(self.scheduler.as_mut(), &task.id);
        }

        removed
    }

    pub fn set_color_scheme(&mut self, color_scheme: ColorScheme) -> &AppSettings {
        self.settings.color_scheme = color_scheme;
        self.durability = match codec::save_settings(self.store.as_mut(), &self.settings) {
            Ok(()) => Durability::Saved,
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist settings");
                Durability::Failed(err)
            }
        };
        &self.settings
    }

    /// Re-reads the collection from the store. On failure the collection is
    /// emptied, the same as on open, and the error is returned.
    pub fn reload(&mut self) -> Result<(), AppError> {
        let loaded = codec::load_tasks(self.store.as_ref());
        self.tasks = loaded.tasks;
        self.resync_reminders();
        match loaded.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Cancels every reminder and schedules again from the current collection.
    pub fn resync_reminders(&mut self) {
        if let Err(err) = self.scheduler.cancel_all() {
            tracing::warn!(error = %err, "failed to cancel reminders");
        }
        for task in &self.tasks {
            sync_reminder(self.scheduler.as_mut(), task, self.past_reminders);
        }
    }

    pub fn dispatch_reminders(&mut self, now: OffsetDateTime) -> DispatchOutcome {
        self.scheduler.dispatch_due(now)
    }

    fn index_of(&self, id: &str) -> Result<usize, AppError> {
        self.tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| AppError::not_found(format!("task {id} not found")))
    }

    fn fresh_id(&self, now: OffsetDateTime) -> String {
        let millis = now.unix_timestamp_nanos() / 1_000_000;
        let mut rng = rand::thread_rng();
        loop {
            let suffix: String = (0..ID_SUFFIX_LEN)
                .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
                .collect();
            let id = format!("{millis}{suffix}");
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn persist(&mut self) {
        self.durability = match codec::save_tasks(self.store.as_mut(), &self.tasks) {
            Ok(()) => Durability::Saved,
            Err(err) => {
                tracing::warn!(error = %err, "failed to persist tasks, keeping in-memory state");
                Durability::Failed(err)
            }
        };
    }
}

fn sync_reminder(scheduler: &mut dyn NotificationScheduler, task: &Task, policy: PastReminderPolicy) {
    let now = OffsetDateTime::now_utc();
    let fire = match reminder_for_task(task, now, policy) {
        Ok(Some(fire)) => fire,
        Ok(None) => {
            cancel_reminder(scheduler, &task.id);
            return;
        }
        Err(err) => {
            tracing::warn!(task_id = %task.id, error = %err, "invalid reminder settings");
            cancel_reminder(scheduler, &task.id);
            return;
        }
    };

    let Some(fire_at) = fire.schedulable() else {
        tracing::warn!(
            task_id = %task.id,
            fire_at = %fire.instant(),
            "reminder time already passed, not scheduling"
        );
        cancel_reminder(scheduler, &task.id);
        return;
    };

    match scheduler.schedule(&task.id, &task.title, &task.description, fire_at) {
        Ok(handle) => {
            tracing::debug!(task_id = %task.id, fire_at = %fire_at, handle = ?handle, "reminder scheduled");
        }
        Err(err) => {
            tracing::warn!(task_id = %task.id, error = %err, "failed to schedule reminder");
        }
    }
}

fn cancel_reminder(scheduler: &mut dyn NotificationScheduler, task_id: &str) {
    if let Err(err) = scheduler.cancel(task_id) {
        tracing::warn!(task_id = %task_id, error = %err, "failed to cancel reminder");
    }
}
