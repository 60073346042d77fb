use crate::error::AppError;
use crate::storage::{KeyValueStore, MemoryStore};

/// Writes through `primary`; when it fails the value lands in memory instead.
/// Reads prefer values held in memory, since those are newer than whatever
/// the primary failed to accept.
#[derive(Debug)]
pub struct FallbackStore<P> {
    primary: P,
    memory: MemoryStore,
}

impl<P: KeyValueStore> FallbackStore<P> {
    pub fn new(primary: P) -> Self {
        Self {
            primary,
            memory: MemoryStore::default(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.memory.is_empty()
    }
}

impl<P: KeyValueStore> KeyValueStore for FallbackStore<P> {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        if let Some(value) = self.memory.get(key)? {
            return Ok(Some(value));
        }
        match self.primary.get(key) {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "primary store read failed, using memory");
                Ok(None)
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        match self.primary.set(key, value) {
            Ok(()) => self.memory.remove(key),
            Err(err) => {
                tracing::warn!(key, error = %err, "primary store write failed, using memory");
                self.memory.set(key, value)
            }
        }
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        self.memory.remove(key)?;
        if let Err(err) = self.primary.remove(key) {
            tracing::warn!(key, error = %err, "primary store remove failed");
        }
        Ok(())
    }
}
