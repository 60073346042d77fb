use crate::config::{EngineConfig, StorageKind};
use crate::error::AppError;
use std::path::PathBuf;

pub mod codec;
mod fallback;
mod file_store;
mod memory;

pub use fallback::FallbackStore;
pub use file_store::FileStore;
pub use memory::MemoryStore;

const STORE_DIR_ENV_VAR: &str = "TODOAPP_STORE_DIR";

/// Durable key-value storage the repository writes through.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError>;

    fn remove(&mut self, key: &str) -> Result<(), AppError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        (**self).remove(key)
    }
}

pub fn default_store_dir() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_DIR_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| AppError::persistence("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("todoapp"))
    } else {
        let home =
            std::env::var("HOME").map_err(|_| AppError::persistence("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join("todoapp"))
    }
}

pub fn store_from_config(config: &EngineConfig) -> Result<Box<dyn KeyValueStore>, AppError> {
    let dir = || match config.store_dir.as_ref() {
        Some(dir) => Ok(dir.clone()),
        None => default_store_dir(),
    };

    let store: Box<dyn KeyValueStore> = match config.storage {
        StorageKind::Memory => Box::new(MemoryStore::default()),
        StorageKind::File => Box::new(FileStore::new(dir()?)),
        StorageKind::Fallback => match dir() {
            Ok(dir) => Box::new(FallbackStore::new(FileStore::new(dir))),
            Err(err) => {
                tracing::warn!(error = %err, "no store directory, keeping data in memory");
                Box::new(MemoryStore::default())
            }
        },
    };
    tracing::debug!(storage = ?config.storage, "persistence gateway selected");
    Ok(store)
}
