use crate::error::AppError;
use crate::storage::KeyValueStore;
use std::path::PathBuf;

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(key)))
    }
}

fn file_stem(key: &str) -> String {
    let stem: String = key
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = stem.trim_matches('_');
    if trimmed.is_empty() {
        "store".to_string()
    } else {
        trimmed.to_string()
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .map_err(|err| AppError::persistence(format!("{}: {}", path.display(), err)))?;
        Ok(Some(content))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), AppError> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|err| AppError::persistence(format!("{}: {}", self.dir.display(), err)))?;

        let path = self.path_for(key);
        std::fs::write(&path, value)
            .map_err(|err| AppError::persistence(format!("{}: {}", path.display(), err)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, permissions)
                .map_err(|err| AppError::persistence(err.to_string()))?;
        }

        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), AppError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(());
        }
        std::fs::remove_file(&path)
            .map_err(|err| AppError::persistence(format!("{}: {}", path.display(), err)))
    }
}

#[cfg(test)]
mod tests {
    use super::FileStore;
    use crate::storage::KeyValueStore;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("todoapp-{nanos}-{name}"))
    }

    #[test]
    fn missing_key_reads_as_none() {
        let store = FileStore::new(temp_dir("missing"));

        assert_eq!(store.get("@todos").unwrap(), None);
    }

    #[test]
    fn set_get_remove_round_trip() {
        let dir = temp_dir("round-trip");
        let mut store = FileStore::new(&dir);

        store.set("@todos", "[1,2]").unwrap();
        let loaded = store.get("@todos").unwrap();
        store.remove("@todos").unwrap();
        let after_remove = store.get("@todos").unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded.as_deref(), Some("[1,2]"));
        assert_eq!(after_remove, None);
    }

    #[test]
    fn keys_map_to_safe_file_names() {
        let store = FileStore::new("/tmp/todoapp");

        assert_eq!(
            store.path_for("@todos"),
            PathBuf::from("/tmp/todoapp/todos.json")
        );
        assert_eq!(
            store.path_for("../escape"),
            PathBuf::from("/tmp/todoapp/escape.json")
        );
    }

    #[test]
    fn removing_missing_key_is_ok() {
        let mut store = FileStore::new(temp_dir("remove-missing"));

        assert!(store.remove("@settings").is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn written_files_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = temp_dir("perms");
        let mut store = FileStore::new(&dir);
        store.set("@todos", "[]").unwrap();
        let mode = std::fs::metadata(store.path_for("@todos"))
            .unwrap()
            .permissions()
            .mode();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(mode & 0o777, 0o600);
    }
}
