use crate::error::AppError;
use crate::model::{ColorScheme, TaskDraft};
use crate::reminder::PastReminderPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TODOAPP_CONFIG_PATH";

pub const DEFAULT_CATEGORIES: [&str; 10] = [
    "Personal", "Work", "Shopping", "Grocery", "Health", "Finance", "Family", "Learning", "Travel",
    "Priority",
];
pub const DEFAULT_CATEGORY: &str = "Personal";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    File,
    Memory,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub categories: Vec<String>,
    pub default_category: String,
    pub storage: StorageKind,
    pub store_dir: Option<PathBuf>,
    pub past_reminders: PastReminderPolicy,
    pub color_scheme: Option<String>,
    pub log: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            categories: DEFAULT_CATEGORIES.iter().map(|name| name.to_string()).collect(),
            default_category: DEFAULT_CATEGORY.to_string(),
            storage: StorageKind::default(),
            store_dir: None,
            past_reminders: PastReminderPolicy::default(),
            color_scheme: None,
            log: None,
        }
    }
}

impl EngineConfig {
    pub fn default_color_scheme(&self) -> ColorScheme {
        self.color_scheme
            .as_deref()
            .map(canonical_color_scheme)
            .unwrap_or_default()
    }

    pub fn is_known_category(&self, name: &str) -> bool {
        self.categories.iter().any(|category| category == name)
    }

    /// Blank draft for a new task, pre-filled with the configured default category.
    pub fn draft<T: Into<String>>(&self, title: T) -> TaskDraft {
        TaskDraft {
            category: self.resolve_category(Some(&self.default_category)),
            ..TaskDraft::new(title)
        }
    }

    /// Trims a user-entered category; blank means "no category".
    pub fn resolve_category(&self, raw: Option<&str>) -> Option<String> {
        raw.map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: EngineConfig,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub categories: Vec<String>,
    pub default_category: Option<String>,
    pub storage: Option<StorageKind>,
    pub store_dir: Option<PathBuf>,
    pub past_reminders: Option<PastReminderPolicy>,
    pub color_scheme: Option<String>,
    pub log: Option<String>,
}

/// Maps free-form scheme names onto the three supported schemes.
pub fn canonical_color_scheme(raw: &str) -> ColorScheme {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    match cleaned.trim_matches('_') {
        "light" | "day" | "default" | "vanilla" | "light_mode" => ColorScheme::Light,
        "dark" | "night" | "noir" | "dark_mode" | "darkmode" => ColorScheme::Dark,
        _ => ColorScheme::Auto,
    }
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata = std::env::var("APPDATA")
            .map_err(|_| AppError::persistence("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("todoapp")
            .join(CONFIG_FILE_NAME))
    } else {
        let home =
            std::env::var("HOME").map_err(|_| AppError::persistence("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("todoapp")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config() -> Result<EngineConfig, AppError> {
    let path = config_path()?;
    load_config_from_path(&path)
}

pub fn load_config_with_fallback() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: EngineConfig::default(),
            error: Some(err),
        },
    }
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: EngineConfig::default(),
            error: None,
        };
    }

    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "ignoring config file");
            ConfigLoad {
                config: EngineConfig::default(),
                error: Some(err),
            }
        }
    }
}

fn load_config_from_path(path: &Path) -> Result<EngineConfig, AppError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::persistence(format!("{}: {}", path.display(), err)))?;
    let config = serde_json::from_str(&content)
        .map_err(|err| AppError::parse(format!("invalid JSON in {}: {}", path.display(), err)))?;
    Ok(normalize_config(config))
}

fn normalize_config(mut config: EngineConfig) -> EngineConfig {
    let mut categories: Vec<String> = Vec::with_capacity(config.categories.len());
    for name in config.categories.drain(..) {
        let trimmed = name.trim();
        if !trimmed.is_empty() && !categories.iter().any(|seen| seen == trimmed) {
            categories.push(trimmed.to_string());
        }
    }
    config.categories = categories;

    let default_category = config.default_category.trim();
    config.default_category = if default_category.is_empty() {
        DEFAULT_CATEGORY.to_string()
    } else {
        default_category.to_string()
    };
    config
}

pub fn merge_overrides(base: &EngineConfig, overrides: &ConfigOverrides) -> EngineConfig {
    let mut merged = base.clone();
    merged.categories.extend(overrides.categories.iter().cloned());
    if let Some(category) = overrides.default_category.as_ref() {
        merged.default_category = category.clone();
    }
    if let Some(storage) = overrides.storage {
        merged.storage = storage;
    }
    if let Some(store_dir) = overrides.store_dir.as_ref() {
        merged.store_dir = Some(store_dir.clone());
    }
    if let Some(policy) = overrides.past_reminders {
        merged.past_reminders = policy;
    }
    if let Some(scheme) = overrides.color_scheme.as_ref() {
        merged.color_scheme = Some(scheme.clone());
    }
    if let Some(log) = overrides.log.as_ref() {
        merged.log = Some(log.clone());
    }

    normalize_config(merged)
}

#[cfg(test)]
mod tests {
    use super::{
        ConfigOverrides, DEFAULT_CATEGORY, EngineConfig, StorageKind, canonical_color_scheme,
        load_config_from_path, load_config_with_fallback_from_path, merge_overrides,
    };
    use crate::model::ColorScheme;
    use crate::reminder::PastReminderPolicy;
    use std::fs;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("todoapp-{nanos}-{file_name}"))
    }

    #[test]
    fn load_config_missing_returns_defaults_without_error() {
        let path = temp_path("missing-config.json");
        let result = load_config_with_fallback_from_path(&path);

        assert_eq!(result.config, EngineConfig::default());
        assert!(result.error.is_none());
    }

    #[test]
    fn load_config_invalid_returns_defaults_and_error() {
        let path = temp_path("invalid-config.json");
        fs::write(&path, "{ invalid json ").unwrap();

        let result = load_config_with_fallback_from_path(&path);
        fs::remove_file(&path).ok();

        assert_eq!(result.config, EngineConfig::default());
        assert_eq!(result.error.unwrap().code(), "parse");
    }

    #[test]
    fn load_config_reads_valid_file() {
        let path = temp_path("valid-config.json");
        let content = serde_json::json!({
            "categories": ["Work", " Errands ", "Work", ""],
            "storage": "fallback",
            "past_reminders": "fire_immediately",
            "color_scheme": "Dark Mode"
        });
        fs::write(&path, serde_json::to_string(&content).unwrap()).unwrap();

        let loaded = load_config_from_path(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.categories, vec!["Work", "Errands"]);
        assert_eq!(loaded.default_category, DEFAULT_CATEGORY);
        assert_eq!(loaded.storage, StorageKind::Fallback);
        assert_eq!(loaded.past_reminders, PastReminderPolicy::FireImmediately);
        assert_eq!(loaded.default_color_scheme(), ColorScheme::Dark);
    }

    #[test]
    fn merge_overrides_layers_values_without_touching_base() {
        let base = EngineConfig::default();
        let overrides = ConfigOverrides {
            categories: vec!["Garden".into(), "Work".into()],
            storage: Some(StorageKind::Memory),
            color_scheme: Some("light".into()),
            ..ConfigOverrides::default()
        };

        let merged = merge_overrides(&base, &overrides);

        assert_eq!(base.storage, StorageKind::File);
        assert!(!base.is_known_category("Garden"));
        assert_eq!(merged.storage, StorageKind::Memory);
        assert!(merged.is_known_category("Garden"));
        assert_eq!(
            merged.categories.iter().filter(|name| *name == "Work").count(),
            1
        );
        assert_eq!(merged.default_color_scheme(), ColorScheme::Light);
    }

    #[test]
    fn merge_overrides_with_empty_overrides_returns_clone() {
        let base = EngineConfig::default();

        assert_eq!(merge_overrides(&base, &ConfigOverrides::default()), base);
    }

    #[test]
    fn canonical_color_scheme_maps_variants() {
        assert_eq!(canonical_color_scheme("Dark Mode"), ColorScheme::Dark);
        assert_eq!(canonical_color_scheme("night"), ColorScheme::Dark);
        assert_eq!(canonical_color_scheme("Day"), ColorScheme::Light);
        assert_eq!(canonical_color_scheme("system"), ColorScheme::Auto);
        assert_eq!(canonical_color_scheme("  "), ColorScheme::Auto);
    }

    #[test]
    fn resolve_category_trims_and_drops_blank() {
        let config = EngineConfig::default();

        assert_eq!(
            config.resolve_category(Some("  Work ")),
            Some("Work".to_string())
        );
        assert_eq!(config.resolve_category(Some("   ")), None);
        assert_eq!(config.resolve_category(None), None);
    }

    #[test]
    fn draft_uses_configured_default_category() {
        let config = merge_overrides(
            &EngineConfig::default(),
            &ConfigOverrides {
                default_category: Some(" Errands ".into()),
                ..ConfigOverrides::default()
            },
        );

        let draft = config.draft("buy stamps");

        assert_eq!(draft.title, "buy stamps");
        assert_eq!(draft.category.as_deref(), Some("Errands"));
        assert_eq!(
            EngineConfig::default().draft("x").category.as_deref(),
            Some(DEFAULT_CATEGORY)
        );
    }
}
