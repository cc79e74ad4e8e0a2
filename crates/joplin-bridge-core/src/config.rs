//! Persisted config (storage root, folder layout) in the app data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_data;
use crate::repository::DEFAULT_FOLDER_TEMPLATE;

const CONFIG_FILENAME: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Local directory holding every user's files (e.g. a Nextcloud data dir).
    pub storage_root: Option<String>,
    /// Storage path of a user's Joplin folder; `{user}` is replaced by the user id.
    pub folder_template: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: None,
            folder_template: DEFAULT_FOLDER_TEMPLATE.to_string(),
        }
    }
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    let Some(data_dir) = app_data::app_data_dir() else {
        return Config::default();
    };
    load_config_from(&data_dir.join(CONFIG_FILENAME))
}

/// Load config from `path`. Returns default config if missing or invalid.
pub fn load_config_from(path: &Path) -> Config {
    let Ok(s) = std::fs::read_to_string(path) else {
        return Config::default();
    };
    toml::from_str(&s).unwrap_or_else(|e| {
        log::warn!(
            "event=config_invalid module=config status=error path={} error={}",
            path.display(),
            e.message()
        );
        Config::default()
    })
}

/// Save config to the app data directory.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let data_dir = app_data::app_data_dir().ok_or(ConfigError::NoDataDir)?;
    save_config_to(&data_dir.join(CONFIG_FILENAME), config)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<(), ConfigError> {
    let s = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    std::fs::write(path, s).map_err(ConfigError::Write)
}

/// Get the configured storage root, if any.
pub fn get_storage_root() -> Option<PathBuf> {
    load_config()
        .storage_root
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Set and persist the storage root.
pub fn set_storage_root(path: &Path) -> Result<(), ConfigError> {
    let path = canonical_dir(path)?;
    let mut config = load_config();
    config.storage_root = Some(path.to_string_lossy().into_owned());
    save_config(&config)
}

fn canonical_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let path = path.canonicalize().map_err(ConfigError::Canonicalize)?;
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path));
    }
    Ok(path)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
    #[error("failed to resolve path: {0}")]
    Canonicalize(std::io::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
