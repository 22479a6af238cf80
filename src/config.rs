//! Configuration Module
//!
//! Client settings come from three layers: built-in defaults, the saved
//! preferences file (`~/.vocastats/config.json`) and `VOCASTATS_*`
//! environment variables, each overriding the one before.

use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::api::{FetchSettings, DEFAULT_BASE_URL, DEFAULT_TOP_HOURS};
use crate::pagination::DEFAULT_PAGE_SIZE;

/// Directory under the home directory that holds the preferences file
pub const CONFIG_DIR_NAME: &str = ".vocastats";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Cache lifetime used when neither file nor environment sets one
const DEFAULT_CACHE_MINUTES: u64 = 5;

// == Config Error ==
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown config key: {0} (known keys: pageSize, cacheMinutes)")]
    UnknownKey(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

// == Preferences ==
/// User preferences persisted between runs.
///
/// Keys missing from the file keep their defaults. Keys this client does not
/// read are carried along so that saving never drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub page_size: usize,
    pub cache_minutes: u64,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            cache_minutes: DEFAULT_CACHE_MINUTES,
            other: Map::new(),
        }
    }
}

impl Preferences {
    /// `~/.vocastats/config.json`, if a home directory is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads `path` merged over the defaults.
    ///
    /// A missing file gives the defaults. So does an unreadable or corrupt
    /// one, with a warning.
    pub fn load_from(path: &Path) -> Self {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no preferences file, using defaults");
                return Self::default();
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot read preferences file, using defaults");
                return Self::default();
            }
        };

        serde_json::from_str(&json).unwrap_or_else(|err| {
            warn!(path = %path.display(), error = %err, "corrupt preferences file, using defaults");
            Self::default()
        })
    }

    /// Writes the preferences as pretty JSON, creating the directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Value stored under `key`, including keys this client ignores.
    pub fn get(&self, key: &str) -> Option<Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut fields)) => fields.remove(key),
            _ => None,
        }
    }

    /// Parses and stores `value` under one of the known keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "pageSize" => {
                self.page_size = value
                    .trim()
                    .parse()
                    .ok()
                    .filter(|size: &usize| *size > 0)
                    .ok_or_else(|| invalid(key, value))?;
            }
            "cacheMinutes" => {
                self.cache_minutes = value.trim().parse().map_err(|_| invalid(key, value))?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

// == Config ==
/// Client configuration parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root of the VocaDB API
    pub api_url: String,
    /// Items per page in browsing sessions
    pub page_size: usize,
    /// Lifetime of cached results in seconds
    pub cache_ttl: u64,
    /// Cache entry bound, 0 for unbounded
    pub cache_max_entries: usize,
    /// Preferred title language
    pub language: String,
    /// Window of the top-rated listing in hours
    pub top_hours: u32,
    /// Per-request HTTP timeout in seconds
    pub timeout: u64,
}

impl Config {
    /// Defaults, then the preferences file, then the environment.
    pub fn load() -> Self {
        let preferences = Preferences::default_path()
            .map(|path| Preferences::load_from(&path))
            .unwrap_or_default();
        Self::from_preferences(&preferences).with_env_overrides()
    }

    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `VOCASTATS_API_URL` - API root (default: https://vocadb.net/api)
    /// - `VOCASTATS_PAGE_SIZE` - Page size (default: 20)
    /// - `VOCASTATS_CACHE_TTL` - Cache TTL in seconds (default: 300)
    /// - `VOCASTATS_CACHE_MAX_ENTRIES` - Cache bound (default: 0, unbounded)
    /// - `VOCASTATS_LANGUAGE` - Language preference (default: Romaji)
    /// - `VOCASTATS_TOP_HOURS` - Top-rated window (default: 168)
    /// - `VOCASTATS_TIMEOUT` - HTTP timeout in seconds (default: 30)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Defaults with the saved page size and cache lifetime applied.
    pub fn from_preferences(preferences: &Preferences) -> Self {
        let defaults = Self::default();
        Self {
            page_size: if preferences.page_size > 0 {
                preferences.page_size
            } else {
                defaults.page_size
            },
            cache_ttl: preferences.cache_minutes.saturating_mul(60),
            ..defaults
        }
    }

    /// Replaces every field whose variable is set and parses; anything else
    /// keeps the current value.
    fn with_env_overrides(self) -> Self {
        Self {
            api_url: env::var("VOCASTATS_API_URL")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(self.api_url),
            page_size: parse_var("VOCASTATS_PAGE_SIZE")
                .filter(|size| *size > 0)
                .unwrap_or(self.page_size),
            cache_ttl: parse_var("VOCASTATS_CACHE_TTL").unwrap_or(self.cache_ttl),
            cache_max_entries: parse_var("VOCASTATS_CACHE_MAX_ENTRIES")
                .unwrap_or(self.cache_max_entries),
            language: env::var("VOCASTATS_LANGUAGE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(self.language),
            top_hours: parse_var("VOCASTATS_TOP_HOURS").unwrap_or(self.top_hours),
            timeout: parse_var("VOCASTATS_TIMEOUT").unwrap_or(self.timeout),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// Capacity bound for the cache, if one is configured.
    pub fn cache_capacity(&self) -> Option<usize> {
        (self.cache_max_entries > 0).then_some(self.cache_max_entries)
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            language: self.language.clone(),
            cache_ttl: self.cache_ttl(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            cache_ttl: DEFAULT_CACHE_MINUTES * 60,
            cache_max_entries: 0,
            language: "Romaji".to_string(),
            top_hours: DEFAULT_TOP_HOURS,
            timeout: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    const VARS: [&str; 7] = [
        "VOCASTATS_API_URL",
        "VOCASTATS_PAGE_SIZE",
        "VOCASTATS_CACHE_TTL",
        "VOCASTATS_CACHE_MAX_ENTRIES",
        "VOCASTATS_LANGUAGE",
        "VOCASTATS_TOP_HOURS",
        "VOCASTATS_TIMEOUT",
    ];

    fn config_path(dir: &TempDir) -> PathBuf {
        dir.path().join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://vocadb.net/api");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
        assert_eq!(config.cache_capacity(), None);
        assert_eq!(config.language, "Romaji");
        assert_eq!(config.top_hours, 168);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    // Every env case lives in one test so they cannot race each other.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }
        assert_eq!(Config::from_env(), Config::default());

        env::set_var("VOCASTATS_PAGE_SIZE", "0");
        env::set_var("VOCASTATS_CACHE_TTL", "soon");
        env::set_var("VOCASTATS_CACHE_MAX_ENTRIES", "500");
        env::set_var("VOCASTATS_LANGUAGE", "English");
        env::set_var("VOCASTATS_TOP_HOURS", " 24 ");

        let config = Config::from_env();
        assert_eq!(config.page_size, 20);
        assert_eq!(config.cache_ttl, 300);
        assert_eq!(config.cache_capacity(), Some(500));
        assert_eq!(config.fetch_settings().language, "English");
        assert_eq!(config.top_hours, 24);

        // Environment beats the saved file, unparsable values do not
        let saved = Preferences {
            page_size: 50,
            cache_minutes: 10,
            ..Preferences::default()
        };
        env::set_var("VOCASTATS_PAGE_SIZE", "30");
        let layered = Config::from_preferences(&saved).with_env_overrides();
        assert_eq!(layered.page_size, 30);
        assert_eq!(layered.cache_ttl, 600);

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        assert_eq!(Preferences::load_from(&config_path(&dir)), Preferences::default());
    }

    #[test]
    fn test_file_is_merged_over_defaults() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = config_path(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "pageSize": 50, "theme": "miku" }"#).unwrap();

        let preferences = Preferences::load_from(&path);

        assert_eq!(preferences.page_size, 50);
        assert_eq!(preferences.cache_minutes, 5);
        assert_eq!(preferences.get("theme"), Some(json!("miku")));

        let config = Config::from_preferences(&preferences);
        assert_eq!(config.page_size, 50);
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_corrupt_file_gives_defaults() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = config_path(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(Preferences::load_from(&path), Preferences::default());
    }

    #[test]
    fn test_set_and_save_keep_unrelated_keys() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = config_path(&dir);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{ "theme": "teto" }"#).unwrap();

        let mut preferences = Preferences::load_from(&path);
        preferences.set("cacheMinutes", "15").unwrap();
        preferences.save_to(&path).unwrap();

        let reloaded = Preferences::load_from(&path);
        assert_eq!(reloaded.cache_minutes, 15);
        assert_eq!(reloaded.get("cacheMinutes"), Some(json!(15)));
        assert_eq!(reloaded.get("theme"), Some(json!("teto")));
    }

    #[test]
    fn test_save_creates_config_directory() {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let path = config_path(&dir);

        Preferences::default().save_to(&path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_set_rejects_bad_input() {
        let mut preferences = Preferences::default();

        assert!(matches!(
            preferences.set("pageSize", "0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            preferences.set("cacheMinutes", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            preferences.set("theme", "miku"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert_eq!(preferences, Preferences::default());
    }
}
