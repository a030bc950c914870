//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::store::StoreOptions;

/// Database file used when nothing else is configured
pub const DEFAULT_DATABASE: &str = "tags.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yml::Error,
    },
}

/// tagdb configuration with layered hierarchy
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path of the tags database
    pub database: Option<PathBuf>,

    /// How long a blocked write waits on a locked database
    pub busy_timeout_ms: Option<u64>,

    /// Result-size ceiling for every multi-row query
    pub search_limit: Option<usize>,

    /// Match names case-sensitively
    pub case_sensitive: Option<bool>,

    pub use_cache: Option<bool>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order.
    ///
    /// An explicit `config_file` must exist and parse; the global user
    /// config is skipped when unreadable.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        // 1. Built-in defaults (applied by the accessors)

        // 2. Global user config (~/.config/tagdb/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                match Self::load_from(&global_path) {
                    Ok(global) => config.merge(global),
                    Err(err) => tracing::warn!("ignoring global config: {}", err),
                }
            }
        }

        // 3. Explicit config file
        if let Some(path) = config_file {
            config.merge(Self::load_from(path)?);
        }

        // 4. Environment variables
        config.merge(Self::from_env());

        Ok(config)
    }

    /// Parse a single YAML config file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(database) = std::env::var("TAGDB_DATABASE") {
            if !database.is_empty() {
                config.database = Some(PathBuf::from(database));
            }
        }
        if let Ok(limit) = std::env::var("TAGDB_SEARCH_LIMIT") {
            match limit.parse() {
                Ok(limit) => config.search_limit = Some(limit),
                Err(_) => tracing::warn!("ignoring invalid TAGDB_SEARCH_LIMIT: {}", limit),
            }
        }
        if let Ok(flag) = std::env::var("TAGDB_CASE_SENSITIVE") {
            config.case_sensitive = Some(matches!(
                flag.to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ));
        }
        config
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "tagdb")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.busy_timeout_ms.is_some() {
            self.busy_timeout_ms = other.busy_timeout_ms;
        }
        if other.search_limit.is_some() {
            self.search_limit = other.search_limit;
        }
        if other.case_sensitive.is_some() {
            self.case_sensitive = other.case_sensitive;
        }
        if other.use_cache.is_some() {
            self.use_cache = other.use_cache;
        }
    }

    /// Get the database path, falling back to `tags.db` in the working directory
    pub fn database(&self) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    }

    /// Session options with built-in defaults for anything unset
    pub fn store_options(&self) -> StoreOptions {
        let defaults = StoreOptions::default();
        StoreOptions {
            busy_timeout_ms: self.busy_timeout_ms.unwrap_or(defaults.busy_timeout_ms),
            search_limit: self.search_limit.unwrap_or(defaults.search_limit).max(1),
            case_sensitive: self.case_sensitive.unwrap_or(defaults.case_sensitive),
            use_cache: self.use_cache.unwrap_or(defaults.use_cache),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database(), PathBuf::from(DEFAULT_DATABASE));
        assert_eq!(config.store_options(), StoreOptions::default());
    }

    #[test]
    fn test_load_from_yaml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(
            &path,
            "database: /tmp/project.tags.db\nsearch_limit: 40\ncase_sensitive: true\n",
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.database(), PathBuf::from("/tmp/project.tags.db"));

        let options = config.store_options();
        assert_eq!(options.search_limit, 40);
        assert!(options.case_sensitive);
        assert_eq!(options.busy_timeout_ms, 10);
        assert!(options.use_cache);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = Config {
            search_limit: Some(10),
            use_cache: Some(false),
            ..Default::default()
        };
        base.merge(Config {
            search_limit: Some(20),
            ..Default::default()
        });
        assert_eq!(base.search_limit, Some(20));
        assert_eq!(base.use_cache, Some(false));
    }

    #[test]
    fn test_zero_search_limit_is_clamped() {
        let config = Config {
            search_limit: Some(0),
            ..Default::default()
        };
        assert_eq!(config.store_options().search_limit, 1);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.yaml");
        std::fs::write(&path, "search_limit: [not, a, number]\n").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            Config::load_from(&tmp.path().join("missing.yaml")),
            Err(ConfigError::Read { .. })
        ));
    }
}
