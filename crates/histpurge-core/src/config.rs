//! Configuration management for HistPurge
//!
//! Strongly-typed TOML configuration. Every section is optional; missing
//! keys take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::filter::VisitFilter;
use crate::storage::{JsonFileStorage, MemoryStorage, StateStorage};
use crate::store::PatternStore;

/// Log levels accepted in `logging.level`
pub const LOG_LEVELS: &[&str] = &["error", "warn", "info", "debug", "trace"];

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the blacklist record lives
    pub storage: StorageConfig,

    /// Visit filter settings
    pub filter: FilterConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::ConfigNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(Error::from)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.storage.backend == StorageBackend::File && self.storage.path.trim().is_empty() {
            return Err(Error::config_value(
                "storage.path",
                "Must not be empty for the file backend",
            ));
        }

        let level = self.logging.level.to_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(Error::config_value(
                "logging.level",
                format!("Unknown level '{}', expected one of {}", self.logging.level, LOG_LEVELS.join(", ")),
            ));
        }

        Ok(())
    }

    /// Open the configured storage backend
    pub fn open_storage(&self) -> Arc<dyn StateStorage> {
        match self.storage.backend {
            StorageBackend::File => Arc::new(JsonFileStorage::new(&self.storage.path)),
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        }
    }

    /// Pattern store over the configured backend
    pub fn build_store(&self) -> PatternStore {
        PatternStore::new(self.open_storage())
    }

    /// Visit filter with the configured caching
    pub fn build_filter(&self) -> VisitFilter {
        VisitFilter::with_cache(self.filter.cache_patterns)
    }
}

/// Storage backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// JSON record on disk
    #[default]
    File,
    /// Volatile, lost on exit
    Memory,
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend kind
    pub backend: StorageBackend,
    /// Record path for the file backend
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: "histpurge.json".to_string(),
        }
    }
}

/// Visit filter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Keep compiled patterns between visits
    pub cache_patterns: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cache_patterns: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,
    /// Log file path (None = stderr only)
    pub file: Option<String>,
    /// Enable JSON format logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json_format: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert_eq!(config.storage.path, "histpurge.json");
        assert!(config.filter.cache_patterns);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        config.logging.json_format = true;

        let parsed = Config::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_toml_parse_minimal() {
        let config = Config::from_toml("[storage]\npath = \"/tmp/x.json\"\n").unwrap();
        assert_eq!(config.storage.path, "/tmp/x.json");
        assert_eq!(config.storage.backend, StorageBackend::File);
        assert!(config.filter.cache_patterns);
    }

    #[test]
    fn test_toml_parse_invalid() {
        assert!(Config::from_toml("[storage\npath = 1").is_err());
        assert!(Config::from_toml("[storage]\nbackend = \"redis\"").is_err());
    }

    #[test]
    fn test_validation_empty_path() {
        let mut config = Config::default();
        config.storage.path = "  ".into();
        assert!(config.validate().is_err());

        config.storage.backend = StorageBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_log_level() {
        let mut config = Config::default();
        config.logging.level = "DEBUG".into();
        assert!(config.validate().is_ok());

        config.logging.level = "loud".into();
        assert!(config.validate().is_err());
    }
}
