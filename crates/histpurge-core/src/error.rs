//! Error types for histpurge-core
//!
//! Centralized error handling using `thiserror` for ergonomic error definitions.
//!
//! Rejected user input (blank patterns, duplicates, unknown list modes) is not
//! an error here: store operations report it through their `bool`/count return
//! values. Only storage, configuration and protocol failures surface as `Error`.

use thiserror::Error;

/// Main error type for histpurge-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Backing storage could not be read or written
    #[error("Storage unavailable: {message}")]
    Storage {
        /// Detailed error message
        message: String,
    },

    /// State read back after a write differs from what was written
    #[error("Storage did not confirm the written state")]
    StorageConfirm,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// Path to the missing config file
        path: String,
    },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    ConfigValue {
        /// Configuration key
        key: String,
        /// Error message
        message: String,
    },

    /// Inbound message could not be decoded
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Pattern cannot be written to the comma-separated list format
    #[error("Pattern '{pattern}' contains a comma and cannot be exported as a list")]
    Export {
        /// Offending pattern
        pattern: String,
    },

    /// Host collaborator failed to delete a history entry
    #[error("Failed to purge '{address}': {message}")]
    Purge {
        /// Address that should have been purged
        address: String,
        /// Failure reason reported by the host
        message: String,
    },

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a config value error
    pub fn config_value(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValue {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a purge error
    pub fn purge(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Purge {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Whether the failure came from the persistence layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::StorageConfirm | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::storage("disk full");
        assert!(err.to_string().contains("disk full"));

        let err = Error::config_value("storage.path", "must not be empty");
        assert!(err.to_string().contains("storage.path"));
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_is_storage() {
        assert!(Error::storage("x").is_storage());
        assert!(Error::StorageConfirm.is_storage());
        assert!(!Error::Protocol("bad".into()).is_storage());
        assert!(!Error::purge("https://a", "denied").is_storage());
    }
}
