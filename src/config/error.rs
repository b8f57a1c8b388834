//! Error types for configuration parsing and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for configuration operations.
///
/// Covers errors from parsing, validation, and file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file '{}': {source}", path.display())]
    FileRead {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("Failed to parse TOML config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Failed to write configuration file (for init command).
    #[error("Failed to write config file '{}': {source}", path.display())]
    FileWrite {
        /// Path to the config file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Missing required field that must be provided by CLI, environment or config file.
    #[error("Missing required field: {field}. {hint}")]
    MissingRequired {
        /// Name of the missing field
        field: &'static str,
        /// Hint for how to provide the value
        hint: &'static str,
    },

    /// Invalid destination URL.
    #[error("Invalid URL '{url}' for {field}: {reason}")]
    InvalidUrl {
        /// Name of the field
        field: &'static str,
        /// The invalid URL string
        url: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Invalid relay mode value.
    #[error("Invalid relay mode '{value}': expected fan-out or retention")]
    InvalidMode {
        /// The invalid value provided
        value: String,
    },

    /// Invalid listen port.
    #[error("Invalid port {value}: must be greater than 0")]
    InvalidPort {
        /// The invalid value provided
        value: u16,
    },

    /// Invalid bind address.
    #[error("Invalid bind address '{value}': {reason}")]
    InvalidBind {
        /// The invalid value provided
        value: String,
        /// Reason for invalidity
        reason: String,
    },
}

/// Well-known field names for `MissingRequired` and `InvalidUrl` errors.
///
/// Use these constants for compile-time safety when matching field names.
pub mod field {
    /// The primary destination URL field.
    pub const PRODUCTION_URL: &str = "production_url";
    /// The secondary destination list.
    pub const SECONDARIES: &str = "secondaries";
    /// The poll secret field.
    pub const POLL_SECRET: &str = "poll_secret";
}

impl ConfigError {
    /// Creates a `MissingRequired` error for a required field.
    #[must_use]
    pub const fn missing(field: &'static str, hint: &'static str) -> Self {
        Self::MissingRequired { field, hint }
    }
}
