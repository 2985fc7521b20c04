//! Error types for the operations crate.

use evmd_ante::error::SetupError;
use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File I/O error when loading config.
    #[error("failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },

    /// YAML parsing error.
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },

    /// Validation failed with one or more errors.
    #[error("config validation failed:\n{}", .0.join("\n"))]
    ValidationFailed(Vec<String>),
}

/// Startup-related errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The handler options or decorator layout were rejected.
    #[error("ante handler setup failed: {0}")]
    Setup(#[from] SetupError),

    /// A global logging subscriber was already installed.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
