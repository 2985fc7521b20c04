//! Structured logging through `tracing-subscriber`.
//!
//! `RUST_LOG` takes precedence over the configured level, so a single
//! decorator's target can be turned up without touching the policy file.

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::ObservabilityConfig;
use crate::errors::StartupError;

/// Log format for output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// JSON format for machine parsing (production).
    #[default]
    Json,
    /// Human-readable format (development).
    Pretty,
}

impl std::str::FromStr for LogFormat {
    type Err = std::convert::Infallible;

    /// Parse from string, case-insensitive. Defaults to Json for unknown values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "pretty" | "text" | "human" => Self::Pretty,
            _ => Self::Json,
        })
    }
}

/// Parse log level from string. Unknown values fall back to info.
pub fn parse_level(s: &str) -> Level {
    match s.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber.
///
/// Fails if a subscriber is already installed, e.g. by a test harness.
pub fn init_logging(level: Level, format: LogFormat) -> Result<(), StartupError> {
    let builder = fmt().with_env_filter(env_filter(level)).with_target(true);
    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| StartupError::Logging(e.to_string()))
}

/// [`init_logging`] with level and format taken from the policy file.
pub fn init_logging_from_config(config: &ObservabilityConfig) -> Result<(), StartupError> {
    let format: LogFormat = config.log_format.parse().unwrap_or_default();
    init_logging(parse_level(&config.log_level), format)
}
