//! Operations layer for the evmd ante handler.
//!
//! - **Config**: YAML policy file with fail-fast validation
//! - **Observability**: `tracing-subscriber` setup, JSON or pretty
//! - **Startup**: overlaying the policy onto host-supplied capabilities and
//!   building the handler
//!
//! # Example
//!
//! ```no_run
//! use evmd_ante::HandlerOptions;
//! use evmd_operations::{config::load_config, init_logging_from_config, run_startup_sequence};
//!
//! fn start(capabilities: HandlerOptions) -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("ante.yaml")?;
//!     init_logging_from_config(&config.observability)?;
//!
//!     let startup = run_startup_sequence(&config, capabilities)?;
//!     for warning in &startup.warnings {
//!         eprintln!("Warning: {}", warning);
//!     }
//!     let _handler = startup.handler;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod errors;
pub mod observability;
pub mod startup;

pub use config::{load_config, AnteConfig, ObservabilityConfig};
pub use errors::{ConfigError, StartupError};
pub use observability::{init_logging, init_logging_from_config, parse_level, LogFormat};
pub use startup::{apply_config, build_ante_handler, run_startup_sequence, StartupResult};
