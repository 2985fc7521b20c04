//! Startup assembly: policy file + capabilities -> ante handler.

use std::path::Path;

use evmd_ante::options::HandlerOptions;
use evmd_ante::AnteHandler;
use tracing::{info, warn};

use crate::config::{load_config, AnteConfig};
use crate::errors::StartupError;

/// The assembled handler.
pub struct StartupResult {
    pub handler: AnteHandler,
    /// Non-fatal issues, e.g. settings for a module that is not enabled.
    /// These are already logged.
    pub warnings: Vec<String>,
}

impl std::fmt::Debug for StartupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupResult")
            .field("steps", &self.handler.standard_steps())
            .field("warnings", &self.warnings)
            .finish()
    }
}

/// Overlay the policy file onto capability handles supplied by the host.
///
/// Module toggles, policy parameters and the wasm config come from
/// `config`; the keepers stay as given. Returns warnings for settings that
/// have no effect under the enabled modules.
pub fn apply_config(
    mut options: HandlerOptions,
    config: &AnteConfig,
) -> Result<(HandlerOptions, Vec<String>), StartupError> {
    let modules = config.modules.module_set();
    options.modules = modules;
    options.policy = config.policy_params()?;
    options.wasm_config = Some(config.wasm_config());

    let mut warnings = Vec::new();
    if !modules.evm && config.evm.max_tx_gas_wanted != 0 {
        warnings.push("evm.max_tx_gas_wanted is set but the evm module is disabled".to_string());
    }
    if !modules.wasm && config.wasm.simulation_gas_limit.is_some() {
        warnings
            .push("wasm.simulation_gas_limit is set but the wasm module is disabled".to_string());
    }
    if !modules.poa && config.poa.validate_gentx_rates {
        warnings.push("poa.validate_gentx_rates is set but the poa module is disabled".to_string());
    }
    for warning in &warnings {
        warn!("{warning}");
    }
    Ok((options, warnings))
}

/// Apply `config` to `capabilities`, validate, and build both chains.
pub fn run_startup_sequence(
    config: &AnteConfig,
    capabilities: HandlerOptions,
) -> Result<StartupResult, StartupError> {
    let (options, warnings) = apply_config(capabilities, config)?;
    let handler = AnteHandler::new(options)?;
    info!(
        modules = ?config.modules.module_set(),
        warnings = warnings.len(),
        "ante handler ready"
    );
    Ok(StartupResult { handler, warnings })
}

/// [`run_startup_sequence`] with the policy read from a YAML file.
pub fn build_ante_handler<P: AsRef<Path>>(
    path: P,
    capabilities: HandlerOptions,
) -> Result<StartupResult, StartupError> {
    let config = load_config(path)?;
    run_startup_sequence(&config, capabilities)
}
