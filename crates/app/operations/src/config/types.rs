//! Policy file types for the ante handler.

use evmd_ante::keepers::WasmConfig;
use evmd_ante::options::{ModuleSet, PolicyParams};
use evmd_math::Dec;
use serde::Deserialize;

use crate::errors::ConfigError;

/// Root of the policy file. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnteConfig {
    /// Optional modules compiled into this build.
    #[serde(default)]
    pub modules: ModulesConfig,

    /// Permissioned validator-set rules.
    #[serde(default)]
    pub poa: PoaConfig,

    #[serde(default)]
    pub evm: EvmConfig,

    #[serde(default)]
    pub wasm: WasmSection,

    /// Consumer chain message rules.
    #[serde(default)]
    pub consumer: ConsumerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AnteConfig {
    /// Policy parameters for [`evmd_ante::HandlerOptions`].
    ///
    /// Fails only on rates that do not parse, which validation already
    /// reports.
    pub fn policy_params(&self) -> Result<PolicyParams, ConfigError> {
        let (commission_floor, commission_ceil) = self.poa.rates()?;
        Ok(PolicyParams {
            commission_floor,
            commission_ceil,
            validate_gentx_rates: self.poa.validate_gentx_rates,
            max_tx_gas_wanted: self.evm.max_tx_gas_wanted,
            disabled_module_prefixes: self.consumer.disabled_module_prefixes.clone(),
            authz_disabled_msg_types: self.evm.authz_disabled_msg_types.clone(),
            legacy_proposal_whitelist: self.consumer.legacy_proposal_whitelist.clone(),
            proposal_msg_whitelist: self.consumer.proposal_msg_whitelist.clone(),
        })
    }

    pub fn wasm_config(&self) -> WasmConfig {
        WasmConfig {
            simulation_gas_limit: self.wasm.simulation_gas_limit,
        }
    }
}

/// Which optional modules contribute decorators. All off by default.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModulesConfig {
    #[serde(default)]
    pub wasm: bool,
    #[serde(default)]
    pub evm: bool,
    #[serde(default)]
    pub consumer: bool,
    #[serde(default)]
    pub poa: bool,
}

impl ModulesConfig {
    pub fn module_set(&self) -> ModuleSet {
        ModuleSet {
            wasm: self.wasm,
            evm: self.evm,
            consumer: self.consumer,
            poa: self.poa,
        }
    }
}

/// Commission bounds are decimal strings, e.g. "0.10".
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoaConfig {
    #[serde(default = "PoaConfig::default_commission_floor")]
    pub commission_floor: String,

    #[serde(default = "PoaConfig::default_commission_ceil")]
    pub commission_ceil: String,

    /// Enforce the bounds on genesis transactions too.
    #[serde(default)]
    pub validate_gentx_rates: bool,
}

impl Default for PoaConfig {
    fn default() -> Self {
        Self {
            commission_floor: Self::default_commission_floor(),
            commission_ceil: Self::default_commission_ceil(),
            validate_gentx_rates: false,
        }
    }
}

impl PoaConfig {
    fn default_commission_floor() -> String {
        "0.10".to_string()
    }

    fn default_commission_ceil() -> String {
        "0.50".to_string()
    }

    /// Parsed `(floor, ceil)`.
    pub fn rates(&self) -> Result<(Dec, Dec), ConfigError> {
        let parse = |field: &str, value: &str| {
            value.parse::<Dec>().map_err(|e| {
                ConfigError::ValidationFailed(vec![format!(
                    "poa.{field} '{value}' is not a decimal: {e}"
                )])
            })
        };
        Ok((
            parse("commission_floor", &self.commission_floor)?,
            parse("commission_ceil", &self.commission_ceil)?,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvmConfig {
    /// Ceiling on gas wanted per EVM transaction. 0 disables it.
    #[serde(default)]
    pub max_tx_gas_wanted: u64,

    /// Message types that may not be granted or executed through authz.
    #[serde(default = "EvmConfig::default_authz_disabled_msg_types")]
    pub authz_disabled_msg_types: Vec<String>,
}

impl Default for EvmConfig {
    fn default() -> Self {
        Self {
            max_tx_gas_wanted: 0,
            authz_disabled_msg_types: Self::default_authz_disabled_msg_types(),
        }
    }
}

impl EvmConfig {
    fn default_authz_disabled_msg_types() -> Vec<String> {
        PolicyParams::default().authz_disabled_msg_types
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WasmSection {
    /// Gas ceiling for simulations. Unset falls back to the block gas limit.
    #[serde(default)]
    pub simulation_gas_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsumerConfig {
    /// Message type-URL prefixes rejected on the consumer chain.
    #[serde(default = "ConsumerConfig::default_disabled_module_prefixes")]
    pub disabled_module_prefixes: Vec<String>,

    #[serde(default = "ConsumerConfig::default_legacy_proposal_whitelist")]
    pub legacy_proposal_whitelist: Vec<String>,

    #[serde(default = "ConsumerConfig::default_proposal_msg_whitelist")]
    pub proposal_msg_whitelist: Vec<String>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            disabled_module_prefixes: Self::default_disabled_module_prefixes(),
            legacy_proposal_whitelist: Self::default_legacy_proposal_whitelist(),
            proposal_msg_whitelist: Self::default_proposal_msg_whitelist(),
        }
    }
}

impl ConsumerConfig {
    fn default_disabled_module_prefixes() -> Vec<String> {
        PolicyParams::default().disabled_module_prefixes
    }

    fn default_legacy_proposal_whitelist() -> Vec<String> {
        PolicyParams::default().legacy_proposal_whitelist
    }

    fn default_proposal_msg_whitelist() -> Vec<String> {
        PolicyParams::default().proposal_msg_whitelist
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservabilityConfig {
    /// Log level: trace, debug, info, warn, error. Default: info.
    #[serde(default = "ObservabilityConfig::default_log_level")]
    pub log_level: String,

    /// Log format: json or pretty. Default: json.
    #[serde(default = "ObservabilityConfig::default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
            log_format: Self::default_log_format(),
        }
    }
}

impl ObservabilityConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }

    fn default_log_format() -> String {
        "json".to_string()
    }
}
