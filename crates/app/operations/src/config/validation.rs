//! Configuration validation.
//!
//! Validates configuration and collects all errors before returning,
//! enabling users to fix multiple issues in a single iteration.

use evmd_math::Dec;

use crate::config::types::{AnteConfig, ConsumerConfig, EvmConfig, ObservabilityConfig, PoaConfig};
use crate::errors::ConfigError;

const VALID_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "warning", "error"];
const VALID_FORMATS: [&str; 4] = ["json", "pretty", "text", "human"];

/// Validate the entire policy file.
pub fn validate_config(config: &AnteConfig) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    validate_poa_config(&config.poa, &mut errors);
    validate_evm_config(&config.evm, &mut errors);
    if config.wasm.simulation_gas_limit == Some(0) {
        errors.push("wasm.simulation_gas_limit must be positive when set".to_string());
    }
    validate_consumer_config(&config.consumer, &mut errors);
    validate_observability_config(&config.observability, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationFailed(errors))
    }
}

fn parse_rate(field: &str, value: &str, errors: &mut Vec<String>) -> Option<Dec> {
    match value.parse::<Dec>() {
        Ok(rate) => Some(rate),
        Err(e) => {
            errors.push(format!("poa.{field} '{value}' is not a decimal: {e}"));
            None
        }
    }
}

fn validate_poa_config(config: &PoaConfig, errors: &mut Vec<String>) {
    let floor = parse_rate("commission_floor", &config.commission_floor, errors);
    let ceil = parse_rate("commission_ceil", &config.commission_ceil, errors);

    if let Some(ceil) = ceil {
        if ceil > Dec::ONE {
            errors.push(format!("poa.commission_ceil {ceil} must be at most 1"));
        }
        if let Some(floor) = floor.filter(|floor| *floor > ceil) {
            errors.push(format!(
                "poa.commission_floor {floor} exceeds poa.commission_ceil {ceil}"
            ));
        }
    }
}

fn validate_type_urls(section: &str, urls: &[String], errors: &mut Vec<String>) {
    for url in urls {
        if !url.starts_with('/') || url.len() < 2 {
            errors.push(format!("{section} entry '{url}' must be a type URL starting with '/'"));
        }
    }
}

fn validate_evm_config(config: &EvmConfig, errors: &mut Vec<String>) {
    validate_type_urls("evm.authz_disabled_msg_types", &config.authz_disabled_msg_types, errors);
}

fn validate_consumer_config(config: &ConsumerConfig, errors: &mut Vec<String>) {
    validate_type_urls(
        "consumer.disabled_module_prefixes",
        &config.disabled_module_prefixes,
        errors,
    );
    validate_type_urls(
        "consumer.legacy_proposal_whitelist",
        &config.legacy_proposal_whitelist,
        errors,
    );
    validate_type_urls(
        "consumer.proposal_msg_whitelist",
        &config.proposal_msg_whitelist,
        errors,
    );
}

fn validate_observability_config(config: &ObservabilityConfig, errors: &mut Vec<String>) {
    if !VALID_LEVELS.contains(&config.log_level.to_lowercase().as_str()) {
        errors.push(format!(
            "observability.log_level '{}' is invalid. Valid levels: trace, debug, info, warn, error",
            config.log_level
        ));
    }

    if !VALID_FORMATS.contains(&config.log_format.to_lowercase().as_str()) {
        errors.push(format!(
            "observability.log_format '{}' is invalid. Valid formats: json, pretty",
            config.log_format
        ));
    }
}
