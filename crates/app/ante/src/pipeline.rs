//! Decorator layouts for both pipeline variants.
//!
//! A layout lists every step a variant can contain, tagged with the optional
//! module that contributes it. Filtering by [`ModuleSet`] happens here, once,
//! so the chain builder only ever sees a finished list.

use crate::chain::{AnteDecorator, Step};
use crate::decorators::{
    dynamic_fee_extension_checker, AuthzLimiterDecorator, CircuitBreakerDecorator,
    CommissionLimitDecorator, ConsumeTxSizeGasDecorator, CountTxDecorator, DeductFeeDecorator,
    DisableStakingDecorator, DisableWithdrawRewardsDecorator, DisabledModulesDecorator,
    EvmMonoDecorator, ExtensionOptionsDecorator, ForbiddenProposalsDecorator, GasRegisterDecorator,
    GasWantedDecorator, IncrementSequenceDecorator, LimitSimulationGasDecorator,
    MinGasPriceDecorator, MsgFilterDecorator, RedundantRelayDecorator,
    RejectEthereumMessagesDecorator, SetPubKeyDecorator, SetUpContextDecorator,
    SigGasConsumeDecorator, SigVerificationDecorator, TxTimeoutHeightDecorator,
    ValidateBasicDecorator, ValidateMemoDecorator, ValidateSigCountDecorator,
};
use crate::error::SetupError;
use crate::options::{required, HandlerOptions, Module, ModuleSet};

/// Standard variant, in execution order.
pub const STANDARD_LAYOUT: &[(Step, Option<Module>)] = &[
    (Step::SetUpContext, None),
    (Step::RejectEthereumMessages, Some(Module::Evm)),
    (Step::AuthzLimiter, Some(Module::Evm)),
    (Step::MsgFilter, Some(Module::Consumer)),
    (Step::DisabledModules, Some(Module::Consumer)),
    (Step::ForbiddenProposals, Some(Module::Consumer)),
    (Step::LimitSimulationGas, Some(Module::Wasm)),
    (Step::CircuitBreaker, None),
    (Step::CountTx, Some(Module::Wasm)),
    (Step::GasRegister, Some(Module::Wasm)),
    (Step::ExtensionOptions, None),
    (Step::ValidateBasic, None),
    (Step::TxTimeoutHeight, None),
    (Step::ValidateMemo, None),
    (Step::MinGasPrice, Some(Module::Evm)),
    (Step::ConsumeTxSizeGas, None),
    (Step::DeductFee, None),
    (Step::SetPubKey, None),
    (Step::ValidateSigCount, None),
    (Step::SigGasConsume, None),
    (Step::SigVerification, None),
    (Step::IncrementSequence, None),
    (Step::RedundantRelay, None),
    (Step::GasWanted, Some(Module::Evm)),
    (Step::DisableStaking, Some(Module::Poa)),
    (Step::DisableWithdrawRewards, Some(Module::Poa)),
    (Step::CommissionLimit, Some(Module::Poa)),
];

/// EVM variant. Only present when the evm module is enabled.
pub const EVM_LAYOUT: &[(Step, Option<Module>)] = &[(Step::EvmMono, Some(Module::Evm))];

fn filter(layout: &[(Step, Option<Module>)], modules: ModuleSet) -> Vec<Step> {
    layout
        .iter()
        .filter(|(_, module)| module.map_or(true, |m| modules.contains(m)))
        .map(|(step, _)| *step)
        .collect()
}

/// Steps of the standard chain for a build profile.
pub fn standard_steps(modules: ModuleSet) -> Vec<Step> {
    filter(STANDARD_LAYOUT, modules)
}

/// Steps of the EVM chain for a build profile; empty without the evm module.
pub fn evm_steps(modules: ModuleSet) -> Vec<Step> {
    filter(EVM_LAYOUT, modules)
}

/// Instantiates the standard chain's decorators from validated options.
pub fn standard_decorators(
    options: &HandlerOptions,
) -> Result<Vec<Box<dyn AnteDecorator>>, SetupError> {
    standard_steps(options.modules)
        .into_iter()
        .map(|step| standard_decorator(step, options))
        .collect()
}

/// Instantiates the EVM chain's decorators from validated options.
pub fn evm_decorators(options: &HandlerOptions) -> Result<Vec<Box<dyn AnteDecorator>>, SetupError> {
    evm_steps(options.modules)
        .into_iter()
        .map(|step| match step {
            Step::EvmMono => Ok(Box::new(EvmMonoDecorator::new(
                required(&options.fee_market_keeper, "fee market keeper")?,
                required(&options.evm_keeper, "evm keeper")?,
                options.policy.max_tx_gas_wanted,
            )) as Box<dyn AnteDecorator>),
            other => Err(SetupError::Logic(format!("{other} has no place in the evm chain"))),
        })
        .collect()
}

fn standard_decorator(
    step: Step,
    options: &HandlerOptions,
) -> Result<Box<dyn AnteDecorator>, SetupError> {
    let accounts = || required(&options.account_keeper, "account keeper");
    let codec = || required(&options.address_codec, "address codec");
    let fee_market = || required(&options.fee_market_keeper, "fee market keeper");
    let evm = || required(&options.evm_keeper, "evm keeper");
    let policy = &options.policy;

    let decorator: Box<dyn AnteDecorator> = match step {
        Step::SetUpContext => Box::new(SetUpContextDecorator),
        Step::RejectEthereumMessages => Box::new(RejectEthereumMessagesDecorator),
        Step::AuthzLimiter => Box::new(AuthzLimiterDecorator::new(
            policy.authz_disabled_msg_types.clone(),
        )),
        Step::MsgFilter => Box::new(MsgFilterDecorator::new(required(
            &options.consumer_keeper,
            "consumer keeper",
        )?)),
        Step::DisabledModules => Box::new(DisabledModulesDecorator::new(
            policy.disabled_module_prefixes.clone(),
        )),
        Step::ForbiddenProposals => Box::new(ForbiddenProposalsDecorator::new(
            policy.legacy_proposal_whitelist.clone(),
            policy.proposal_msg_whitelist.clone(),
        )),
        Step::LimitSimulationGas => Box::new(LimitSimulationGasDecorator::new(
            required(&options.wasm_config, "wasm config")?.simulation_gas_limit,
        )),
        Step::CircuitBreaker => Box::new(CircuitBreakerDecorator::new(required(
            &options.circuit_keeper,
            "circuit keeper",
        )?)),
        Step::CountTx => Box::new(CountTxDecorator::new(required(
            &options.tx_counter_store,
            "wasm store service",
        )?)),
        Step::GasRegister => Box::new(GasRegisterDecorator::new(required(
            &options.wasm_keeper,
            "wasm keeper",
        )?)),
        Step::ExtensionOptions => {
            let checker = options.extension_option_checker.clone().or_else(|| {
                options
                    .modules
                    .evm
                    .then(dynamic_fee_extension_checker)
            });
            Box::new(ExtensionOptionsDecorator::new(checker))
        }
        Step::ValidateBasic => Box::new(ValidateBasicDecorator),
        Step::TxTimeoutHeight => Box::new(TxTimeoutHeightDecorator),
        Step::ValidateMemo => Box::new(ValidateMemoDecorator::new(accounts()?)),
        Step::MinGasPrice => Box::new(MinGasPriceDecorator::new(fee_market()?, evm()?)),
        Step::ConsumeTxSizeGas => Box::new(ConsumeTxSizeGasDecorator::new(accounts()?)),
        Step::DeductFee => Box::new(DeductFeeDecorator::new(
            accounts()?,
            required(&options.bank_keeper, "bank keeper")?,
            options.feegrant_keeper.clone(),
            codec()?,
            options.tx_fee_checker.clone(),
        )),
        Step::SetPubKey => Box::new(SetPubKeyDecorator::new(accounts()?, codec()?)),
        Step::ValidateSigCount => Box::new(ValidateSigCountDecorator::new(accounts()?)),
        Step::SigGasConsume => Box::new(SigGasConsumeDecorator::new(
            accounts()?,
            required(&options.sig_gas_consumer, "signature gas consumer")?,
        )),
        Step::SigVerification => Box::new(SigVerificationDecorator::new(
            accounts()?,
            codec()?,
            required(&options.sign_mode_handler, "sign mode handler")?,
        )),
        Step::IncrementSequence => Box::new(IncrementSequenceDecorator::new(accounts()?, codec()?)),
        Step::RedundantRelay => Box::new(RedundantRelayDecorator::new(required(
            &options.ibc_keeper,
            "ibc keeper",
        )?)),
        Step::GasWanted => Box::new(GasWantedDecorator::new(fee_market()?)),
        Step::DisableStaking => Box::new(DisableStakingDecorator),
        Step::DisableWithdrawRewards => Box::new(DisableWithdrawRewardsDecorator),
        Step::CommissionLimit => Box::new(CommissionLimitDecorator::new(
            policy.validate_gentx_rates,
            policy.commission_floor,
            policy.commission_ceil,
        )),
        Step::EvmMono => {
            return Err(SetupError::Logic(
                "EvmMono has no place in the standard chain".into(),
            ))
        }
    };
    Ok(decorator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::check_layout;

    #[test]
    fn test_every_profile_has_a_valid_layout() {
        for bits in 0..16u8 {
            let modules = ModuleSet::from_bits(bits);
            check_layout(&standard_steps(modules)).unwrap();
            check_layout(&evm_steps(modules)).unwrap();
        }
    }

    #[test]
    fn test_optional_steps_follow_modules() {
        let core = standard_steps(ModuleSet::none());
        assert_eq!(core.len(), 14);
        assert_eq!(core.first(), Some(&Step::SetUpContext));
        assert!(!core.contains(&Step::CommissionLimit));
        assert!(evm_steps(ModuleSet::none()).is_empty());

        let full = standard_steps(ModuleSet::all());
        assert_eq!(full.len(), STANDARD_LAYOUT.len());
        assert_eq!(evm_steps(ModuleSet::all()), vec![Step::EvmMono]);
    }

    #[test]
    fn test_layout_lists_each_step_once() {
        let mut seen: Vec<Step> = STANDARD_LAYOUT
            .iter()
            .chain(EVM_LAYOUT)
            .map(|(s, _)| *s)
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), Step::ALL.len());
    }
}
