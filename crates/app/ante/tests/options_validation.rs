//! Startup validation of handler options against the build profile.

use evmd_ante::error::SetupError;
use evmd_ante::options::{HandlerOptions, Module, ModuleSet};
use evmd_ante::{AnteHandler, Dec};
use evmd_ante_testing::generators::arb_module_set;
use proptest::prelude::*;

mod common;
use common::Fixture;

/// A removable capability and the module that needs it (`None`: always).
type Capability = (&'static str, fn(&mut HandlerOptions), Option<Option<Module>>);

// `Some(None)` is required by every profile, `None` by no profile.
const CAPABILITIES: &[Capability] = &[
    ("address codec", |o| o.address_codec = None, Some(None)),
    ("account keeper", |o| o.account_keeper = None, Some(None)),
    ("bank keeper", |o| o.bank_keeper = None, Some(None)),
    ("signature gas consumer", |o| o.sig_gas_consumer = None, Some(None)),
    ("sign mode handler", |o| o.sign_mode_handler = None, Some(None)),
    ("circuit keeper", |o| o.circuit_keeper = None, Some(None)),
    ("ibc keeper", |o| o.ibc_keeper = None, Some(None)),
    ("feegrant keeper", |o| o.feegrant_keeper = None, None),
    ("extension option checker", |o| o.extension_option_checker = None, None),
    ("wasm config", |o| o.wasm_config = None, Some(Some(Module::Wasm))),
    ("wasm store service", |o| o.tx_counter_store = None, Some(Some(Module::Wasm))),
    ("wasm keeper", |o| o.wasm_keeper = None, Some(Some(Module::Wasm))),
    ("tx fee checker", |o| o.tx_fee_checker = None, Some(Some(Module::Evm))),
    ("fee market keeper", |o| o.fee_market_keeper = None, Some(Some(Module::Evm))),
    ("evm keeper", |o| o.evm_keeper = None, Some(Some(Module::Evm))),
    ("consumer keeper", |o| o.consumer_keeper = None, Some(Some(Module::Consumer))),
];

fn is_required(needed_by: Option<Option<Module>>, modules: ModuleSet) -> bool {
    match needed_by {
        None => false,
        Some(None) => true,
        Some(Some(module)) => modules.contains(module),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_missing_capability_fails_iff_required(
        modules in arb_module_set(),
        pick in 0..CAPABILITIES.len(),
    ) {
        let (name, remove, needed_by) = CAPABILITIES[pick];
        let mut options = Fixture::new(modules).options;
        remove(&mut options);

        match options.validate() {
            Err(SetupError::Logic(message)) => {
                prop_assert!(is_required(needed_by, modules), "{name} rejected: {message}");
                prop_assert!(message.starts_with(name), "{message}");
                prop_assert!(AnteHandler::new(options).is_err());
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
            Ok(()) => {
                prop_assert!(!is_required(needed_by, modules), "{name} accepted");
                prop_assert!(AnteHandler::new(options).is_ok());
            }
        }
    }

    #[test]
    fn prop_full_options_build_every_profile(modules in arb_module_set()) {
        let handler = AnteHandler::new(Fixture::new(modules).options).unwrap();
        prop_assert_eq!(handler.evm_chain().is_some(), modules.evm);
    }
}

#[test]
fn test_commission_bounds_checked_only_with_poa() {
    let mut fx = Fixture::new(ModuleSet::none());
    fx.options.policy.commission_floor = Dec::percent(60);
    fx.options.policy.commission_ceil = Dec::percent(50);
    assert!(fx.options.validate().is_ok());

    fx.options.modules = fx.options.modules.with(Module::Poa);
    assert!(matches!(fx.options.validate(), Err(SetupError::Logic(_))));

    fx.options.policy.commission_floor = Dec::percent(10);
    fx.options.policy.commission_ceil = Dec::percent(101);
    assert!(matches!(fx.options.validate(), Err(SetupError::Logic(_))));
}

#[test]
fn test_zero_simulation_gas_limit_rejected() {
    let mut fx = Fixture::new(ModuleSet::none().with(Module::Wasm));
    fx.options.wasm_config = fx.options.wasm_config.map(|mut c| {
        c.simulation_gas_limit = Some(0);
        c
    });
    assert!(AnteHandler::new(fx.options).is_err());
}
