//! Test kit for the admission pipeline.
//!
//! [`MemState`] implements every capability trait over one shared,
//! lock-protected state, so a test can wire a complete [`HandlerOptions`]
//! with [`full_options`] and inspect balances and sequences afterwards.
//! Writes made in simulate mode are dropped, as a real simulation would
//! drop its cache.

pub mod builder;
pub mod generators;
pub mod keys;
pub mod recorder;
pub mod state;

use std::sync::Arc;

use evmd_ante::context::{BlockHeader, ConsensusParams, Context, ExecMode};
use evmd_ante::decorators::{default_sig_verification_gas_consumer, dynamic_fee_checker};
use evmd_ante::keepers::{DirectSignModeHandler, HexAddressCodec, SigGasConsumer, WasmConfig};
use evmd_ante::options::{HandlerOptions, ModuleSet, PolicyParams};

pub use builder::{eth_tx, EthTxParams, TxBuilder};
pub use keys::TestKey;
pub use recorder::{record_all, RecordingDecorator, StepLog};
pub use state::{MemState, Snapshot};

pub const CHAIN_ID: &str = "evmd-test-1";
pub const EVM_CHAIN_ID: u64 = 9001;
pub const DENOM: &str = "aevmd";
pub const BLOCK_MAX_GAS: u64 = 30_000_000;

/// Every capability backed by `state`, with `modules` enabled and the
/// default policy.
pub fn full_options(state: &Arc<MemState>, modules: ModuleSet) -> HandlerOptions {
    let consumer: SigGasConsumer = Arc::new(default_sig_verification_gas_consumer);
    HandlerOptions {
        modules,
        policy: PolicyParams::default(),
        address_codec: Some(Arc::new(HexAddressCodec)),
        account_keeper: Some(state.clone()),
        bank_keeper: Some(state.clone()),
        feegrant_keeper: Some(state.clone()),
        sig_gas_consumer: Some(consumer),
        sign_mode_handler: Some(Arc::new(DirectSignModeHandler)),
        extension_option_checker: None,
        tx_fee_checker: modules
            .evm
            .then(|| dynamic_fee_checker(state.clone(), state.clone())),
        circuit_keeper: Some(state.clone()),
        ibc_keeper: Some(state.clone()),
        wasm_config: Some(WasmConfig {
            simulation_gas_limit: Some(BLOCK_MAX_GAS),
        }),
        tx_counter_store: Some(state.clone()),
        wasm_keeper: Some(state.clone()),
        fee_market_keeper: Some(state.clone()),
        evm_keeper: Some(state.clone()),
        consumer_keeper: Some(state.clone()),
    }
}

/// A context at `height` in `mode`, on the test chain, with a block gas
/// limit of [`BLOCK_MAX_GAS`].
pub fn ctx_at(height: u64, mode: ExecMode) -> Context {
    let header = BlockHeader {
        height,
        time: 1_700_000_000 + height * 5,
        chain_id: CHAIN_ID.to_string(),
    };
    Context::new(header, mode).with_consensus_params(ConsensusParams {
        max_gas: Some(BLOCK_MAX_GAS),
    })
}

pub fn check_ctx(height: u64) -> Context {
    ctx_at(height, ExecMode::Check)
}

pub fn finalize_ctx(height: u64) -> Context {
    ctx_at(height, ExecMode::Finalize)
}
