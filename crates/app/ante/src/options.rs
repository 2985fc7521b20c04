//! Handler configuration: capability handles, enabled modules and policy.

use evmd_math::Dec;
use std::fmt;
use std::sync::Arc;

use crate::error::SetupError;
use crate::keepers::{
    AccountKeeper, AddressCodec, BankKeeper, CircuitKeeper, ConsumerKeeper, EvmKeeper,
    ExtensionOptionChecker, FeeMarketKeeper, FeegrantKeeper, IbcKeeper, SigGasConsumer,
    SignModeHandler, TxCounterStore, TxFeeChecker, WasmConfig, WasmKeeper,
};
use crate::tx::{MSG_CREATE_VESTING_ACCOUNT, MSG_ETHEREUM_TX};

/// Optional modules that contribute decorators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Module {
    /// Smart-contract execution.
    Wasm,
    /// EVM-style transactions and fee market.
    Evm,
    /// Cross-chain consumer chain rules.
    Consumer,
    /// Permissioned validator set.
    Poa,
}

impl Module {
    pub const ALL: [Module; 4] = [Module::Wasm, Module::Evm, Module::Consumer, Module::Poa];
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Module::Wasm => "wasm",
            Module::Evm => "evm",
            Module::Consumer => "consumer",
            Module::Poa => "poa",
        };
        f.write_str(name)
    }
}

/// Build profile: which optional modules are enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModuleSet {
    pub wasm: bool,
    pub evm: bool,
    pub consumer: bool,
    pub poa: bool,
}

impl ModuleSet {
    pub const fn none() -> Self {
        Self {
            wasm: false,
            evm: false,
            consumer: false,
            poa: false,
        }
    }

    pub const fn all() -> Self {
        Self {
            wasm: true,
            evm: true,
            consumer: true,
            poa: true,
        }
    }

    /// Bit `i` enables `Module::ALL[i]`.
    pub fn from_bits(bits: u8) -> Self {
        Self {
            wasm: bits & 1 != 0,
            evm: bits & 2 != 0,
            consumer: bits & 4 != 0,
            poa: bits & 8 != 0,
        }
    }

    pub fn with(mut self, module: Module) -> Self {
        match module {
            Module::Wasm => self.wasm = true,
            Module::Evm => self.evm = true,
            Module::Consumer => self.consumer = true,
            Module::Poa => self.poa = true,
        }
        self
    }

    pub fn contains(&self, module: Module) -> bool {
        match module {
            Module::Wasm => self.wasm,
            Module::Evm => self.evm,
            Module::Consumer => self.consumer,
            Module::Poa => self.poa,
        }
    }

    pub fn enabled(&self) -> impl Iterator<Item = Module> + '_ {
        Module::ALL.into_iter().filter(|m| self.contains(*m))
    }
}

/// Numeric and list policy applied by the optional decorators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyParams {
    pub commission_floor: Dec,
    pub commission_ceil: Dec,
    /// Enforce commission bounds on genesis transactions too.
    pub validate_gentx_rates: bool,
    /// Ceiling on gas wanted by EVM transactions; 0 disables the check.
    pub max_tx_gas_wanted: u64,
    /// Message type-URL prefixes rejected on consumer chains.
    pub disabled_module_prefixes: Vec<String>,
    /// Message types that may not be granted or executed through authz.
    pub authz_disabled_msg_types: Vec<String>,
    /// Legacy proposal content types allowed on consumer chains.
    pub legacy_proposal_whitelist: Vec<String>,
    /// Message types allowed inside governance proposals on consumer chains.
    pub proposal_msg_whitelist: Vec<String>,
}

impl Default for PolicyParams {
    fn default() -> Self {
        Self {
            commission_floor: Dec::percent(10),
            commission_ceil: Dec::percent(50),
            validate_gentx_rates: false,
            max_tx_gas_wanted: 0,
            disabled_module_prefixes: vec!["/cosmos.evidence".into(), "/cosmos.slashing".into()],
            authz_disabled_msg_types: vec![
                MSG_ETHEREUM_TX.into(),
                MSG_CREATE_VESTING_ACCOUNT.into(),
            ],
            legacy_proposal_whitelist: vec![
                "/cosmos.params.v1beta1.ParameterChangeProposal".into(),
                "/ibc.core.client.v1.ClientUpdateProposal".into(),
            ],
            proposal_msg_whitelist: vec![
                "/cosmos.gov.v1.MsgExecLegacyContent".into(),
                "/cosmos.bank.v1beta1.MsgSend".into(),
            ],
        }
    }
}

/// The configuration object: built once at startup, read-only afterwards.
///
/// Capabilities are optional at the type level; [`HandlerOptions::validate`]
/// decides which ones the enabled modules actually need.
#[derive(Clone, Default)]
pub struct HandlerOptions {
    pub modules: ModuleSet,
    pub policy: PolicyParams,

    pub address_codec: Option<Arc<dyn AddressCodec>>,
    pub account_keeper: Option<Arc<dyn AccountKeeper>>,
    pub bank_keeper: Option<Arc<dyn BankKeeper>>,
    pub feegrant_keeper: Option<Arc<dyn FeegrantKeeper>>,
    pub sig_gas_consumer: Option<SigGasConsumer>,
    pub sign_mode_handler: Option<Arc<dyn SignModeHandler>>,
    pub extension_option_checker: Option<ExtensionOptionChecker>,
    pub tx_fee_checker: Option<TxFeeChecker>,
    pub circuit_keeper: Option<Arc<dyn CircuitKeeper>>,
    pub ibc_keeper: Option<Arc<dyn IbcKeeper>>,

    pub wasm_config: Option<WasmConfig>,
    pub tx_counter_store: Option<Arc<dyn TxCounterStore>>,
    pub wasm_keeper: Option<Arc<dyn WasmKeeper>>,

    pub fee_market_keeper: Option<Arc<dyn FeeMarketKeeper>>,
    pub evm_keeper: Option<Arc<dyn EvmKeeper>>,

    pub consumer_keeper: Option<Arc<dyn ConsumerKeeper>>,
}

impl fmt::Debug for HandlerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerOptions")
            .field("modules", &self.modules)
            .field("policy", &self.policy)
            .field("account_keeper", &self.account_keeper.is_some())
            .field("bank_keeper", &self.bank_keeper.is_some())
            .field("feegrant_keeper", &self.feegrant_keeper.is_some())
            .field("circuit_keeper", &self.circuit_keeper.is_some())
            .field("ibc_keeper", &self.ibc_keeper.is_some())
            .finish_non_exhaustive()
    }
}

impl HandlerOptions {
    /// Checks that every capability the enabled modules need is present.
    ///
    /// Checks run in a fixed order and the first failure is returned.
    pub fn validate(&self) -> Result<(), SetupError> {
        present(&self.address_codec, "address codec is required for AnteHandler")?;
        present(&self.account_keeper, "account keeper is required for AnteHandler")?;
        present(&self.bank_keeper, "bank keeper is required for AnteHandler")?;
        present(&self.sig_gas_consumer, "signature gas consumer is required for AnteHandler")?;
        present(&self.sign_mode_handler, "sign mode handler is required for AnteHandler")?;
        present(&self.circuit_keeper, "circuit keeper is required for ante builder")?;
        present(&self.ibc_keeper, "ibc keeper is required for ante builder")?;

        if self.modules.wasm {
            present(&self.wasm_config, "wasm config is required for ante builder")?;
            present(&self.tx_counter_store, "wasm store service is required for ante builder")?;
            present(&self.wasm_keeper, "wasm keeper is required for ante builder")?;
            if self.wasm_config.and_then(|c| c.simulation_gas_limit) == Some(0) {
                return Err(SetupError::Logic(
                    "simulation gas limit must be positive when set".into(),
                ));
            }
        }

        if self.modules.evm {
            present(&self.tx_fee_checker, "tx fee checker is required for AnteHandler")?;
            present(&self.fee_market_keeper, "fee market keeper is required for AnteHandler")?;
            present(&self.evm_keeper, "evm keeper is required for AnteHandler")?;
        }

        if self.modules.consumer {
            present(&self.consumer_keeper, "consumer keeper is required for ante builder")?;
        }

        if self.modules.poa {
            let PolicyParams {
                commission_floor,
                commission_ceil,
                ..
            } = &self.policy;
            if commission_floor > commission_ceil {
                return Err(SetupError::Logic(format!(
                    "commission floor {commission_floor} exceeds ceiling {commission_ceil}"
                )));
            }
            if *commission_ceil > Dec::ONE {
                return Err(SetupError::Logic(format!(
                    "commission ceiling {commission_ceil} exceeds 1"
                )));
            }
        }
        Ok(())
    }
}

fn present<T>(value: &Option<T>, message: &str) -> Result<(), SetupError> {
    match value {
        Some(_) => Ok(()),
        None => Err(SetupError::Logic(message.to_string())),
    }
}

/// Clones a capability out of the options, or fails like `validate` would.
pub(crate) fn required<T: Clone>(value: &Option<T>, what: &str) -> Result<T, SetupError> {
    value
        .clone()
        .ok_or_else(|| SetupError::Logic(format!("{what} is required for AnteHandler")))
}
