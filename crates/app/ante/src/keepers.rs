//! Capability interfaces the pipeline consumes but does not implement.
//!
//! Every capability is shared across concurrent admissions, so
//! implementations must be `Send + Sync` and handle their own locking.
//! Writes made while `ctx.exec_mode()` is [`ExecMode::Simulate`] must not
//! persist.
//!
//! [`ExecMode::Simulate`]: crate::context::ExecMode::Simulate

use borsh::{BorshDeserialize, BorshSerialize};
use evmd_math::Dec;
use std::sync::Arc;

use crate::coins::Coins;
use crate::context::Context;
use crate::error::{AnteError, AnteResult};
use crate::gas::GasMeter;
use crate::tx::{Address, Any, IbcMsg, Msg, MsgEthereumTx, PubKey, SignMode, Tx};

pub const FEE_COLLECTOR: &str = "fee_collector";

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct BaseAccount {
    pub address: Address,
    pub pub_key: Option<PubKey>,
    pub account_number: u64,
    pub sequence: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthParams {
    pub max_memo_characters: u64,
    pub tx_sig_limit: u64,
    pub tx_size_cost_per_byte: u64,
    pub sig_verify_cost_ed25519: u64,
    pub sig_verify_cost_secp256k1: u64,
}

impl Default for AuthParams {
    fn default() -> Self {
        Self {
            max_memo_characters: 256,
            tx_sig_limit: 7,
            tx_size_cost_per_byte: 10,
            sig_verify_cost_ed25519: 590,
            sig_verify_cost_secp256k1: 1000,
        }
    }
}

pub trait AddressCodec: Send + Sync {
    fn string_to_bytes(&self, text: &str) -> AnteResult<Address>;
    fn bytes_to_string(&self, addr: &Address) -> String;
}

/// `0x`-prefixed lowercase hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexAddressCodec;

impl AddressCodec for HexAddressCodec {
    fn string_to_bytes(&self, text: &str) -> AnteResult<Address> {
        let raw = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(raw).map_err(|e| AnteError::InvalidAddress(format!("{text}: {e}")))?;
        Address::from_slice(&bytes)
            .ok_or_else(|| AnteError::InvalidAddress(format!("{text}: expected 20 bytes")))
    }

    fn bytes_to_string(&self, addr: &Address) -> String {
        addr.to_string()
    }
}

pub trait AccountKeeper: Send + Sync {
    fn params(&self, ctx: &Context) -> AuthParams;
    fn get_account(&self, ctx: &Context, addr: &Address) -> Option<BaseAccount>;
    fn set_account(&self, ctx: &Context, account: BaseAccount);
    /// Address of a module account, `None` if the module has no account.
    fn module_address(&self, name: &str) -> Option<Address>;
}

pub trait BankKeeper: Send + Sync {
    fn is_send_enabled_coins(&self, ctx: &Context, coins: &Coins) -> AnteResult<()>;
    fn send_coins_from_account_to_module(
        &self,
        ctx: &Context,
        from: &Address,
        module: &str,
        amount: &Coins,
    ) -> AnteResult<()>;
}

pub trait FeegrantKeeper: Send + Sync {
    /// Spends `fee` from the allowance `granter` gave `grantee`.
    fn use_granted_fees(
        &self,
        ctx: &Context,
        granter: &Address,
        grantee: &Address,
        fee: &Coins,
        msgs: &[Msg],
    ) -> AnteResult<()>;
}

pub trait CircuitKeeper: Send + Sync {
    fn is_allowed(&self, ctx: &Context, type_url: &str) -> AnteResult<bool>;
}

/// Outcome of probing a relayed packet against channel state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Already relayed; executing it again would change nothing.
    Noop,
    Success,
}

pub trait IbcKeeper: Send + Sync {
    /// Probes a packet message without persisting anything.
    fn check_packet(&self, ctx: &Context, msg: &IbcMsg) -> AnteResult<RelayOutcome>;
    fn update_client(&self, ctx: &Context, client_id: &str, header: &[u8]) -> AnteResult<()>;
}

pub trait ConsumerKeeper: Send + Sync {
    /// Channel to the provider chain, once established.
    fn provider_channel(&self, ctx: &Context) -> Option<String>;
}

pub trait TxCounterStore: Send + Sync {
    /// Last stored `(height, counter)` pair.
    fn get(&self, ctx: &Context) -> AnteResult<Option<(u64, u32)>>;
    fn set(&self, ctx: &Context, height: u64, counter: u32) -> AnteResult<()>;
}

/// Gas costs the contract engine charges, stashed for message handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasRegister {
    pub instance_cost: u64,
    pub compile_cost_per_byte: u64,
    pub event_attribute_cost: u64,
}

pub trait WasmKeeper: Send + Sync {
    fn gas_register(&self) -> GasRegister;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WasmConfig {
    /// Gas ceiling for simulations; falls back to the block gas limit.
    pub simulation_gas_limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeMarketParams {
    pub no_base_fee: bool,
    pub base_fee: u128,
    pub min_gas_price: Dec,
    pub enable_height: u64,
}

impl FeeMarketParams {
    pub fn base_fee_enabled(&self, height: u64) -> bool {
        !self.no_base_fee && height >= self.enable_height
    }

    /// Base fee in effect at `height`, if any.
    pub fn base_fee_at(&self, height: u64) -> Option<u128> {
        self.base_fee_enabled(height).then_some(self.base_fee)
    }
}

pub trait FeeMarketKeeper: Send + Sync {
    fn params(&self, ctx: &Context) -> FeeMarketParams;
    /// Adds to the block's running gas-wanted total; returns the new total.
    fn add_transient_gas_wanted(&self, ctx: &Context, gas: u64) -> AnteResult<u64>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvmParams {
    pub evm_denom: String,
    pub allow_unprotected_txs: bool,
    pub create_enabled: bool,
    pub call_enabled: bool,
}

/// The execution engine's own account model. Signature, nonce and fee
/// checks for EVM transactions are delegated here.
pub trait EvmKeeper: Send + Sync {
    fn params(&self, ctx: &Context) -> EvmParams;
    fn chain_id(&self) -> u64;
    fn verify_signature(&self, ctx: &Context, msg: &MsgEthereumTx) -> AnteResult<()>;
    /// Charges `fee` to the sender after checking it can also cover the value.
    fn deduct_fee(&self, ctx: &Context, msg: &MsgEthereumTx, fee: &Coins) -> AnteResult<()>;
    fn check_and_increment_nonce(&self, ctx: &Context, msg: &MsgEthereumTx) -> AnteResult<()>;
}

/// Identifies the signer a sign-bytes request is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerData {
    pub address: Address,
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
}

pub trait SignModeHandler: Send + Sync {
    fn sign_bytes(&self, mode: SignMode, data: &SignerData, tx: &Tx) -> AnteResult<Vec<u8>>;
}

/// Signs the borsh encoding of body, auth info, chain id and account number.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectSignModeHandler;

impl SignModeHandler for DirectSignModeHandler {
    fn sign_bytes(&self, mode: SignMode, data: &SignerData, tx: &Tx) -> AnteResult<Vec<u8>> {
        match mode {
            SignMode::Direct => tx.direct_sign_bytes(&data.chain_id, data.account_number),
            other => Err(AnteError::Unauthorized(format!(
                "sign mode {other:?} is not supported"
            ))),
        }
    }
}

/// Charges gas for verifying one signature of `pubkey`.
pub type SigGasConsumer =
    Arc<dyn Fn(&mut GasMeter, &[u8], &PubKey, &AuthParams) -> AnteResult<()> + Send + Sync>;

/// Computes the effective fee and priority of a transaction.
pub type TxFeeChecker = Arc<dyn Fn(&Context, &Tx) -> AnteResult<(Coins, u64)> + Send + Sync>;

/// Accepts or rejects a critical extension option.
pub type ExtensionOptionChecker = Arc<dyn Fn(&Any) -> bool + Send + Sync>;
