//! Every admission step, grouped by concern.

mod basic;
mod circuit;
mod consumer;
mod evm;
mod fee;
mod ibc;
mod poa;
mod setup;
mod sigverify;
mod wasm;

pub use basic::{
    ConsumeTxSizeGasDecorator, ExtensionOptionsDecorator, TxTimeoutHeightDecorator,
    ValidateBasicDecorator, ValidateMemoDecorator,
};
pub use circuit::CircuitBreakerDecorator;
pub use consumer::{DisabledModulesDecorator, ForbiddenProposalsDecorator, MsgFilterDecorator};
pub use evm::{
    dynamic_fee_checker, dynamic_fee_extension_checker, AuthzLimiterDecorator, EvmMonoDecorator,
    GasWantedDecorator, MinGasPriceDecorator, RejectEthereumMessagesDecorator, MAX_NESTED_MSGS,
};
pub use fee::{check_tx_fee_with_validator_min_gas_prices, tx_priority, DeductFeeDecorator};
pub use ibc::RedundantRelayDecorator;
pub use poa::{CommissionLimitDecorator, DisableStakingDecorator, DisableWithdrawRewardsDecorator};
pub use setup::SetUpContextDecorator;
pub use sigverify::{
    default_sig_verification_gas_consumer, IncrementSequenceDecorator, SetPubKeyDecorator,
    SigGasConsumeDecorator, SigVerificationDecorator, SignerKeys, ValidateSigCountDecorator,
    SIM_SECP256K1_PUBKEY,
};
pub use wasm::{
    CountTxDecorator, GasRegisterDecorator, LimitSimulationGasDecorator, TxCounter,
};
