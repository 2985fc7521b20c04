//! Admission and setup error types.
//!
//! Two classes never mix: [`AnteError`] is produced per transaction by a
//! decorator and reported to the submitter, [`SetupError`] is produced once
//! at node startup and is fatal.

use crate::chain::Step;
use thiserror::Error;

pub const CODESPACE_SDK: &str = "sdk";
pub const CODESPACE_CIRCUIT: &str = "circuit";
pub const CODESPACE_IBC: &str = "ibc";
pub const CODESPACE_POA: &str = "poa";
pub const CODESPACE_CCV: &str = "ccv";
pub const CODESPACE_EVM: &str = "evm";

/// Per-transaction admission failure.
///
/// Each variant maps to a stable `(codespace, code)` pair so clients can
/// match on the failure kind without parsing messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnteError {
    #[error("tx parse error: {0}")]
    TxDecode(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("insufficient funds: {0}")]
    InsufficientFunds(String),

    #[error("unknown request: {0}")]
    UnknownRequest(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid pubkey: {0}")]
    InvalidPubKey(String),

    #[error("unknown address: {0}")]
    UnknownAddress(String),

    #[error("invalid coins: {0}")]
    InvalidCoins(String),

    #[error("out of gas in location: {descriptor}; gasWanted: {limit}, gasUsed: {used}")]
    OutOfGas {
        descriptor: String,
        limit: u64,
        used: u64,
    },

    #[error("maximum number of characters is {max} but received {got} characters")]
    MemoTooLarge { max: u64, got: u64 },

    #[error("insufficient fee: {0}")]
    InsufficientFee(String),

    #[error("signatures: {count}, limit: {limit}: too many signatures")]
    TooManySignatures { count: u64, limit: u64 },

    #[error("no signatures supplied")]
    NoSignatures,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("block height: {height}, timeout height: {timeout}: tx timeout height")]
    TxTimeoutHeight { height: u64, timeout: u64 },

    #[error("unknown extension options: {0}")]
    UnknownExtensionOptions(String),

    #[error("account sequence mismatch, expected {expected}, got {got}")]
    WrongSequence { expected: u64, got: u64 },

    #[error("invalid chain-id: {0}")]
    InvalidChainId(String),

    #[error("invalid gas limit: {0}")]
    InvalidGasLimit(String),

    #[error("gas overflow: {0}")]
    GasOverflow(String),

    #[error("tx type not allowed: {0}")]
    TxTypeNotAllowed(String),

    #[error("tx is redundant")]
    RedundantTx,

    #[error("staking actions are not allowed on this chain")]
    StakingActionNotAllowed,

    #[error("withdrawing delegator rewards is not allowed on this chain")]
    WithdrawRewardsNotAllowed,

    #[error("commission rate {rate} is outside the allowed range [{floor}, {ceil}]")]
    CommissionOutOfRange {
        rate: String,
        floor: String,
        ceil: String,
    },

    #[error("tx contains unsupported message types at height {height}")]
    UnsupportedMessages { height: u64 },

    #[error("tx contains message types from unsupported modules at height {height}: {type_url}")]
    DisabledModule { type_url: String, height: u64 },

    #[error("tx contains unsupported proposal message types at height {height}: {type_url}")]
    ForbiddenProposal { type_url: String, height: u64 },

    #[error("found disabled msg type: {0}")]
    DisabledMessage(String),

    #[error("tx gas wanted {wanted} exceeds max tx gas wanted {max}")]
    GasWantedExceeded { wanted: u64, max: u64 },

    #[error("tx gas ({gas}) exceeds block gas limit ({block_max})")]
    BlockGasLimitExceeded { gas: u64, block_max: u64 },

    #[error("internal logic error: {0}")]
    Logic(String),
}

impl AnteError {
    /// Module namespace the error belongs to.
    pub fn codespace(&self) -> &'static str {
        match self {
            AnteError::TxTypeNotAllowed(_) => CODESPACE_CIRCUIT,
            AnteError::RedundantTx => CODESPACE_IBC,
            AnteError::StakingActionNotAllowed
            | AnteError::WithdrawRewardsNotAllowed
            | AnteError::CommissionOutOfRange { .. } => CODESPACE_POA,
            AnteError::UnsupportedMessages { .. }
            | AnteError::DisabledModule { .. }
            | AnteError::ForbiddenProposal { .. } => CODESPACE_CCV,
            AnteError::GasWantedExceeded { .. } => CODESPACE_EVM,
            _ => CODESPACE_SDK,
        }
    }

    /// Stable numeric code within [`AnteError::codespace`].
    pub fn code(&self) -> u32 {
        match self {
            AnteError::TxDecode(_) => 2,
            AnteError::Unauthorized(_) => 4,
            AnteError::InsufficientFunds(_) => 5,
            AnteError::UnknownRequest(_) => 6,
            AnteError::InvalidAddress(_) => 7,
            AnteError::InvalidPubKey(_) => 8,
            AnteError::UnknownAddress(_) => 9,
            AnteError::InvalidCoins(_) => 10,
            AnteError::OutOfGas { .. } => 11,
            AnteError::MemoTooLarge { .. } => 12,
            AnteError::InsufficientFee(_) => 13,
            AnteError::TooManySignatures { .. } => 14,
            AnteError::NoSignatures => 15,
            AnteError::InvalidRequest(_) => 18,
            AnteError::DisabledMessage(_) => 4,
            AnteError::TxTimeoutHeight { .. } => 30,
            AnteError::UnknownExtensionOptions(_) => 31,
            AnteError::WrongSequence { .. } => 32,
            AnteError::InvalidChainId(_) => 39,
            AnteError::InvalidGasLimit(_) => 41,
            AnteError::GasOverflow(_) => 42,
            AnteError::BlockGasLimitExceeded { .. } => 11,
            AnteError::Logic(_) => 1,
            AnteError::TxTypeNotAllowed(_) => 1,
            AnteError::RedundantTx => 22,
            AnteError::StakingActionNotAllowed => 1,
            AnteError::WithdrawRewardsNotAllowed => 2,
            AnteError::CommissionOutOfRange { .. } => 3,
            AnteError::UnsupportedMessages { .. } => 1,
            AnteError::DisabledModule { .. } => 2,
            AnteError::ForbiddenProposal { .. } => 3,
            AnteError::GasWantedExceeded { .. } => 2,
        }
    }
}

/// Result type for admission checks.
pub type AnteResult<T> = Result<T, AnteError>;

/// Startup misconfiguration. Fatal, never seen per transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    /// A capability required by an enabled decorator is absent, or a policy
    /// parameter is unusable.
    #[error("internal logic error: {0}")]
    Logic(String),

    /// The decorator list violates the ordering contract.
    #[error("invalid decorator layout: {step:?} {reason}")]
    Layout { step: Step, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_namespaced() {
        assert_eq!(AnteError::NoSignatures.codespace(), CODESPACE_SDK);
        assert_eq!(AnteError::NoSignatures.code(), 15);
        assert_eq!(AnteError::RedundantTx.codespace(), CODESPACE_IBC);
        assert_eq!(AnteError::StakingActionNotAllowed.codespace(), CODESPACE_POA);
        assert_eq!(
            AnteError::GasWantedExceeded { wanted: 2, max: 1 }.codespace(),
            CODESPACE_EVM
        );
    }

    #[test]
    fn test_messages_render_fields() {
        let err = AnteError::WrongSequence {
            expected: 4,
            got: 3,
        };
        assert_eq!(
            err.to_string(),
            "account sequence mismatch, expected 4, got 3"
        );

        let err = AnteError::MemoTooLarge { max: 256, got: 300 };
        assert!(err.to_string().contains("256"));
    }
}
