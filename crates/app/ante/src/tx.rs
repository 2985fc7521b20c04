//! Transaction model as seen by admission.
//!
//! The pipeline only observes a [`Tx`]: signers, sequences, fee, gas wanted,
//! memo, messages and the wire-type tag carried by the first extension
//! option. Nothing here executes messages.

use borsh::{BorshDeserialize, BorshSerialize};
use evmd_math::Dec;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::signature::Verifier;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use sha2::{Digest, Sha256};
use sha3::Keccak256;
use std::collections::BTreeSet;
use std::fmt;

use crate::coins::{Coin, Coins};
use crate::error::{AnteError, AnteResult};

/// Wire type of transactions routed to the EVM pipeline.
pub const EXT_ETHEREUM_TX: &str = "/cosmos.evm.vm.v1.ExtensionOptionsEthereumTx";
/// Wire type of standard transactions carrying a priority tip.
pub const EXT_DYNAMIC_FEE_TX: &str = "/cosmos.evm.types.v1.ExtensionOptionDynamicFeeTx";

pub const MSG_SEND: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const MSG_DELEGATE: &str = "/cosmos.staking.v1beta1.MsgDelegate";
pub const MSG_UNDELEGATE: &str = "/cosmos.staking.v1beta1.MsgUndelegate";
pub const MSG_BEGIN_REDELEGATE: &str = "/cosmos.staking.v1beta1.MsgBeginRedelegate";
pub const MSG_CANCEL_UNBONDING: &str = "/cosmos.staking.v1beta1.MsgCancelUnbondingDelegation";
pub const MSG_CREATE_VALIDATOR: &str = "/cosmos.staking.v1beta1.MsgCreateValidator";
pub const MSG_EDIT_VALIDATOR: &str = "/cosmos.staking.v1beta1.MsgEditValidator";
pub const MSG_WITHDRAW_REWARD: &str = "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward";
pub const MSG_EXEC: &str = "/cosmos.authz.v1beta1.MsgExec";
pub const MSG_GRANT: &str = "/cosmos.authz.v1beta1.MsgGrant";
pub const MSG_SUBMIT_PROPOSAL: &str = "/cosmos.gov.v1.MsgSubmitProposal";
pub const MSG_EXEC_LEGACY_CONTENT: &str = "/cosmos.gov.v1.MsgExecLegacyContent";
pub const MSG_CREATE_VESTING_ACCOUNT: &str = "/cosmos.vesting.v1beta1.MsgCreateVestingAccount";
pub const MSG_RECV_PACKET: &str = "/ibc.core.channel.v1.MsgRecvPacket";
pub const MSG_ACKNOWLEDGEMENT: &str = "/ibc.core.channel.v1.MsgAcknowledgement";
pub const MSG_TIMEOUT: &str = "/ibc.core.channel.v1.MsgTimeout";
pub const MSG_TIMEOUT_ON_CLOSE: &str = "/ibc.core.channel.v1.MsgTimeoutOnClose";
pub const MSG_UPDATE_CLIENT: &str = "/ibc.core.client.v1.MsgUpdateClient";
pub const MSG_EXECUTE_CONTRACT: &str = "/cosmwasm.wasm.v1.MsgExecuteContract";
pub const MSG_ETHEREUM_TX: &str = "/cosmos.evm.vm.v1.MsgEthereumTx";

/// Cosmos `MaxGasWanted`: gas limits must fit a signed 64-bit integer.
pub const MAX_GAS_WANTED: u64 = i64::MAX as u64;

// ---------------------------------------------------------------------------
// Addresses and keys
// ---------------------------------------------------------------------------

#[derive(
    Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, BorshSerialize, BorshDeserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub const ZERO: Self = Self([0u8; 20]);

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(bytes).ok().map(Self)
    }

    /// Deterministic address of a module account.
    pub fn module(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut out = [0u8; 20];
        out.copy_from_slice(&digest[..20]);
        Self(out)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum PubKey {
    /// Compressed SEC1 secp256k1 key, SHA-256 message digest.
    Secp256k1([u8; 33]),
    Ed25519([u8; 32]),
    /// Compressed secp256k1 key with Ethereum addressing and Keccak digest.
    EthSecp256k1([u8; 33]),
    Multisig { threshold: u32, keys: Vec<PubKey> },
}

/// Signature payload of a multisig key: which sub-keys signed, and their
/// signatures in key order.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MultisigSignature {
    pub bitarray: Vec<bool>,
    pub signatures: Vec<Vec<u8>>,
}

impl MultisigSignature {
    pub fn decode(bytes: &[u8]) -> AnteResult<Self> {
        Self::try_from_slice(bytes)
            .map_err(|e| AnteError::TxDecode(format!("multisig signature: {e}")))
    }

    pub fn encode(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }
}

impl PubKey {
    pub fn type_url(&self) -> &'static str {
        match self {
            PubKey::Secp256k1(_) => "/cosmos.crypto.secp256k1.PubKey",
            PubKey::Ed25519(_) => "/cosmos.crypto.ed25519.PubKey",
            PubKey::EthSecp256k1(_) => "/cosmos.evm.crypto.v1.ethsecp256k1.PubKey",
            PubKey::Multisig { .. } => "/cosmos.crypto.multisig.LegacyAminoPubKey",
        }
    }

    pub fn address(&self) -> Address {
        match self {
            PubKey::Secp256k1(bytes) => truncated_sha256(bytes),
            PubKey::Ed25519(bytes) => truncated_sha256(bytes),
            PubKey::EthSecp256k1(bytes) => eth_address(bytes).unwrap_or(Address::ZERO),
            PubKey::Multisig { .. } => truncated_sha256(&borsh::to_vec(self).unwrap_or_default()),
        }
    }

    /// Number of signing keys; multisig keys count every leaf.
    pub fn count_sub_keys(&self) -> usize {
        match self {
            PubKey::Multisig { keys, .. } => keys.iter().map(PubKey::count_sub_keys).sum(),
            _ => 1,
        }
    }

    /// Checks `sig` over `msg`. Malformed keys or signatures verify as false.
    pub fn verify(&self, msg: &[u8], sig: &[u8]) -> bool {
        match self {
            PubKey::Secp256k1(bytes) => {
                let Some((key, sig)) = parse_secp256k1(bytes, sig) else {
                    return false;
                };
                key.verify(msg, &sig).is_ok()
            }
            PubKey::EthSecp256k1(bytes) => {
                let Some((key, sig)) = parse_secp256k1(bytes, sig) else {
                    return false;
                };
                let digest = Keccak256::digest(msg);
                key.verify_prehash(&digest, &sig).is_ok()
            }
            PubKey::Ed25519(bytes) => {
                let Ok(key) = ed25519_dalek::VerifyingKey::from_bytes(bytes) else {
                    return false;
                };
                let Ok(sig) = ed25519_dalek::Signature::from_slice(sig) else {
                    return false;
                };
                ed25519_dalek::Verifier::verify(&key, msg, &sig).is_ok()
            }
            PubKey::Multisig { threshold, keys } => {
                let Ok(multi) = MultisigSignature::decode(sig) else {
                    return false;
                };
                if multi.bitarray.len() != keys.len() {
                    return false;
                }
                let signed: Vec<&PubKey> = keys
                    .iter()
                    .zip(&multi.bitarray)
                    .filter(|(_, set)| **set)
                    .map(|(k, _)| k)
                    .collect();
                if signed.len() != multi.signatures.len() || signed.len() < *threshold as usize {
                    return false;
                }
                signed
                    .iter()
                    .zip(&multi.signatures)
                    .all(|(key, sig)| key.verify(msg, sig))
            }
        }
    }
}

fn truncated_sha256(bytes: &[u8]) -> Address {
    let digest = Sha256::digest(bytes);
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest[..20]);
    Address(out)
}

fn eth_address(compressed: &[u8; 33]) -> Option<Address> {
    let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(compressed).ok()?;
    let point = key.to_encoded_point(false);
    let digest = Keccak256::digest(&point.as_bytes()[1..]);
    Address::from_slice(&digest[12..])
}

/// Parses a key and a 64-byte `r || s` signature (a trailing recovery byte
/// is ignored). High-S signatures are rejected.
fn parse_secp256k1(
    key: &[u8; 33],
    sig: &[u8],
) -> Option<(k256::ecdsa::VerifyingKey, k256::ecdsa::Signature)> {
    let key = k256::ecdsa::VerifyingKey::from_sec1_bytes(key).ok()?;
    let rs = sig.get(..64)?;
    if sig.len() > 65 {
        return None;
    }
    let sig = k256::ecdsa::Signature::from_slice(rs).ok()?;
    if sig.normalize_s().is_some() {
        return None;
    }
    Some((key, sig))
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Packet {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub destination_port: String,
    pub destination_channel: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum IbcMsg {
    RecvPacket { packet: Packet, signer: Address },
    Acknowledgement { packet: Packet, acknowledgement: Vec<u8>, signer: Address },
    Timeout { packet: Packet, signer: Address },
    TimeoutOnClose { packet: Packet, signer: Address },
    UpdateClient { client_id: String, header: Vec<u8>, signer: Address },
}

impl IbcMsg {
    pub fn type_url(&self) -> &'static str {
        match self {
            IbcMsg::RecvPacket { .. } => MSG_RECV_PACKET,
            IbcMsg::Acknowledgement { .. } => MSG_ACKNOWLEDGEMENT,
            IbcMsg::Timeout { .. } => MSG_TIMEOUT,
            IbcMsg::TimeoutOnClose { .. } => MSG_TIMEOUT_ON_CLOSE,
            IbcMsg::UpdateClient { .. } => MSG_UPDATE_CLIENT,
        }
    }

    pub fn signer(&self) -> Address {
        match self {
            IbcMsg::RecvPacket { signer, .. }
            | IbcMsg::Acknowledgement { signer, .. }
            | IbcMsg::Timeout { signer, .. }
            | IbcMsg::TimeoutOnClose { signer, .. }
            | IbcMsg::UpdateClient { signer, .. } => *signer,
        }
    }

    /// The relayed packet, for packet-lifecycle messages.
    pub fn packet(&self) -> Option<&Packet> {
        match self {
            IbcMsg::RecvPacket { packet, .. }
            | IbcMsg::Acknowledgement { packet, .. }
            | IbcMsg::Timeout { packet, .. }
            | IbcMsg::TimeoutOnClose { packet, .. } => Some(packet),
            IbcMsg::UpdateClient { .. } => None,
        }
    }
}

/// An EVM transaction wrapped as a message.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MsgEthereumTx {
    pub from: Address,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_fee_cap: u128,
    pub gas_tip_cap: u128,
    pub value: u128,
    /// `None` deploys a contract.
    pub to: Option<Address>,
    pub data: Vec<u8>,
    /// `None` for pre-EIP-155 (unprotected) transactions.
    pub chain_id: Option<u64>,
    pub signature: Vec<u8>,
}

impl MsgEthereumTx {
    /// `min(fee_cap, base_fee + tip)` when a base fee applies, else the fee cap.
    pub fn effective_gas_price(&self, base_fee: Option<u128>) -> u128 {
        match base_fee {
            Some(base) => self
                .gas_fee_cap
                .min(base.saturating_add(self.gas_tip_cap)),
            None => self.gas_fee_cap,
        }
    }

    /// Portion of the gas price paid above the base fee.
    pub fn effective_tip(&self, base_fee: Option<u128>) -> u128 {
        self.effective_gas_price(base_fee)
            .saturating_sub(base_fee.unwrap_or(0))
    }

    /// Bytes the sender signs: everything but the signature.
    pub fn sighash_preimage(&self) -> Vec<u8> {
        let unsigned = MsgEthereumTx {
            signature: Vec::new(),
            ..self.clone()
        };
        borsh::to_vec(&unsigned).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Msg {
    Send {
        from: Address,
        to: Address,
        amount: Coins,
    },
    Delegate {
        delegator: Address,
        validator: Address,
        amount: Coin,
    },
    Undelegate {
        delegator: Address,
        validator: Address,
        amount: Coin,
    },
    BeginRedelegate {
        delegator: Address,
        src_validator: Address,
        dst_validator: Address,
        amount: Coin,
    },
    CancelUnbondingDelegation {
        delegator: Address,
        validator: Address,
        amount: Coin,
        creation_height: u64,
    },
    CreateValidator {
        validator: Address,
        commission_rate: Dec,
        self_delegation: Coin,
    },
    EditValidator {
        validator: Address,
        commission_rate: Option<Dec>,
    },
    WithdrawDelegatorReward {
        delegator: Address,
        validator: Address,
    },
    /// Authz execution of messages on behalf of their signers.
    Exec {
        grantee: Address,
        msgs: Vec<Msg>,
    },
    Grant {
        granter: Address,
        grantee: Address,
        msg_type_url: String,
    },
    SubmitProposal {
        proposer: Address,
        messages: Vec<Msg>,
    },
    ExecLegacyContent {
        authority: Address,
        content_type_url: String,
    },
    CreateVestingAccount {
        from: Address,
        to: Address,
        amount: Coins,
    },
    Ibc(IbcMsg),
    WasmExecute {
        sender: Address,
        contract: Address,
        msg: Vec<u8>,
        funds: Coins,
    },
    EthereumTx(MsgEthereumTx),
    /// Any message type the pipeline has no special rules for.
    Other {
        type_url: String,
        signers: Vec<Address>,
        value: Vec<u8>,
    },
}

impl Msg {
    pub fn type_url(&self) -> &str {
        match self {
            Msg::Send { .. } => MSG_SEND,
            Msg::Delegate { .. } => MSG_DELEGATE,
            Msg::Undelegate { .. } => MSG_UNDELEGATE,
            Msg::BeginRedelegate { .. } => MSG_BEGIN_REDELEGATE,
            Msg::CancelUnbondingDelegation { .. } => MSG_CANCEL_UNBONDING,
            Msg::CreateValidator { .. } => MSG_CREATE_VALIDATOR,
            Msg::EditValidator { .. } => MSG_EDIT_VALIDATOR,
            Msg::WithdrawDelegatorReward { .. } => MSG_WITHDRAW_REWARD,
            Msg::Exec { .. } => MSG_EXEC,
            Msg::Grant { .. } => MSG_GRANT,
            Msg::SubmitProposal { .. } => MSG_SUBMIT_PROPOSAL,
            Msg::ExecLegacyContent { .. } => MSG_EXEC_LEGACY_CONTENT,
            Msg::CreateVestingAccount { .. } => MSG_CREATE_VESTING_ACCOUNT,
            Msg::Ibc(msg) => msg.type_url(),
            Msg::WasmExecute { .. } => MSG_EXECUTE_CONTRACT,
            Msg::EthereumTx(_) => MSG_ETHEREUM_TX,
            Msg::Other { type_url, .. } => type_url,
        }
    }

    pub fn signers(&self) -> Vec<Address> {
        match self {
            Msg::Send { from, .. } | Msg::CreateVestingAccount { from, .. } => vec![*from],
            Msg::Delegate { delegator, .. }
            | Msg::Undelegate { delegator, .. }
            | Msg::BeginRedelegate { delegator, .. }
            | Msg::CancelUnbondingDelegation { delegator, .. }
            | Msg::WithdrawDelegatorReward { delegator, .. } => vec![*delegator],
            Msg::CreateValidator { validator, .. } | Msg::EditValidator { validator, .. } => {
                vec![*validator]
            }
            Msg::Exec { grantee, .. } => vec![*grantee],
            Msg::Grant { granter, .. } => vec![*granter],
            Msg::SubmitProposal { proposer, .. } => vec![*proposer],
            Msg::ExecLegacyContent { authority, .. } => vec![*authority],
            Msg::Ibc(msg) => vec![msg.signer()],
            Msg::WasmExecute { sender, .. } => vec![*sender],
            Msg::EthereumTx(msg) => vec![msg.from],
            Msg::Other { signers, .. } => signers.clone(),
        }
    }

    /// Stateless checks of a single message.
    pub fn validate_basic(&self) -> AnteResult<()> {
        match self {
            Msg::Send { from, to, amount } | Msg::CreateVestingAccount { from, to, amount } => {
                require_address(from, "from")?;
                require_address(to, "to")?;
                if amount.is_empty() {
                    return Err(AnteError::InvalidCoins("amount cannot be empty".into()));
                }
                amount.validate()
            }
            Msg::Delegate { amount, .. }
            | Msg::Undelegate { amount, .. }
            | Msg::BeginRedelegate { amount, .. }
            | Msg::CancelUnbondingDelegation { amount, .. } => {
                if amount.amount == 0 {
                    return Err(AnteError::InvalidRequest("invalid delegation amount".into()));
                }
                Ok(())
            }
            Msg::CreateValidator {
                commission_rate,
                self_delegation,
                ..
            } => {
                if *commission_rate > Dec::ONE {
                    return Err(AnteError::InvalidRequest(
                        "commission rate cannot be more than 100%".into(),
                    ));
                }
                if self_delegation.amount == 0 {
                    return Err(AnteError::InvalidRequest("invalid delegation amount".into()));
                }
                Ok(())
            }
            Msg::EditValidator {
                commission_rate: Some(rate),
                ..
            } if *rate > Dec::ONE => Err(AnteError::InvalidRequest(
                "commission rate cannot be more than 100%".into(),
            )),
            Msg::Exec { msgs, .. } => {
                if msgs.is_empty() {
                    return Err(AnteError::InvalidRequest("messages cannot be empty".into()));
                }
                msgs.iter().try_for_each(Msg::validate_basic)
            }
            Msg::SubmitProposal { messages, .. } => {
                messages.iter().try_for_each(Msg::validate_basic)
            }
            Msg::Grant { msg_type_url, .. } if msg_type_url.is_empty() => Err(
                AnteError::InvalidRequest("authorization message type cannot be empty".into()),
            ),
            Msg::ExecLegacyContent {
                content_type_url, ..
            } if content_type_url.is_empty() => {
                Err(AnteError::InvalidRequest("legacy content cannot be empty".into()))
            }
            Msg::Ibc(msg) => require_address(&msg.signer(), "signer"),
            Msg::WasmExecute { funds, .. } => funds.validate(),
            Msg::EthereumTx(msg) => {
                if msg.gas_limit == 0 {
                    return Err(AnteError::InvalidGasLimit("gas limit must not be zero".into()));
                }
                Ok(())
            }
            Msg::Other { signers, .. } if signers.is_empty() => {
                Err(AnteError::InvalidRequest("message has no signers".into()))
            }
            _ => Ok(()),
        }
    }
}

fn require_address(addr: &Address, field: &str) -> AnteResult<()> {
    if *addr == Address::ZERO {
        return Err(AnteError::InvalidAddress(format!("empty {field} address")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Any {
    pub type_url: String,
    pub value: Vec<u8>,
}

impl Any {
    pub fn new(type_url: impl Into<String>) -> Self {
        Self {
            type_url: type_url.into(),
            value: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TxBody {
    pub messages: Vec<Msg>,
    pub memo: String,
    /// Block height after which the transaction is invalid; 0 disables.
    pub timeout_height: u64,
    pub extension_options: Vec<Any>,
    pub non_critical_extension_options: Vec<Any>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum SignMode {
    #[default]
    Direct,
    LegacyAminoJson,
    Textual,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SignerInfo {
    /// May be omitted once the account has a key on chain.
    pub public_key: Option<PubKey>,
    pub mode: SignMode,
    pub sequence: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Fee {
    pub amount: Coins,
    pub gas_limit: u64,
    pub payer: Option<Address>,
    pub granter: Option<Address>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Tx {
    pub body: TxBody,
    pub auth_info: AuthInfo,
    pub signatures: Vec<Vec<u8>>,
}

impl Tx {
    pub fn decode(bytes: &[u8]) -> AnteResult<Self> {
        Self::try_from_slice(bytes).map_err(|e| AnteError::TxDecode(e.to_string()))
    }

    pub fn encode(&self) -> AnteResult<Vec<u8>> {
        borsh::to_vec(self).map_err(|e| AnteError::TxDecode(e.to_string()))
    }

    pub fn msgs(&self) -> &[Msg] {
        &self.body.messages
    }

    /// Required signers in first-seen order, without duplicates.
    pub fn signers(&self) -> Vec<Address> {
        let mut seen = BTreeSet::new();
        self.body
            .messages
            .iter()
            .flat_map(Msg::signers)
            .filter(|addr| seen.insert(*addr))
            .collect()
    }

    pub fn signer_infos(&self) -> &[SignerInfo] {
        &self.auth_info.signer_infos
    }

    pub fn signatures(&self) -> &[Vec<u8>] {
        &self.signatures
    }

    pub fn fee(&self) -> &Coins {
        &self.auth_info.fee.amount
    }

    pub fn gas_limit(&self) -> u64 {
        self.auth_info.fee.gas_limit
    }

    /// Explicit payer, else the first signer.
    pub fn fee_payer(&self) -> Option<Address> {
        self.auth_info
            .fee
            .payer
            .or_else(|| self.signers().first().copied())
    }

    pub fn fee_granter(&self) -> Option<Address> {
        self.auth_info.fee.granter
    }

    pub fn memo(&self) -> &str {
        &self.body.memo
    }

    pub fn timeout_height(&self) -> u64 {
        self.body.timeout_height
    }

    /// Type URL of the first critical extension option, which tags the
    /// transaction's wire type.
    pub fn wire_type(&self) -> Option<&str> {
        self.body
            .extension_options
            .first()
            .map(|opt| opt.type_url.as_str())
    }

    /// Transaction-level stateless checks.
    pub fn validate_basic(&self) -> AnteResult<()> {
        if self.gas_limit() > MAX_GAS_WANTED {
            return Err(AnteError::InvalidRequest(format!(
                "invalid gas supplied; {} > {}",
                self.gas_limit(),
                MAX_GAS_WANTED
            )));
        }
        self.fee()
            .validate()
            .map_err(|e| AnteError::InsufficientFee(format!("invalid fee: {e}")))?;
        if self.signatures.is_empty() {
            return Err(AnteError::NoSignatures);
        }
        let signers = self.signers();
        if self.signatures.len() != signers.len() {
            return Err(AnteError::Unauthorized(format!(
                "wrong number of signers; expected {}, got {}",
                signers.len(),
                self.signatures.len()
            )));
        }
        Ok(())
    }

    /// Bytes signed in direct mode by the signer with `account_number`.
    pub fn direct_sign_bytes(&self, chain_id: &str, account_number: u64) -> AnteResult<Vec<u8>> {
        let mut buf = Vec::new();
        let encode = |e: std::io::Error| AnteError::TxDecode(e.to_string());
        self.body.serialize(&mut buf).map_err(encode)?;
        self.auth_info.serialize(&mut buf).map_err(encode)?;
        chain_id.serialize(&mut buf).map_err(encode)?;
        account_number.serialize(&mut buf).map_err(encode)?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k256::ecdsa::signature::Signer;
    use k256::ecdsa::SigningKey;

    fn secp_key(seed: u8) -> (SigningKey, PubKey) {
        let sk = SigningKey::from_bytes(&[seed; 32].into()).unwrap();
        let pk: [u8; 33] = sk
            .verifying_key()
            .to_encoded_point(true)
            .as_bytes()
            .try_into()
            .unwrap();
        (sk, PubKey::Secp256k1(pk))
    }

    fn send(from: Address) -> Msg {
        Msg::Send {
            from,
            to: Address([9; 20]),
            amount: Coins::single("stake", 10),
        }
    }

    #[test]
    fn test_secp256k1_verify() {
        let (sk, pk) = secp_key(7);
        let sig: k256::ecdsa::Signature = sk.sign(b"payload");
        assert!(pk.verify(b"payload", &sig.to_bytes()));
        assert!(!pk.verify(b"other", &sig.to_bytes()));
        assert!(!pk.verify(b"payload", &[0u8; 10]));
    }

    #[test]
    fn test_multisig_threshold() {
        let (sk1, pk1) = secp_key(1);
        let (_, pk2) = secp_key(2);
        let multi = PubKey::Multisig {
            threshold: 1,
            keys: vec![pk1, pk2],
        };
        assert_eq!(multi.count_sub_keys(), 2);

        let sig: k256::ecdsa::Signature = sk1.sign(b"doc");
        let payload = MultisigSignature {
            bitarray: vec![true, false],
            signatures: vec![sig.to_bytes().to_vec()],
        };
        assert!(multi.verify(b"doc", &payload.encode()));

        let none = MultisigSignature {
            bitarray: vec![false, false],
            signatures: vec![],
        };
        assert!(!multi.verify(b"doc", &none.encode()));
    }

    #[test]
    fn test_signers_are_deduplicated_in_order() {
        let a = Address([1; 20]);
        let b = Address([2; 20]);
        let tx = Tx {
            body: TxBody {
                messages: vec![send(b), send(a), send(b)],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(tx.signers(), vec![b, a]);
        assert_eq!(tx.fee_payer(), Some(b));
    }

    #[test]
    fn test_validate_basic_counts_signatures() {
        let tx = Tx {
            body: TxBody {
                messages: vec![send(Address([1; 20]))],
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(tx.validate_basic(), Err(AnteError::NoSignatures));

        let tx = Tx {
            signatures: vec![vec![1], vec![2]],
            ..tx
        };
        assert!(matches!(tx.validate_basic(), Err(AnteError::Unauthorized(_))));
    }

    #[test]
    fn test_effective_gas_price() {
        let msg = MsgEthereumTx {
            from: Address([1; 20]),
            nonce: 0,
            gas_limit: 21_000,
            gas_fee_cap: 100,
            gas_tip_cap: 10,
            value: 0,
            to: None,
            data: vec![],
            chain_id: Some(1),
            signature: vec![],
        };
        assert_eq!(msg.effective_gas_price(Some(50)), 60);
        assert_eq!(msg.effective_gas_price(Some(95)), 100);
        assert_eq!(msg.effective_tip(Some(95)), 5);
        assert_eq!(msg.effective_gas_price(None), 100);
    }
}
