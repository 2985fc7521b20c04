//! Transaction construction.

use evmd_ante::coins::Coins;
use evmd_ante::tx::{
    Address, Any, AuthInfo, Fee, Msg, MsgEthereumTx, SignMode, SignerInfo, Tx, TxBody,
    EXT_ETHEREUM_TX,
};

use crate::keys::TestKey;
use crate::{CHAIN_ID, DENOM, EVM_CHAIN_ID};

/// Builds standard transactions signed in direct mode.
#[derive(Debug, Clone)]
pub struct TxBuilder {
    body: TxBody,
    fee: Fee,
    chain_id: String,
}

impl Default for TxBuilder {
    fn default() -> Self {
        Self {
            body: TxBody::default(),
            fee: Fee {
                amount: Coins::single(DENOM, 200_000),
                gas_limit: 200_000,
                payer: None,
                granter: None,
            },
            chain_id: CHAIN_ID.to_string(),
        }
    }
}

impl TxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bank send of `amount` from `from` to a fixed recipient.
    pub fn send(from: Address, amount: u128) -> Self {
        Self::new().msg(Msg::Send {
            from,
            to: Address([0xee; 20]),
            amount: Coins::single(DENOM, amount),
        })
    }

    pub fn msg(mut self, msg: Msg) -> Self {
        self.body.messages.push(msg);
        self
    }

    pub fn memo(mut self, memo: impl Into<String>) -> Self {
        self.body.memo = memo.into();
        self
    }

    pub fn timeout_height(mut self, height: u64) -> Self {
        self.body.timeout_height = height;
        self
    }

    pub fn extension(mut self, type_url: &str) -> Self {
        self.body.extension_options.push(Any::new(type_url));
        self
    }

    pub fn fee(mut self, amount: Coins) -> Self {
        self.fee.amount = amount;
        self
    }

    pub fn gas(mut self, gas_limit: u64) -> Self {
        self.fee.gas_limit = gas_limit;
        self
    }

    pub fn granter(mut self, granter: Address) -> Self {
        self.fee.granter = Some(granter);
        self
    }

    /// Chain id the signatures commit to.
    pub fn chain_id(mut self, chain_id: &str) -> Self {
        self.chain_id = chain_id.to_string();
        self
    }

    /// Signs for each `(key, account_number, sequence)`, in signer order.
    /// Public keys are included in the signer infos.
    pub fn sign(self, signers: &[(&TestKey, u64, u64)]) -> Tx {
        let chain_id = self.chain_id.clone();
        let infos = signers
            .iter()
            .map(|(key, _, sequence)| SignerInfo {
                public_key: Some(key.pub_key()),
                mode: SignMode::Direct,
                sequence: *sequence,
            })
            .collect();
        let mut tx = self.unsigned(infos);
        tx.signatures = signers
            .iter()
            .map(|(key, account_number, _)| {
                let bytes = tx
                    .direct_sign_bytes(&chain_id, *account_number)
                    .expect("sign bytes encode");
                key.sign(&bytes)
            })
            .collect();
        tx
    }

    /// The transaction with `infos` and an empty signature per info.
    pub fn unsigned(self, infos: Vec<SignerInfo>) -> Tx {
        let signatures = infos.iter().map(|_| Vec::new()).collect();
        Tx {
            body: self.body,
            auth_info: AuthInfo {
                signer_infos: infos,
                fee: self.fee,
            },
            signatures,
        }
    }
}

/// Fields of an EVM transaction a test usually varies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthTxParams {
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_fee_cap: u128,
    pub gas_tip_cap: u128,
    pub value: u128,
    pub chain_id: Option<u64>,
}

impl Default for EthTxParams {
    fn default() -> Self {
        Self {
            nonce: 0,
            gas_limit: 21_000,
            gas_fee_cap: 10,
            gas_tip_cap: 1,
            value: 0,
            chain_id: Some(EVM_CHAIN_ID),
        }
    }
}

/// A signed EVM transaction from `key`, wrapped for the EVM pipeline.
pub fn eth_tx(key: &TestKey, params: EthTxParams) -> Tx {
    let mut msg = MsgEthereumTx {
        from: key.eth_address(),
        nonce: params.nonce,
        gas_limit: params.gas_limit,
        gas_fee_cap: params.gas_fee_cap,
        gas_tip_cap: params.gas_tip_cap,
        value: params.value,
        to: Some(Address([0xcc; 20])),
        data: Vec::new(),
        chain_id: params.chain_id,
        signature: Vec::new(),
    };
    msg.signature = key.sign_eth(&msg.sighash_preimage());

    Tx {
        body: TxBody {
            messages: vec![Msg::EthereumTx(msg)],
            extension_options: vec![Any::new(EXT_ETHEREUM_TX)],
            ..TxBody::default()
        },
        auth_info: AuthInfo {
            signer_infos: Vec::new(),
            fee: Fee {
                amount: Coins::default(),
                gas_limit: params.gas_limit,
                payer: None,
                granter: None,
            },
        },
        signatures: Vec::new(),
    }
}
