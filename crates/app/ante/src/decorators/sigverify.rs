//! Public-key resolution, signature accounting and verification, and the
//! sequence bump.
//!
//! [`SetPubKeyDecorator`] stashes the key of every signer in the context as
//! [`SignerKeys`]. The decorators after it read keys from there and never
//! from account writes made earlier in the same admission, which are not
//! visible while simulating.

use std::sync::Arc;

use crate::chain::{AnteDecorator, Next, Step};
use crate::context::{Context, Event};
use crate::error::{AnteError, AnteResult};
use crate::gas::GasMeter;
use crate::keepers::{
    AccountKeeper, AddressCodec, AuthParams, BaseAccount, SigGasConsumer, SignModeHandler,
    SignerData,
};
use crate::tx::{Address, MultisigSignature, PubKey, Tx};

/// Stand-in key for signers without one while simulating.
pub const SIM_SECP256K1_PUBKEY: [u8; 33] = [
    0x02, 0x81, 0xe9, 0x26, 0x0d, 0xd1, 0x39, 0x8b, 0xc0, 0x6c, 0xc7, 0x6c, 0x46, 0xc8, 0xd3,
    0x2f, 0xa1, 0xf2, 0xe0, 0x1d, 0x11, 0x98, 0x0d, 0x86, 0x13, 0x59, 0x92, 0xd5, 0x93, 0x7f,
    0x60, 0x29, 0x33,
];

/// Keys of the transaction's signers, in signer order. `None` means the
/// signer has no key on chain and supplied none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerKeys(pub Vec<Option<PubKey>>);

impl SignerKeys {
    fn from_ctx(ctx: &Context) -> AnteResult<&Self> {
        ctx.extension::<SignerKeys>().ok_or_else(|| {
            AnteError::Logic("signer keys not resolved; SetPubKey must run first".into())
        })
    }
}

fn signer_account(
    accounts: &dyn AccountKeeper,
    codec: &dyn AddressCodec,
    ctx: &Context,
    addr: &Address,
) -> AnteResult<BaseAccount> {
    accounts.get_account(ctx, addr).ok_or_else(|| {
        AnteError::UnknownAddress(format!("account {} does not exist", codec.bytes_to_string(addr)))
    })
}

/// Default signature gas: secp256k1 keys cost
/// `sig_verify_cost_secp256k1`; ed25519 is charged then rejected as
/// unsupported for transactions; multisig charges each signing sub-key.
pub fn default_sig_verification_gas_consumer(
    meter: &mut GasMeter,
    sig: &[u8],
    pubkey: &PubKey,
    params: &AuthParams,
) -> AnteResult<()> {
    match pubkey {
        PubKey::Ed25519(_) => {
            meter.consume_gas(params.sig_verify_cost_ed25519, "ante verify: ed25519")?;
            Err(AnteError::InvalidPubKey("ED25519 public keys are unsupported".into()))
        }
        PubKey::Secp256k1(_) | PubKey::EthSecp256k1(_) => {
            meter.consume_gas(params.sig_verify_cost_secp256k1, "ante verify: secp256k1")
        }
        PubKey::Multisig { keys, .. } => {
            // An empty payload is a simulation placeholder: charge every key.
            if sig.is_empty() {
                return keys.iter().try_for_each(|key| {
                    default_sig_verification_gas_consumer(meter, &[], key, params)
                });
            }
            let multi = MultisigSignature::decode(sig)?;
            let mut signatures = multi.signatures.iter();
            for (key, _) in keys.iter().zip(&multi.bitarray).filter(|(_, set)| **set) {
                let sub = signatures.next().map(Vec::as_slice).unwrap_or_default();
                default_sig_verification_gas_consumer(meter, sub, key, params)?;
            }
            Ok(())
        }
    }
}

pub struct SetPubKeyDecorator {
    accounts: Arc<dyn AccountKeeper>,
    codec: Arc<dyn AddressCodec>,
}

impl SetPubKeyDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>, codec: Arc<dyn AddressCodec>) -> Self {
        Self { accounts, codec }
    }
}

impl AnteDecorator for SetPubKeyDecorator {
    fn step(&self) -> Step {
        Step::SetPubKey
    }

    fn ante_handle(
        &self,
        mut ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let signers = tx.signers();
        let infos = tx.signer_infos();
        if infos.len() != signers.len() {
            return Err(AnteError::Unauthorized(format!(
                "invalid number of signer infos; expected: {}, got {}",
                signers.len(),
                infos.len()
            )));
        }

        let mut keys = Vec::with_capacity(signers.len());
        for (i, (signer, info)) in signers.iter().zip(infos).enumerate() {
            let mut account = signer_account(&*self.accounts, &*self.codec, &ctx, signer)?;

            let provided = match (&info.public_key, simulate) {
                (Some(pk), _) => Some(pk.clone()),
                (None, true) => Some(PubKey::Secp256k1(SIM_SECP256K1_PUBKEY)),
                (None, false) => None,
            };
            if let Some(pk) = &provided {
                if !simulate && pk.address() != *signer {
                    return Err(AnteError::InvalidPubKey(format!(
                        "pubKey does not match signer address {} with signer index: {i}",
                        self.codec.bytes_to_string(signer)
                    )));
                }
            }

            let resolved = match (&account.pub_key, provided) {
                (Some(existing), _) => Some(existing.clone()),
                (None, Some(pk)) => {
                    account.pub_key = Some(pk.clone());
                    self.accounts.set_account(&ctx, account.clone());
                    Some(pk)
                }
                (None, None) => None,
            };
            keys.push(resolved);

            let sig = tx.signatures().get(i).map(hex::encode).unwrap_or_default();
            ctx.emit_event(
                Event::new("tx")
                    .attr(
                        "acc_seq",
                        format!("{}/{}", self.codec.bytes_to_string(signer), account.sequence),
                    )
                    .attr("signature", sig),
            );
        }

        next.run(ctx.with_extension(SignerKeys(keys)), tx, simulate)
    }
}

pub struct ValidateSigCountDecorator {
    accounts: Arc<dyn AccountKeeper>,
}

impl ValidateSigCountDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteDecorator for ValidateSigCountDecorator {
    fn step(&self) -> Step {
        Step::ValidateSigCount
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let limit = self.accounts.params(&ctx).tx_sig_limit;
        let count = SignerKeys::from_ctx(&ctx)?
            .0
            .iter()
            .flatten()
            .map(|k| k.count_sub_keys() as u64)
            .sum::<u64>();
        if count > limit {
            return Err(AnteError::TooManySignatures { count, limit });
        }
        next.run(ctx, tx, simulate)
    }
}

pub struct SigGasConsumeDecorator {
    accounts: Arc<dyn AccountKeeper>,
    consumer: SigGasConsumer,
}

impl SigGasConsumeDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>, consumer: SigGasConsumer) -> Self {
        Self { accounts, consumer }
    }
}

impl AnteDecorator for SigGasConsumeDecorator {
    fn step(&self) -> Step {
        Step::SigGasConsume
    }

    fn ante_handle(
        &self,
        mut ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let params = self.accounts.params(&ctx);
        let keys = SignerKeys::from_ctx(&ctx)?.0.clone();
        for (i, key) in keys.iter().enumerate() {
            let key = key
                .as_ref()
                .ok_or_else(|| AnteError::InvalidPubKey("pubkey on account is not set".into()))?;
            let sig = tx.signatures().get(i).map(Vec::as_slice).unwrap_or_default();
            (self.consumer)(ctx.gas_meter_mut(), sig, key, &params)?;
        }
        next.run(ctx, tx, simulate)
    }
}

/// Checks sequences, then signatures unless simulating, rechecking, or
/// verification is disabled on the context.
pub struct SigVerificationDecorator {
    accounts: Arc<dyn AccountKeeper>,
    codec: Arc<dyn AddressCodec>,
    sign_mode: Arc<dyn SignModeHandler>,
}

impl SigVerificationDecorator {
    pub fn new(
        accounts: Arc<dyn AccountKeeper>,
        codec: Arc<dyn AddressCodec>,
        sign_mode: Arc<dyn SignModeHandler>,
    ) -> Self {
        Self {
            accounts,
            codec,
            sign_mode,
        }
    }
}

impl AnteDecorator for SigVerificationDecorator {
    fn step(&self) -> Step {
        Step::SigVerification
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let signers = tx.signers();
        let sigs = tx.signatures();
        if sigs.len() != signers.len() {
            return Err(AnteError::Unauthorized(format!(
                "invalid number of signer;  expected: {}, got {}",
                signers.len(),
                sigs.len()
            )));
        }
        let keys = SignerKeys::from_ctx(&ctx)?;
        let verify = !simulate && !ctx.is_recheck_tx() && ctx.sigverify_enabled();

        for (i, signer) in signers.iter().enumerate() {
            let account = signer_account(&*self.accounts, &*self.codec, &ctx, signer)?;
            let key = keys.0.get(i).and_then(Option::as_ref);
            if !simulate && key.is_none() {
                return Err(AnteError::InvalidPubKey("pubkey on account is not set".into()));
            }

            let info = tx.signer_infos().get(i).ok_or_else(|| {
                AnteError::Unauthorized(format!("no signer info for signer index: {i}"))
            })?;
            if info.sequence != account.sequence {
                return Err(AnteError::WrongSequence {
                    expected: account.sequence,
                    got: info.sequence,
                });
            }

            if let (true, Some(key)) = (verify, key) {
                let account_number = if ctx.block_height() == 0 {
                    0
                } else {
                    account.account_number
                };
                let data = SignerData {
                    address: *signer,
                    chain_id: ctx.chain_id().to_string(),
                    account_number,
                    sequence: account.sequence,
                };
                let bytes = self.sign_mode.sign_bytes(info.mode, &data, tx)?;
                if !key.verify(&bytes, &sigs[i]) {
                    return Err(AnteError::Unauthorized(format!(
                        "signature verification failed; please verify account number ({}), \
                         sequence ({}) and chain-id ({})",
                        account_number,
                        account.sequence,
                        ctx.chain_id()
                    )));
                }
            }
        }
        next.run(ctx, tx, simulate)
    }
}

/// Bumps every signer's sequence. Runs only after signatures verified.
pub struct IncrementSequenceDecorator {
    accounts: Arc<dyn AccountKeeper>,
    codec: Arc<dyn AddressCodec>,
}

impl IncrementSequenceDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>, codec: Arc<dyn AddressCodec>) -> Self {
        Self { accounts, codec }
    }
}

impl AnteDecorator for IncrementSequenceDecorator {
    fn step(&self) -> Step {
        Step::IncrementSequence
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        for signer in tx.signers() {
            let mut account = signer_account(&*self.accounts, &*self.codec, &ctx, &signer)?;
            account.sequence = account
                .sequence
                .checked_add(1)
                .ok_or_else(|| AnteError::Logic("account sequence overflow".into()))?;
            self.accounts.set_account(&ctx, account);
        }
        next.run(ctx, tx, simulate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secp() -> PubKey {
        PubKey::Secp256k1(SIM_SECP256K1_PUBKEY)
    }

    #[test]
    fn test_default_consumer_secp256k1() {
        let mut meter = GasMeter::finite(10_000);
        default_sig_verification_gas_consumer(&mut meter, &[], &secp(), &AuthParams::default())
            .unwrap();
        assert_eq!(meter.consumed(), 1000);
    }

    #[test]
    fn test_default_consumer_rejects_ed25519_after_charging() {
        let mut meter = GasMeter::finite(10_000);
        let err = default_sig_verification_gas_consumer(
            &mut meter,
            &[],
            &PubKey::Ed25519([1; 32]),
            &AuthParams::default(),
        )
        .unwrap_err();
        assert!(matches!(err, AnteError::InvalidPubKey(_)));
        assert_eq!(meter.consumed(), 590);
    }

    #[test]
    fn test_default_consumer_multisig_charges_set_bits() {
        let multi = PubKey::Multisig {
            threshold: 2,
            keys: vec![secp(), secp(), secp()],
        };
        let sig = MultisigSignature {
            bitarray: vec![true, false, true],
            signatures: vec![vec![1; 64], vec![2; 64]],
        };
        let mut meter = GasMeter::finite(10_000);
        let params = AuthParams::default();
        default_sig_verification_gas_consumer(&mut meter, &sig.encode(), &multi, &params).unwrap();
        assert_eq!(meter.consumed(), 2000);

        let mut sim = GasMeter::infinite(0);
        default_sig_verification_gas_consumer(&mut sim, &[], &multi, &AuthParams::default())
            .unwrap();
        assert_eq!(sim.consumed(), 3000);
    }
}
