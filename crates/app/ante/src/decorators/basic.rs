//! Cheap syntactic checks and size-based gas.

use crate::chain::{AnteDecorator, Next, Step};
use crate::context::Context;
use crate::error::{AnteError, AnteResult};
use crate::keepers::{AccountKeeper, ExtensionOptionChecker};
use crate::tx::{Any, PubKey, Tx};
use std::sync::Arc;

/// Signature bytes charged per missing signature while simulating.
const SIM_SIGNATURE_SIZE: u64 = 64;
/// Extra bytes charged per simulated signature for key and signer metadata.
const SIM_SIGNER_OVERHEAD: u64 = 33 + 8;

/// Rejects critical extension options the checker does not accept.
pub struct ExtensionOptionsDecorator {
    checker: Option<ExtensionOptionChecker>,
}

impl ExtensionOptionsDecorator {
    /// Without a checker every extension option is rejected.
    pub fn new(checker: Option<ExtensionOptionChecker>) -> Self {
        Self { checker }
    }

    fn accepts(&self, opt: &Any) -> bool {
        self.checker.as_ref().is_some_and(|check| check(opt))
    }
}

impl AnteDecorator for ExtensionOptionsDecorator {
    fn step(&self) -> Step {
        Step::ExtensionOptions
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if let Some(opt) = tx.body.extension_options.iter().find(|o| !self.accepts(o)) {
            return Err(AnteError::UnknownExtensionOptions(opt.type_url.clone()));
        }
        next.run(ctx, tx, simulate)
    }
}

/// Stateless transaction and message checks. Skipped on recheck, where the
/// transaction already passed once.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidateBasicDecorator;

impl AnteDecorator for ValidateBasicDecorator {
    fn step(&self) -> Step {
        Step::ValidateBasic
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if ctx.is_recheck_tx() {
            return next.run(ctx, tx, simulate);
        }
        if tx.msgs().is_empty() {
            return Err(AnteError::InvalidRequest("must contain at least one message".into()));
        }
        tx.validate_basic()?;
        for msg in tx.msgs() {
            msg.validate_basic()?;
        }
        next.run(ctx, tx, simulate)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TxTimeoutHeightDecorator;

impl AnteDecorator for TxTimeoutHeightDecorator {
    fn step(&self) -> Step {
        Step::TxTimeoutHeight
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let timeout = tx.timeout_height();
        if timeout > 0 && ctx.block_height() > timeout {
            return Err(AnteError::TxTimeoutHeight {
                height: ctx.block_height(),
                timeout,
            });
        }
        next.run(ctx, tx, simulate)
    }
}

pub struct ValidateMemoDecorator {
    accounts: Arc<dyn AccountKeeper>,
}

impl ValidateMemoDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteDecorator for ValidateMemoDecorator {
    fn step(&self) -> Step {
        Step::ValidateMemo
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let max = self.accounts.params(&ctx).max_memo_characters;
        // Bytes, not characters.
        let got = tx.memo().len() as u64;
        if got > max {
            return Err(AnteError::MemoTooLarge { max, got });
        }
        next.run(ctx, tx, simulate)
    }
}

/// Charges `tx_size_cost_per_byte` for every encoded byte.
pub struct ConsumeTxSizeGasDecorator {
    accounts: Arc<dyn AccountKeeper>,
}

impl ConsumeTxSizeGasDecorator {
    pub fn new(accounts: Arc<dyn AccountKeeper>) -> Self {
        Self { accounts }
    }
}

impl AnteDecorator for ConsumeTxSizeGasDecorator {
    fn step(&self) -> Step {
        Step::ConsumeTxSizeGas
    }

    fn ante_handle(
        &self,
        mut ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let params = self.accounts.params(&ctx);
        let size = tx.encode()?.len() as u64;
        ctx.gas_meter_mut()
            .consume_gas(params.tx_size_cost_per_byte.saturating_mul(size), "txSize")?;

        // Simulated transactions usually carry empty signatures; charge for
        // the bytes real ones would add.
        if simulate {
            for i in 0..tx.signers().len() {
                let signed = tx.signatures().get(i).is_some_and(|s| !s.is_empty());
                if signed {
                    continue;
                }
                let mut sig_bytes = SIM_SIGNATURE_SIZE + SIM_SIGNER_OVERHEAD;
                let key = tx.signer_infos().get(i).and_then(|info| info.public_key.as_ref());
                if let Some(PubKey::Multisig { .. }) = key {
                    sig_bytes = sig_bytes.saturating_mul(params.tx_sig_limit);
                }
                ctx.gas_meter_mut().consume_gas(
                    params.tx_size_cost_per_byte.saturating_mul(sig_bytes),
                    "txSize",
                )?;
            }
        }
        next.run(ctx, tx, simulate)
    }
}
