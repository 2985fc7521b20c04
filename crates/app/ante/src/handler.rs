//! Admission entry point and variant dispatch.

use tracing::{info, trace};

use crate::chain::{AnteChain, Step};
use crate::context::{Context, ExecMode};
use crate::error::{AnteError, AnteResult, SetupError};
use crate::options::HandlerOptions;
use crate::pipeline::{evm_decorators, standard_decorators};
use crate::tx::{Tx, EXT_DYNAMIC_FEE_TX, EXT_ETHEREUM_TX};

/// Which chain a transaction is admitted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Standard,
    Evm,
}

/// Selects the chain from the transaction's wire type.
///
/// The first extension option is the wire type. EVM transactions go to the
/// EVM chain, dynamic-fee and untagged transactions to the standard chain.
pub fn variant_for(tx: &Tx) -> AnteResult<Variant> {
    match tx.wire_type() {
        None | Some(EXT_DYNAMIC_FEE_TX) => Ok(Variant::Standard),
        Some(EXT_ETHEREUM_TX) => Ok(Variant::Evm),
        Some(other) => Err(AnteError::UnknownExtensionOptions(format!(
            "rejecting tx with unsupported extension option: {other}"
        ))),
    }
}

/// Both chains, built once at startup and shared by every admission.
#[derive(Debug)]
pub struct AnteHandler {
    standard: AnteChain,
    evm: Option<AnteChain>,
}

impl AnteHandler {
    /// Validates `options` and builds the chains the enabled modules call for.
    ///
    /// # Errors
    ///
    /// Returns the first missing capability or invalid policy value, or a
    /// layout violation found while building either chain.
    pub fn new(options: HandlerOptions) -> Result<Self, SetupError> {
        options.validate()?;

        let standard = AnteChain::build(standard_decorators(&options)?)?;
        let evm = if options.modules.evm {
            Some(AnteChain::build(evm_decorators(&options)?)?)
        } else {
            None
        };

        info!(
            modules = ?options.modules,
            standard = ?standard.steps(),
            evm = ?evm.as_ref().map(AnteChain::steps),
            "ante handler built"
        );
        Ok(Self { standard, evm })
    }

    /// Runs the admission checks for `tx`.
    ///
    /// With `simulate` set the context is switched to simulate mode, so
    /// capabilities discard every write made during the traversal.
    pub fn admit(&self, ctx: Context, tx: &Tx, simulate: bool) -> AnteResult<Context> {
        let ctx = if simulate {
            ctx.with_exec_mode(ExecMode::Simulate)
        } else {
            ctx
        };

        let variant = variant_for(tx)?;
        trace!(?variant, height = ctx.block_height(), simulate, "admitting transaction");
        match variant {
            Variant::Standard => self.standard.handle(ctx, tx, simulate),
            Variant::Evm => match &self.evm {
                Some(chain) => chain.handle(ctx, tx, simulate),
                None => Err(AnteError::UnknownExtensionOptions(format!(
                    "rejecting tx with unsupported extension option: {EXT_ETHEREUM_TX}"
                ))),
            },
        }
    }

    pub fn standard_chain(&self) -> &AnteChain {
        &self.standard
    }

    pub fn evm_chain(&self) -> Option<&AnteChain> {
        self.evm.as_ref()
    }

    pub fn standard_steps(&self) -> Vec<Step> {
        self.standard.steps()
    }
}
