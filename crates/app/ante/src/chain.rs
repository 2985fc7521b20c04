//! Decorator interface and chain builder.
//!
//! A chain is an ordered list of decorators. Each decorator receives the
//! context, the transaction, the simulate flag and a [`Next`] continuation
//! bound to the rest of the list; it either calls `next.run(..)` to proceed
//! or returns early to abort. The continuation past the last decorator
//! returns the context unchanged.
//!
//! The order is a contract. Every decorator names its [`Step`], and every
//! step declares which steps must precede it. [`AnteChain::build`] checks
//! those declarations, so an invalid layout fails at startup instead of
//! admitting transactions in the wrong order.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::context::Context;
use crate::error::{AnteResult, SetupError};
use crate::tx::Tx;

/// Identity of a decorator within a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    SetUpContext,
    RejectEthereumMessages,
    AuthzLimiter,
    MsgFilter,
    DisabledModules,
    ForbiddenProposals,
    LimitSimulationGas,
    CircuitBreaker,
    CountTx,
    GasRegister,
    ExtensionOptions,
    ValidateBasic,
    TxTimeoutHeight,
    ValidateMemo,
    MinGasPrice,
    ConsumeTxSizeGas,
    DeductFee,
    SetPubKey,
    ValidateSigCount,
    SigGasConsume,
    SigVerification,
    IncrementSequence,
    RedundantRelay,
    GasWanted,
    DisableStaking,
    DisableWithdrawRewards,
    CommissionLimit,
    EvmMono,
}

impl Step {
    pub const ALL: [Step; 28] = [
        Step::SetUpContext,
        Step::RejectEthereumMessages,
        Step::AuthzLimiter,
        Step::MsgFilter,
        Step::DisabledModules,
        Step::ForbiddenProposals,
        Step::LimitSimulationGas,
        Step::CircuitBreaker,
        Step::CountTx,
        Step::GasRegister,
        Step::ExtensionOptions,
        Step::ValidateBasic,
        Step::TxTimeoutHeight,
        Step::ValidateMemo,
        Step::MinGasPrice,
        Step::ConsumeTxSizeGas,
        Step::DeductFee,
        Step::SetPubKey,
        Step::ValidateSigCount,
        Step::SigGasConsume,
        Step::SigVerification,
        Step::IncrementSequence,
        Step::RedundantRelay,
        Step::GasWanted,
        Step::DisableStaking,
        Step::DisableWithdrawRewards,
        Step::CommissionLimit,
        Step::EvmMono,
    ];

    /// Steps that initialise the context themselves and must run first.
    pub fn leads(self) -> bool {
        matches!(self, Step::SetUpContext | Step::EvmMono)
    }

    /// Steps that must be present, and earlier, whenever `self` is.
    pub fn requires(self) -> &'static [Step] {
        use Step::*;
        match self {
            SetUpContext | EvmMono => &[],
            ExtensionOptions | CountTx => &[SetUpContext, CircuitBreaker],
            ValidateBasic => &[SetUpContext, CircuitBreaker],
            DeductFee => &[SetUpContext, CircuitBreaker, ConsumeTxSizeGas],
            SetPubKey => &[SetUpContext, CircuitBreaker],
            ValidateSigCount | SigGasConsume => &[SetUpContext, SetPubKey],
            SigVerification => &[SetUpContext, SetPubKey],
            IncrementSequence => &[SetUpContext, CircuitBreaker, SigVerification],
            _ => &[SetUpContext],
        }
    }

    /// Steps that must be earlier than `self` when both are present.
    pub fn after(self) -> &'static [Step] {
        use Step::*;
        match self {
            ValidateBasic => &[ExtensionOptions],
            TxTimeoutHeight | ValidateMemo => &[ExtensionOptions, ValidateBasic],
            MinGasPrice | ConsumeTxSizeGas => &[ValidateBasic],
            DeductFee => &[ValidateBasic, MinGasPrice],
            SetPubKey => &[DeductFee],
            ValidateSigCount => &[DeductFee],
            SigGasConsume => &[ValidateSigCount],
            SigVerification => &[ValidateSigCount, SigGasConsume],
            IncrementSequence => &[DeductFee, SetPubKey],
            RedundantRelay | GasWanted => &[SigVerification, IncrementSequence],
            DisableStaking | DisableWithdrawRewards | CommissionLimit => {
                &[SigVerification, IncrementSequence, RedundantRelay]
            }
            _ => &[],
        }
    }

    /// Steps that write account or bank state.
    pub fn mutates_state(self) -> bool {
        matches!(
            self,
            Step::CountTx | Step::DeductFee | Step::SetPubKey | Step::IncrementSequence
        )
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One admission step.
pub trait AnteDecorator: Send + Sync {
    fn step(&self) -> Step;

    /// Checks or updates `ctx`, then either calls `next.run` or aborts.
    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context>;
}

/// Continuation bound to the remainder of a chain.
pub struct Next<'a> {
    rest: &'a [Box<dyn AnteDecorator>],
    entered: &'a Cell<Option<Step>>,
}

impl Next<'_> {
    /// Runs the remaining decorators in order.
    pub fn run(self, ctx: Context, tx: &Tx, simulate: bool) -> AnteResult<Context> {
        match self.rest.split_first() {
            None => Ok(ctx),
            Some((head, tail)) => {
                self.entered.set(Some(head.step()));
                let next = Next {
                    rest: tail,
                    entered: self.entered,
                };
                head.ante_handle(ctx, tx, simulate, next)
            }
        }
    }
}

/// An immutable, validated decorator chain.
pub struct AnteChain {
    decorators: Vec<Box<dyn AnteDecorator>>,
}

impl AnteChain {
    /// Validates the layout of `decorators` and binds them into a chain.
    ///
    /// # Errors
    ///
    /// [`SetupError::Layout`] on a duplicate step, a leading step not in
    /// first position, or a missing or misplaced dependency.
    pub fn build(decorators: Vec<Box<dyn AnteDecorator>>) -> Result<Self, SetupError> {
        let steps: Vec<Step> = decorators.iter().map(|d| d.step()).collect();
        check_layout(&steps)?;
        Ok(Self { decorators })
    }

    /// Runs every decorator in order, stopping at the first error.
    pub fn handle(&self, ctx: Context, tx: &Tx, simulate: bool) -> AnteResult<Context> {
        let entered = Cell::new(None);
        let next = Next {
            rest: &self.decorators,
            entered: &entered,
        };
        next.run(ctx, tx, simulate).inspect_err(|err| {
            debug!(
                step = ?entered.get(),
                codespace = err.codespace(),
                code = err.code(),
                error = %err,
                "transaction rejected"
            );
        })
    }

    pub fn steps(&self) -> Vec<Step> {
        self.decorators.iter().map(|d| d.step()).collect()
    }

    pub fn len(&self) -> usize {
        self.decorators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decorators.is_empty()
    }
}

impl fmt::Debug for AnteChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnteChain")
            .field("steps", &self.steps())
            .finish()
    }
}

/// Checks a step sequence against the dependency table.
pub fn check_layout(steps: &[Step]) -> Result<(), SetupError> {
    let mut position = BTreeMap::new();
    for (i, step) in steps.iter().enumerate() {
        if position.insert(*step, i).is_some() {
            return Err(layout(*step, "is registered twice"));
        }
    }

    for (i, step) in steps.iter().enumerate() {
        if step.leads() && i != 0 {
            return Err(layout(*step, "must run first"));
        }
        for dep in step.requires() {
            match position.get(dep) {
                Some(&j) if j < i => {}
                Some(_) => return Err(layout(*step, &format!("must run after {dep}"))),
                None => return Err(layout(*step, &format!("requires {dep}"))),
            }
        }
        for dep in step.after() {
            if position.get(dep).is_some_and(|&j| j > i) {
                return Err(layout(*step, &format!("must run after {dep}")));
            }
        }
    }
    Ok(())
}

fn layout(step: Step, reason: &str) -> SetupError {
    SetupError::Layout {
        step,
        reason: reason.to_string(),
    }
}
