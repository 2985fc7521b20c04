//! Contract-execution decorators.

use std::sync::Arc;

use crate::chain::{AnteDecorator, Next, Step};
use crate::context::Context;
use crate::error::AnteResult;
use crate::gas::GasMeter;
use crate::keepers::{TxCounterStore, WasmKeeper};
use crate::tx::Tx;

/// Position of the transaction within its block, for contract environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxCounter(pub u32);

/// Caps simulation gas so estimates cannot run unbounded contract code.
#[derive(Debug, Clone, Copy)]
pub struct LimitSimulationGasDecorator {
    gas_limit: Option<u64>,
}

impl LimitSimulationGasDecorator {
    /// `gas_limit` falls back to the block gas limit when unset.
    pub fn new(gas_limit: Option<u64>) -> Self {
        Self { gas_limit }
    }
}

impl AnteDecorator for LimitSimulationGasDecorator {
    fn step(&self) -> Step {
        Step::LimitSimulationGas
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if !simulate {
            return next.run(ctx, tx, simulate);
        }
        let limit = self.gas_limit.or(ctx.consensus_params().max_gas);
        match limit {
            Some(limit) => next.run(ctx.with_gas_meter(GasMeter::finite(limit)), tx, simulate),
            None => next.run(ctx, tx, simulate),
        }
    }
}

/// Stores the per-block transaction counter and stashes it as [`TxCounter`].
pub struct CountTxDecorator {
    store: Arc<dyn TxCounterStore>,
}

impl CountTxDecorator {
    pub fn new(store: Arc<dyn TxCounterStore>) -> Self {
        Self { store }
    }
}

impl AnteDecorator for CountTxDecorator {
    fn step(&self) -> Step {
        Step::CountTx
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if simulate {
            return next.run(ctx, tx, simulate);
        }
        let height = ctx.block_height();
        let counter = match self.store.get(&ctx)? {
            Some((last_height, value)) if last_height == height => value,
            _ => 0,
        };
        self.store.set(&ctx, height, counter.saturating_add(1))?;
        next.run(ctx.with_extension(TxCounter(counter)), tx, simulate)
    }
}

pub struct GasRegisterDecorator {
    wasm: Arc<dyn WasmKeeper>,
}

impl GasRegisterDecorator {
    pub fn new(wasm: Arc<dyn WasmKeeper>) -> Self {
        Self { wasm }
    }
}

impl AnteDecorator for GasRegisterDecorator {
    fn step(&self) -> Step {
        Step::GasRegister
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let register = self.wasm.gas_register();
        next.run(ctx.with_extension(register), tx, simulate)
    }
}
