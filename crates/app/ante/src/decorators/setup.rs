use crate::chain::{AnteDecorator, Next, Step};
use crate::context::Context;
use crate::error::{AnteError, AnteResult};
use crate::gas::GasMeter;
use crate::tx::Tx;

/// Installs the transaction's gas meter and clears events.
///
/// Simulations and genesis transactions get an infinite meter that still
/// records consumption; everything else is metered against the gas limit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SetUpContextDecorator;

impl AnteDecorator for SetUpContextDecorator {
    fn step(&self) -> Step {
        Step::SetUpContext
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let gas_limit = tx.gas_limit();
        let meter = if simulate || ctx.block_height() == 0 {
            GasMeter::infinite(gas_limit)
        } else {
            GasMeter::finite(gas_limit)
        };
        let ctx = ctx.with_gas_meter(meter).with_events(Vec::new());

        if let Some(max_gas) = ctx.consensus_params().max_gas {
            if gas_limit > max_gas {
                return Err(AnteError::InvalidGasLimit(format!(
                    "tx gas limit {gas_limit} exceeds block max gas {max_gas}"
                )));
            }
        }

        next.run(ctx, tx, simulate).map_err(|err| match err {
            AnteError::OutOfGas {
                descriptor, used, ..
            } => AnteError::OutOfGas {
                descriptor,
                limit: gas_limit,
                used,
            },
            other => other,
        })
    }
}
