use std::sync::Arc;

use crate::chain::{AnteDecorator, Next, Step};
use crate::context::Context;
use crate::error::{AnteError, AnteResult};
use crate::keepers::CircuitKeeper;
use crate::tx::Tx;

/// Rejects transactions carrying a message type that has been switched off
/// network-wide.
pub struct CircuitBreakerDecorator {
    circuit: Arc<dyn CircuitKeeper>,
}

impl CircuitBreakerDecorator {
    pub fn new(circuit: Arc<dyn CircuitKeeper>) -> Self {
        Self { circuit }
    }
}

impl AnteDecorator for CircuitBreakerDecorator {
    fn step(&self) -> Step {
        Step::CircuitBreaker
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        for msg in tx.msgs() {
            let type_url = msg.type_url();
            if !self.circuit.is_allowed(&ctx, type_url)? {
                return Err(AnteError::TxTypeNotAllowed(type_url.to_string()));
            }
        }
        next.run(ctx, tx, simulate)
    }
}
