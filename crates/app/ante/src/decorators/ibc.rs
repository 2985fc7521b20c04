use std::sync::Arc;

use crate::chain::{AnteDecorator, Next, Step};
use crate::context::Context;
use crate::error::{AnteError, AnteResult};
use crate::keepers::{IbcKeeper, RelayOutcome};
use crate::tx::{IbcMsg, Msg, Tx};

/// Rejects relayer transactions in which every packet was already relayed.
///
/// Runs in CheckTx and ReCheckTx only; blocks are free to include redundant
/// relays, which execute as no-ops.
pub struct RedundantRelayDecorator {
    ibc: Arc<dyn IbcKeeper>,
}

impl RedundantRelayDecorator {
    pub fn new(ibc: Arc<dyn IbcKeeper>) -> Self {
        Self { ibc }
    }
}

impl AnteDecorator for RedundantRelayDecorator {
    fn step(&self) -> Step {
        Step::RedundantRelay
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        // Simulation runs against the check state, so it is checked too.
        if ctx.is_check_tx() || ctx.is_simulate() {
            let mut packets = 0usize;
            let mut redundant = 0usize;
            for msg in tx.msgs() {
                let Msg::Ibc(ibc) = msg else { continue };
                match ibc {
                    IbcMsg::UpdateClient {
                        client_id, header, ..
                    } => self.ibc.update_client(&ctx, client_id, header)?,
                    packet_msg => {
                        packets += 1;
                        if self.ibc.check_packet(&ctx, packet_msg)? == RelayOutcome::Noop {
                            redundant += 1;
                        }
                    }
                }
            }
            if packets > 0 && redundant == packets {
                return Err(AnteError::RedundantTx);
            }
        }
        next.run(ctx, tx, simulate)
    }
}
