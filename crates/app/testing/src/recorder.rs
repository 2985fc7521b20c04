//! Decorator wrapper that records which steps ran.

use std::sync::Arc;

use evmd_ante::chain::{AnteDecorator, Next, Step};
use evmd_ante::context::Context;
use evmd_ante::error::AnteResult;
use evmd_ante::tx::Tx;
use parking_lot::Mutex;

/// Steps in the order they were entered.
pub type StepLog = Arc<Mutex<Vec<Step>>>;

pub struct RecordingDecorator {
    inner: Box<dyn AnteDecorator>,
    log: StepLog,
}

impl AnteDecorator for RecordingDecorator {
    fn step(&self) -> Step {
        self.inner.step()
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        self.log.lock().push(self.inner.step());
        self.inner.ante_handle(ctx, tx, simulate, next)
    }
}

/// Wraps every decorator so entries land in one shared log.
pub fn record_all(decorators: Vec<Box<dyn AnteDecorator>>) -> (Vec<Box<dyn AnteDecorator>>, StepLog) {
    let log = StepLog::default();
    let wrapped = decorators
        .into_iter()
        .map(|inner| {
            Box::new(RecordingDecorator {
                inner,
                log: log.clone(),
            }) as Box<dyn AnteDecorator>
        })
        .collect();
    (wrapped, log)
}
