//! Per-admission context threaded by value through the decorator chain.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::coins::DecCoins;
use crate::gas::GasMeter;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockHeader {
    pub height: u64,
    /// Unix seconds.
    pub time: u64,
    pub chain_id: String,
}

/// Which admission check is being performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExecMode {
    /// First mempool entry.
    #[default]
    Check,
    /// Re-validation of a mempool entry after a block commits.
    ReCheck,
    /// Dry run for gas estimation. Nothing may persist.
    Simulate,
    /// Pre-execution check of a transaction in a block being finalized.
    Finalize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsensusParams {
    /// Block gas limit; `None` means unlimited.
    pub max_gas: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub kind: String,
    pub attributes: Vec<(String, String)>,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Typed stash for data a decorator derives for those after it.
///
/// Values can be inserted or replaced, never removed.
#[derive(Clone, Default)]
pub struct Extensions(BTreeMap<TypeId, Arc<dyn Any + Send + Sync>>);

impl Extensions {
    pub fn insert<T: Any + Send + Sync>(&mut self, value: T) {
        self.0.insert(TypeId::of::<T>(), Arc::new(value));
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.0
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Extensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Extensions")
            .field("len", &self.0.len())
            .finish()
    }
}

/// Admission context.
///
/// Passed by value: each decorator receives the context, may adjust the
/// fields it owns and hands the result to the rest of the chain.
#[derive(Debug, Clone)]
pub struct Context {
    header: BlockHeader,
    exec_mode: ExecMode,
    gas_meter: GasMeter,
    consensus_params: ConsensusParams,
    min_gas_prices: DecCoins,
    priority: u64,
    events: Vec<Event>,
    extensions: Extensions,
    sigverify: bool,
}

impl Context {
    pub fn new(header: BlockHeader, exec_mode: ExecMode) -> Self {
        Self {
            header,
            exec_mode,
            gas_meter: GasMeter::default(),
            consensus_params: ConsensusParams::default(),
            min_gas_prices: DecCoins::default(),
            priority: 0,
            events: Vec::new(),
            extensions: Extensions::default(),
            sigverify: true,
        }
    }

    pub fn header(&self) -> &BlockHeader {
        &self.header
    }

    pub fn block_height(&self) -> u64 {
        self.header.height
    }

    pub fn chain_id(&self) -> &str {
        &self.header.chain_id
    }

    pub fn exec_mode(&self) -> ExecMode {
        self.exec_mode
    }

    /// True for first and repeated mempool checks.
    pub fn is_check_tx(&self) -> bool {
        matches!(self.exec_mode, ExecMode::Check | ExecMode::ReCheck)
    }

    pub fn is_recheck_tx(&self) -> bool {
        self.exec_mode == ExecMode::ReCheck
    }

    pub fn is_simulate(&self) -> bool {
        self.exec_mode == ExecMode::Simulate
    }

    pub fn gas_meter(&self) -> &GasMeter {
        &self.gas_meter
    }

    pub fn gas_meter_mut(&mut self) -> &mut GasMeter {
        &mut self.gas_meter
    }

    pub fn consensus_params(&self) -> &ConsensusParams {
        &self.consensus_params
    }

    pub fn min_gas_prices(&self) -> &DecCoins {
        &self.min_gas_prices
    }

    pub fn priority(&self) -> u64 {
        self.priority
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn emit_event(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn extension<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn sigverify_enabled(&self) -> bool {
        self.sigverify
    }

    pub fn with_block_height(mut self, height: u64) -> Self {
        self.header.height = height;
        self
    }

    pub fn with_exec_mode(mut self, mode: ExecMode) -> Self {
        self.exec_mode = mode;
        self
    }

    pub fn with_gas_meter(mut self, meter: GasMeter) -> Self {
        self.gas_meter = meter;
        self
    }

    pub fn with_consensus_params(mut self, params: ConsensusParams) -> Self {
        self.consensus_params = params;
        self
    }

    pub fn with_min_gas_prices(mut self, prices: DecCoins) -> Self {
        self.min_gas_prices = prices;
        self
    }

    pub fn with_priority(mut self, priority: u64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }

    pub fn with_extension<T: Any + Send + Sync>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Disables cryptographic signature checks, e.g. for transactions
    /// whose signatures were verified out of band.
    pub fn with_sigverify(mut self, enabled: bool) -> Self {
        self.sigverify = enabled;
        self
    }
}
