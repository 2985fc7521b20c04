//! Shared fixtures for the admission integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use evmd_ante::chain::AnteChain;
use evmd_ante::coins::Coins;
use evmd_ante::options::{HandlerOptions, ModuleSet};
use evmd_ante::pipeline::standard_decorators;
use evmd_ante::tx::Address;
use evmd_ante::AnteHandler;
use evmd_ante_testing::{full_options, record_all, MemState, StepLog, TestKey, DENOM};

pub const FUNDS: u128 = 10_000_000;

/// A funded account with a real key.
pub struct Signer {
    pub key: TestKey,
    pub account_number: u64,
}

impl Signer {
    pub fn address(&self) -> Address {
        self.key.address()
    }
}

pub struct Fixture {
    pub state: Arc<MemState>,
    pub options: HandlerOptions,
}

impl Fixture {
    pub fn new(modules: ModuleSet) -> Self {
        let state = Arc::new(MemState::new());
        let options = full_options(&state, modules);
        Self { state, options }
    }

    pub fn signer(&self, seed: u8) -> Signer {
        let key = TestKey::from_seed(seed);
        let account_number = self.state.create_account(key.address());
        self.state.fund(key.address(), &Coins::single(DENOM, FUNDS));
        Signer {
            key,
            account_number,
        }
    }

    /// A funded EVM account whose key is already on chain.
    pub fn eth_signer(&self, seed: u8) -> TestKey {
        let key = TestKey::from_seed(seed);
        self.state.create_account(key.eth_address());
        self.state.set_pub_key(&key.eth_address(), key.eth_pub_key());
        self.state.fund(key.eth_address(), &Coins::single(DENOM, FUNDS));
        key
    }

    pub fn handler(&self) -> AnteHandler {
        AnteHandler::new(self.options.clone()).expect("handler builds")
    }

    /// The standard chain with every decorator recording into one log.
    pub fn recorded_chain(&self) -> (AnteChain, StepLog) {
        let decorators = standard_decorators(&self.options).expect("decorators build");
        let (wrapped, log) = record_all(decorators);
        (AnteChain::build(wrapped).expect("layout is valid"), log)
    }
}
