//! Simulation runs the full chain for gas estimation and leaves no trace.

use evmd_ante::options::ModuleSet;
use evmd_ante::tx::{SignMode, SignerInfo};
use evmd_ante_testing::{check_ctx, eth_tx, EthTxParams, TxBuilder};

mod common;
use common::Fixture;

#[test]
fn test_simulate_leaves_state_untouched() {
    let fx = Fixture::new(ModuleSet::all());
    let signer = fx.signer(1);
    let handler = fx.handler();
    let before = fx.state.snapshot();

    let tx = TxBuilder::send(signer.address(), 5).sign(&[(&signer.key, signer.account_number, 0)]);
    let first = handler.admit(check_ctx(10), &tx, true).unwrap();
    let second = handler.admit(check_ctx(10), &tx, true).unwrap();

    assert_eq!(fx.state.snapshot(), before);
    assert_eq!(first.gas_meter().consumed(), second.gas_meter().consumed());
    assert!(first.is_simulate());
}

#[test]
fn test_simulate_accepts_unsigned_tx() {
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(2);
    let handler = fx.handler();

    let unsigned = TxBuilder::send(signer.address(), 5).unsigned(vec![SignerInfo {
        public_key: None,
        mode: SignMode::Direct,
        sequence: 0,
    }]);
    let estimate = handler.admit(check_ctx(10), &unsigned, true).unwrap();

    // The same transaction fails outside simulation.
    assert!(handler.admit(check_ctx(10), &unsigned, false).is_err());

    // Missing keys and signatures are charged as if present, so the
    // estimate covers the signed transaction.
    let signed = TxBuilder::send(signer.address(), 5).sign(&[(&signer.key, signer.account_number, 0)]);
    let real = handler.admit(check_ctx(10), &signed, false).unwrap();
    assert!(estimate.gas_meter().consumed() >= real.gas_meter().consumed());
    assert_eq!(fx.state.sequence(&signer.address()), Some(1));
}

#[test]
fn test_simulate_evm_tx_leaves_state_untouched() {
    let fx = Fixture::new(ModuleSet::all());
    let key = fx.eth_signer(3);
    let handler = fx.handler();
    let before = fx.state.snapshot();

    let ctx = handler
        .admit(check_ctx(10), &eth_tx(&key, EthTxParams::default()), true)
        .unwrap();
    assert_eq!(ctx.gas_meter().limit(), 21_000);
    assert_eq!(fx.state.snapshot(), before);
}
