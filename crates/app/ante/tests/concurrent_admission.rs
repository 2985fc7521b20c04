//! One handler shared across threads admitting independent transactions.

use evmd_ante::coins::Coins;
use evmd_ante::error::AnteError;
use evmd_ante::keepers::FEE_COLLECTOR;
use evmd_ante::options::{Module, ModuleSet};
use evmd_ante_testing::{check_ctx, eth_tx, EthTxParams, TxBuilder, DENOM};
use rayon::prelude::*;

mod common;
use common::{Fixture, FUNDS};

const SIGNERS: u8 = 32;
const FEE: u128 = 250_000;

#[test]
fn test_parallel_admission_is_consistent() {
    let fx = Fixture::new(ModuleSet::all());
    let signers: Vec<_> = (1..=SIGNERS).map(|seed| fx.signer(seed)).collect();
    let handler = fx.handler();

    let txs: Vec<_> = signers
        .iter()
        .map(|s| {
            TxBuilder::send(s.address(), 5)
                .fee(Coins::single(DENOM, FEE))
                .sign(&[(&s.key, s.account_number, 0)])
        })
        .collect();

    let results: Vec<_> = txs
        .par_iter()
        .map(|tx| handler.admit(check_ctx(10), tx, false))
        .collect();

    for result in &results {
        assert!(result.is_ok(), "{:?}", result.as_ref().err());
    }
    for signer in &signers {
        assert_eq!(fx.state.sequence(&signer.address()), Some(1));
        assert_eq!(fx.state.balance(&signer.address(), DENOM), FUNDS - FEE);
    }
    assert_eq!(
        fx.state.module_balance(FEE_COLLECTOR, DENOM),
        FEE * u128::from(SIGNERS)
    );
}

#[test]
fn test_same_signer_racing_on_one_nonce_is_admitted_once() {
    const RACERS: usize = 16;
    let fx = Fixture::new(ModuleSet::none().with(Module::Evm));
    let key = fx.eth_signer(40);
    let handler = fx.handler();
    let tx = eth_tx(&key, EthTxParams::default());

    let results: Vec<_> = (0..RACERS)
        .into_par_iter()
        .map(|_| handler.admit(check_ctx(10), &tx, false))
        .collect();

    let accepted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(accepted, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(*err, AnteError::WrongSequence { expected: 1, got: 0 });
    }
    assert_eq!(fx.state.sequence(&key.eth_address()), Some(1));
}

#[test]
fn test_same_signer_racing_never_overdraws() {
    const RACERS: u64 = 12;
    const AFFORDABLE: u128 = 3;
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(41);
    let handler = fx.handler();

    // Leave exactly three fees behind.
    let drain = FUNDS - AFFORDABLE * FEE;
    let drained = handler.admit(
        check_ctx(10),
        &TxBuilder::send(signer.address(), 5)
            .fee(Coins::single(DENOM, drain))
            .sign(&[(&signer.key, signer.account_number, 0)]),
        false,
    );
    assert!(drained.is_ok(), "{:?}", drained.as_ref().err());
    let collected_before = fx.state.module_balance(FEE_COLLECTOR, DENOM);

    let txs: Vec<_> = (1..=RACERS)
        .map(|sequence| {
            TxBuilder::send(signer.address(), 5)
                .fee(Coins::single(DENOM, FEE))
                .sign(&[(&signer.key, signer.account_number, sequence)])
        })
        .collect();
    let results: Vec<_> = txs
        .par_iter()
        .map(|tx| handler.admit(check_ctx(10), tx, false))
        .collect();

    let insufficient = results
        .iter()
        .filter(|r| matches!(r, Err(AnteError::InsufficientFunds(_))))
        .count() as u128;
    let charged = u128::from(RACERS) - insufficient;
    assert_eq!(charged, AFFORDABLE);
    assert_eq!(fx.state.balance(&signer.address(), DENOM), 0);
    assert_eq!(
        fx.state.module_balance(FEE_COLLECTOR, DENOM) - collected_before,
        AFFORDABLE * FEE
    );
}
