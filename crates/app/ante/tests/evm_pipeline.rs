//! EVM transactions bypass the standard chain and are admitted by a single
//! decorator.

use evmd_ante::chain::Step;
use evmd_ante::coins::Coins;
use evmd_ante::error::AnteError;
use evmd_ante::keepers::{FeeMarketParams, FEE_COLLECTOR};
use evmd_ante::options::{Module, ModuleSet};
use evmd_ante::tx::{Msg, EXT_DYNAMIC_FEE_TX};
use evmd_ante::{variant_for, Dec, Variant};
use evmd_ante_testing::{check_ctx, eth_tx, EthTxParams, TxBuilder, DENOM, EVM_CHAIN_ID};

mod common;
use common::{Fixture, FUNDS};

const MAX_GAS_WANTED: u64 = 50_000;

fn evm_fixture() -> Fixture {
    let mut fx = Fixture::new(ModuleSet::none().with(Module::Evm));
    fx.options.policy.max_tx_gas_wanted = MAX_GAS_WANTED;
    fx
}

#[test]
fn test_gas_wanted_ceiling_is_inclusive() {
    let fx = evm_fixture();
    let key = fx.eth_signer(1);
    let handler = fx.handler();

    let over = eth_tx(
        &key,
        EthTxParams {
            gas_limit: MAX_GAS_WANTED + 1,
            ..EthTxParams::default()
        },
    );
    assert_eq!(
        handler.admit(check_ctx(10), &over, false).unwrap_err(),
        AnteError::GasWantedExceeded {
            wanted: MAX_GAS_WANTED + 1,
            max: MAX_GAS_WANTED
        }
    );
    assert_eq!(fx.state.sequence(&key.eth_address()), Some(0));

    let at_max = eth_tx(
        &key,
        EthTxParams {
            gas_limit: MAX_GAS_WANTED,
            ..EthTxParams::default()
        },
    );
    let ctx = handler.admit(check_ctx(10), &at_max, false).unwrap();
    assert_eq!(ctx.gas_meter().limit(), MAX_GAS_WANTED);
    assert_eq!(fx.state.sequence(&key.eth_address()), Some(1));
    assert_eq!(
        fx.state.balance(&key.eth_address(), DENOM),
        FUNDS - 10 * u128::from(MAX_GAS_WANTED)
    );
    assert_eq!(
        fx.state.module_balance(FEE_COLLECTOR, DENOM),
        10 * u128::from(MAX_GAS_WANTED)
    );
}

#[test]
fn test_evm_tx_bypasses_standard_chain() {
    let fx = evm_fixture();
    let key = fx.eth_signer(2);
    let handler = fx.handler();

    let tx = eth_tx(&key, EthTxParams::default());
    assert_eq!(variant_for(&tx).unwrap(), Variant::Evm);
    assert_eq!(handler.evm_chain().unwrap().steps(), vec![Step::EvmMono]);

    // No signer infos or signatures: the standard chain would reject this.
    assert!(tx.signer_infos().is_empty());
    handler.admit(check_ctx(10), &tx, false).unwrap();
}

#[test]
fn test_evm_tx_rejected_without_evm_module() {
    let fx = Fixture::new(ModuleSet::none());
    let key = fx.eth_signer(3);
    let handler = fx.handler();

    assert!(handler.evm_chain().is_none());
    let err = handler
        .admit(check_ctx(10), &eth_tx(&key, EthTxParams::default()), false)
        .unwrap_err();
    assert!(matches!(err, AnteError::UnknownExtensionOptions(_)));
}

#[test]
fn test_nonce_and_chain_id_checks() {
    let fx = evm_fixture();
    let key = fx.eth_signer(4);
    let handler = fx.handler();

    let stale = eth_tx(
        &key,
        EthTxParams {
            nonce: 3,
            ..EthTxParams::default()
        },
    );
    assert_eq!(
        handler.admit(check_ctx(10), &stale, false).unwrap_err(),
        AnteError::WrongSequence {
            expected: 0,
            got: 3
        }
    );

    let foreign = eth_tx(
        &key,
        EthTxParams {
            chain_id: Some(EVM_CHAIN_ID + 1),
            ..EthTxParams::default()
        },
    );
    assert!(matches!(
        handler.admit(check_ctx(10), &foreign, false).unwrap_err(),
        AnteError::InvalidChainId(_)
    ));

    let unprotected = eth_tx(
        &key,
        EthTxParams {
            chain_id: None,
            ..EthTxParams::default()
        },
    );
    assert!(matches!(
        handler.admit(check_ctx(10), &unprotected, false).unwrap_err(),
        AnteError::Unauthorized(_)
    ));
}

#[test]
fn test_tampered_evm_tx_fails_signature() {
    let fx = evm_fixture();
    let key = fx.eth_signer(5);
    let handler = fx.handler();

    let mut tx = eth_tx(&key, EthTxParams::default());
    if let Msg::EthereumTx(msg) = &mut tx.body.messages[0] {
        msg.value = 1;
    }
    assert!(matches!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::Unauthorized(_)
    ));
    assert_eq!(fx.state.sequence(&key.eth_address()), Some(0));

    // Simulation does not verify signatures.
    handler.admit(check_ctx(10), &tx, true).unwrap();
    assert_eq!(fx.state.sequence(&key.eth_address()), Some(0));
}

#[test]
fn test_base_fee_rules() {
    let fx = evm_fixture();
    let key = fx.eth_signer(6);
    fx.state.set_fee_market(FeeMarketParams {
        no_base_fee: false,
        base_fee: 8,
        min_gas_price: Dec::ZERO,
        enable_height: 0,
    });
    let handler = fx.handler();

    let below_base = eth_tx(
        &key,
        EthTxParams {
            gas_fee_cap: 7,
            gas_tip_cap: 0,
            ..EthTxParams::default()
        },
    );
    assert!(matches!(
        handler.admit(check_ctx(10), &below_base, false).unwrap_err(),
        AnteError::InsufficientFee(_)
    ));

    let tip_over_cap = eth_tx(
        &key,
        EthTxParams {
            gas_fee_cap: 10,
            gas_tip_cap: 11,
            ..EthTxParams::default()
        },
    );
    assert!(matches!(
        handler.admit(check_ctx(10), &tip_over_cap, false).unwrap_err(),
        AnteError::InvalidRequest(_)
    ));

    // Effective price min(10, 8 + 1) = 9, tip 1.
    let ok = eth_tx(&key, EthTxParams::default());
    let ctx = handler.admit(check_ctx(10), &ok, false).unwrap();
    assert_eq!(ctx.priority(), 1);
    assert_eq!(fx.state.balance(&key.eth_address(), DENOM), FUNDS - 9 * 21_000);
    assert_eq!(fx.state.transient_gas_wanted(), 21_000);
}

#[test]
fn test_global_min_gas_price() {
    let fx = evm_fixture();
    let key = fx.eth_signer(7);
    fx.state.set_fee_market(FeeMarketParams {
        no_base_fee: true,
        base_fee: 0,
        min_gas_price: Dec::from_u64(20),
        enable_height: 0,
    });
    let handler = fx.handler();

    let err = handler
        .admit(check_ctx(10), &eth_tx(&key, EthTxParams::default()), false)
        .unwrap_err();
    assert!(matches!(err, AnteError::InsufficientFee(_)));

    let ok = eth_tx(
        &key,
        EthTxParams {
            gas_fee_cap: 20,
            ..EthTxParams::default()
        },
    );
    handler.admit(check_ctx(10), &ok, false).unwrap();
}

#[test]
fn test_standard_chain_rejects_bare_ethereum_msg() {
    let fx = evm_fixture();
    let signer = fx.signer(8);
    let key = fx.eth_signer(9);
    let handler = fx.handler();

    let wrapped = eth_tx(&key, EthTxParams::default());
    let tx = TxBuilder::new()
        .msg(wrapped.body.messages[0].clone())
        .msg(Msg::Send {
            from: signer.address(),
            to: key.eth_address(),
            amount: Coins::single(DENOM, 1),
        })
        .sign(&[]);
    assert!(matches!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::UnknownRequest(_)
    ));
}

#[test]
fn test_dynamic_fee_extension_accepted_with_evm() {
    let fx = evm_fixture();
    let signer = fx.signer(10);
    let handler = fx.handler();

    let tx = TxBuilder::send(signer.address(), 5)
        .extension(EXT_DYNAMIC_FEE_TX)
        .sign(&[(&signer.key, signer.account_number, 0)]);
    assert_eq!(variant_for(&tx).unwrap(), Variant::Standard);
    handler.admit(check_ctx(10), &tx, false).unwrap();
}

#[test]
fn test_standard_fee_must_cover_base_fee() {
    let fx = evm_fixture();
    let signer = fx.signer(11);
    fx.state.set_fee_market(FeeMarketParams {
        no_base_fee: false,
        base_fee: 2,
        min_gas_price: Dec::ZERO,
        enable_height: 0,
    });
    let handler = fx.handler();

    let cheap = TxBuilder::send(signer.address(), 5)
        .fee(Coins::single(DENOM, 399_999))
        .gas(200_000)
        .sign(&[(&signer.key, signer.account_number, 0)]);
    assert!(matches!(
        handler.admit(check_ctx(10), &cheap, false).unwrap_err(),
        AnteError::InsufficientFee(_)
    ));

    let paid = TxBuilder::send(signer.address(), 5)
        .fee(Coins::single(DENOM, 600_000))
        .gas(200_000)
        .sign(&[(&signer.key, signer.account_number, 0)]);
    let ctx = handler.admit(check_ctx(10), &paid, false).unwrap();
    assert_eq!(ctx.priority(), 1);
    assert_eq!(fx.state.transient_gas_wanted(), 200_000);
}
