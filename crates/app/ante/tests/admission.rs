//! End-to-end admission through the standard chain.

use evmd_ante::coins::{Coins, DecCoin, DecCoins};
use evmd_ante::context::ExecMode;
use evmd_ante::error::AnteError;
use evmd_ante::keepers::FEE_COLLECTOR;
use evmd_ante::options::{Module, ModuleSet};
use evmd_ante::tx::{Address, IbcMsg, Msg, Packet, EXT_DYNAMIC_FEE_TX};
use evmd_ante_testing::{check_ctx, ctx_at, finalize_ctx, TxBuilder, DENOM};

mod common;
use common::{Fixture, FUNDS};

fn recv_packet(signer: Address, sequence: u64) -> Msg {
    Msg::Ibc(IbcMsg::RecvPacket {
        packet: Packet {
            sequence,
            source_port: "transfer".into(),
            source_channel: "channel-7".into(),
            destination_port: "transfer".into(),
            destination_channel: "channel-0".into(),
            data: vec![1, 2, 3],
        },
        signer,
    })
}

#[test]
fn test_accepted_tx_pays_fee_and_bumps_sequence() {
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(1);
    let handler = fx.handler();

    let tx = TxBuilder::send(signer.address(), 5)
        .fee(Coins::single(DENOM, 400_000))
        .gas(200_000)
        .sign(&[(&signer.key, signer.account_number, 0)]);
    let ctx = handler.admit(check_ctx(10), &tx, false).unwrap();

    assert_eq!(ctx.priority(), 2);
    assert!(ctx.gas_meter().consumed() > 1000);
    assert_eq!(fx.state.balance(&signer.address(), DENOM), FUNDS - 400_000);
    assert_eq!(fx.state.module_balance(FEE_COLLECTOR, DENOM), 400_000);
    assert_eq!(fx.state.sequence(&signer.address()), Some(1));
    assert_eq!(
        fx.state.account(&signer.address()).unwrap().pub_key,
        Some(signer.key.pub_key())
    );
    assert!(ctx
        .events()
        .iter()
        .any(|e| e.kind == "tx" && e.get("fee") == Some("400000aevmd")));
}

#[test]
fn test_replayed_tx_fails_on_sequence() {
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(2);
    let handler = fx.handler();

    let tx = TxBuilder::send(signer.address(), 5).sign(&[(&signer.key, signer.account_number, 0)]);
    handler.admit(check_ctx(10), &tx, false).unwrap();
    let err = handler.admit(check_ctx(10), &tx, false).unwrap_err();
    assert_eq!(err, AnteError::WrongSequence { expected: 1, got: 0 });
    assert_eq!(fx.state.sequence(&signer.address()), Some(1));
}

#[test]
fn test_bad_signature_leaves_sequence_untouched() {
    let fx = Fixture::new(ModuleSet::all());
    let signer = fx.signer(3);
    let handler = fx.handler();

    // Signed for another chain.
    let tx = TxBuilder::send(signer.address(), 5)
        .chain_id("other-chain")
        .sign(&[(&signer.key, signer.account_number, 0)]);
    let before = fx.state.sequence(&signer.address());
    let err = handler.admit(check_ctx(10), &tx, false).unwrap_err();

    assert!(matches!(err, AnteError::Unauthorized(_)));
    assert_eq!(fx.state.sequence(&signer.address()), before);
}

#[test]
fn test_recheck_skips_signature_verification() {
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(4);
    let handler = fx.handler();

    let tx = TxBuilder::send(signer.address(), 5)
        .chain_id("other-chain")
        .sign(&[(&signer.key, signer.account_number, 0)]);
    handler
        .admit(ctx_at(10, ExecMode::ReCheck), &tx, false)
        .unwrap();
    assert_eq!(fx.state.sequence(&signer.address()), Some(1));
}

#[test]
fn test_memo_and_timeout_limits() {
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(5);
    let handler = fx.handler();

    let tx = TxBuilder::send(signer.address(), 5)
        .memo("x".repeat(257))
        .sign(&[(&signer.key, signer.account_number, 0)]);
    assert_eq!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::MemoTooLarge { max: 256, got: 257 }
    );

    // 256 characters but 768 bytes.
    let tx = TxBuilder::send(signer.address(), 5)
        .memo("€".repeat(256))
        .sign(&[(&signer.key, signer.account_number, 0)]);
    assert_eq!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::MemoTooLarge { max: 256, got: 768 }
    );

    let tx = TxBuilder::send(signer.address(), 5)
        .timeout_height(9)
        .sign(&[(&signer.key, signer.account_number, 0)]);
    assert_eq!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::TxTimeoutHeight {
            height: 10,
            timeout: 9
        }
    );
    assert_eq!(fx.state.balance(&signer.address(), DENOM), FUNDS);

    let tx = TxBuilder::send(signer.address(), 5)
        .memo("€".repeat(85))
        .sign(&[(&signer.key, signer.account_number, 0)]);
    assert_eq!(tx.memo().len(), 255);
    let result = handler.admit(check_ctx(10), &tx, false);
    assert!(result.is_ok(), "{:?}", result.as_ref().err());
    assert_eq!(fx.state.sequence(&signer.address()), Some(1));
}

#[test]
fn test_local_min_gas_prices_apply_in_check_tx_only() {
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(6);
    let handler = fx.handler();
    let prices = DecCoins::new(vec![DecCoin::new(DENOM, "0.5".parse().unwrap())]);

    let tx = TxBuilder::send(signer.address(), 5)
        .fee(Coins::single(DENOM, 99_999))
        .gas(200_000)
        .sign(&[(&signer.key, signer.account_number, 0)]);
    let err = handler
        .admit(check_ctx(10).with_min_gas_prices(prices.clone()), &tx, false)
        .unwrap_err();
    assert!(matches!(err, AnteError::InsufficientFee(_)));

    handler
        .admit(finalize_ctx(10).with_min_gas_prices(prices), &tx, false)
        .unwrap();
}

#[test]
fn test_gas_limit_exhaustion_reports_limit() {
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(7);
    let handler = fx.handler();

    let tx = TxBuilder::send(signer.address(), 5)
        .fee(Coins::single(DENOM, 1_000))
        .gas(1_000)
        .sign(&[(&signer.key, signer.account_number, 0)]);
    match handler.admit(check_ctx(10), &tx, false).unwrap_err() {
        AnteError::OutOfGas {
            descriptor, limit, ..
        } => {
            assert_eq!(descriptor, "txSize");
            assert_eq!(limit, 1_000);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_fee_grant_pays_for_grantee() {
    let fx = Fixture::new(ModuleSet::none());
    let grantee = fx.signer(8);
    let granter = fx.signer(9);
    fx.state.grant_allowance(
        granter.address(),
        grantee.address(),
        Coins::single(DENOM, 500_000),
    );
    let handler = fx.handler();

    let tx = TxBuilder::send(grantee.address(), 5)
        .granter(granter.address())
        .sign(&[(&grantee.key, grantee.account_number, 0)]);
    handler.admit(check_ctx(10), &tx, false).unwrap();

    assert_eq!(fx.state.balance(&grantee.address(), DENOM), FUNDS);
    assert_eq!(fx.state.balance(&granter.address(), DENOM), FUNDS - 200_000);

    // No allowance the other way round.
    let tx = TxBuilder::send(granter.address(), 5)
        .granter(grantee.address())
        .sign(&[(&granter.key, granter.account_number, 0)]);
    assert!(matches!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::Unauthorized(_)
    ));
}

#[test]
fn test_missing_fee_collector_is_a_logic_error() {
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(10);
    fx.state.remove_module_account(FEE_COLLECTOR);
    let handler = fx.handler();

    let tx = TxBuilder::send(signer.address(), 5).sign(&[(&signer.key, signer.account_number, 0)]);
    assert!(matches!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::Logic(_)
    ));
}

#[test]
fn test_unknown_extension_option_rejected() {
    let fx = Fixture::new(ModuleSet::none());
    let signer = fx.signer(11);
    let handler = fx.handler();

    // Without the evm module nothing accepts the dynamic-fee option.
    let tx = TxBuilder::send(signer.address(), 5)
        .extension(EXT_DYNAMIC_FEE_TX)
        .sign(&[(&signer.key, signer.account_number, 0)]);
    assert_eq!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::UnknownExtensionOptions(EXT_DYNAMIC_FEE_TX.to_string())
    );

    let tx = TxBuilder::send(signer.address(), 5)
        .extension("/cosmos.custom.v1.Ext")
        .sign(&[(&signer.key, signer.account_number, 0)]);
    assert!(matches!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::UnknownExtensionOptions(_)
    ));
}

#[test]
fn test_redundant_relay_rejected_in_check_tx() {
    let fx = Fixture::new(ModuleSet::none());
    let relayer = fx.signer(12);
    fx.state.mark_relayed("channel-0", 1);
    let handler = fx.handler();

    let tx = TxBuilder::new()
        .msg(recv_packet(relayer.address(), 1))
        .sign(&[(&relayer.key, relayer.account_number, 0)]);
    // Simulation sees the same verdict and writes nothing.
    assert_eq!(
        handler.admit(check_ctx(10), &tx, true).unwrap_err(),
        AnteError::RedundantTx
    );
    assert_eq!(fx.state.sequence(&relayer.address()), Some(0));
    assert_eq!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::RedundantTx
    );

    // One fresh packet makes the relay worthwhile.
    let tx = TxBuilder::new()
        .msg(recv_packet(relayer.address(), 1))
        .msg(recv_packet(relayer.address(), 2))
        .sign(&[(&relayer.key, relayer.account_number, 1)]);
    handler.admit(check_ctx(10), &tx, false).unwrap();
}

#[test]
fn test_poa_blocks_staking_even_through_authz() {
    let fx = Fixture::new(ModuleSet::none().with(Module::Poa));
    let signer = fx.signer(13);
    let handler = fx.handler();

    let delegate = Msg::Delegate {
        delegator: Address([7; 20]),
        validator: Address([8; 20]),
        amount: evmd_ante::coins::Coin::new(DENOM, 10),
    };
    let tx = TxBuilder::new()
        .msg(Msg::Exec {
            grantee: signer.address(),
            msgs: vec![delegate],
        })
        .sign(&[(&signer.key, signer.account_number, 0)]);
    assert_eq!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::StakingActionNotAllowed
    );
}

#[test]
fn test_consumer_accepts_only_ibc_before_provider_channel() {
    let fx = Fixture::new(ModuleSet::none().with(Module::Consumer));
    let signer = fx.signer(14);
    fx.state.set_provider_channel(None);
    let handler = fx.handler();

    let tx = TxBuilder::send(signer.address(), 5).sign(&[(&signer.key, signer.account_number, 0)]);
    assert_eq!(
        handler.admit(check_ctx(10), &tx, false).unwrap_err(),
        AnteError::UnsupportedMessages { height: 10 }
    );

    let tx = TxBuilder::new()
        .msg(recv_packet(signer.address(), 4))
        .sign(&[(&signer.key, signer.account_number, 0)]);
    handler.admit(check_ctx(10), &tx, false).unwrap();
}

#[test]
fn test_wasm_counts_transactions_per_block() {
    let fx = Fixture::new(ModuleSet::none().with(Module::Wasm));
    let a = fx.signer(15);
    let b = fx.signer(16);
    let handler = fx.handler();

    for signer in [&a, &b] {
        let tx = TxBuilder::send(signer.address(), 5).sign(&[(&signer.key, signer.account_number, 0)]);
        let ctx = handler.admit(finalize_ctx(20), &tx, false).unwrap();
        assert!(ctx.extension::<evmd_ante::decorators::TxCounter>().is_some());
    }
    assert_eq!(fx.state.tx_counter(), Some((20, 2)));
}
