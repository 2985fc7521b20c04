//! Proptest strategies for build profiles and messages.

use evmd_ante::coins::{Coin, Coins};
use evmd_ante::options::ModuleSet;
use evmd_ante::tx::{Address, Msg};
use evmd_math::Dec;
use proptest::prelude::*;

use crate::DENOM;

/// Any combination of optional modules.
pub fn arb_module_set() -> impl Strategy<Value = ModuleSet> {
    (0u8..16).prop_map(ModuleSet::from_bits)
}

pub fn arb_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>()
        .prop_filter("non-zero address", |b| *b != [0u8; 20])
        .prop_map(Address)
}

/// Commission rates in steps of 0.01 from 0.00 to 1.00.
pub fn arb_commission_rate() -> impl Strategy<Value = Dec> {
    (0u64..=100).prop_map(Dec::percent)
}

/// Messages with no module-specific policy attached.
pub fn arb_plain_msg() -> impl Strategy<Value = Msg> {
    (arb_address(), arb_address(), 1u128..1_000_000).prop_map(|(from, to, amount)| Msg::Send {
        from,
        to,
        amount: Coins::new(vec![Coin::new(DENOM, amount)]),
    })
}

/// Staking actions the permissioned validator set forbids.
pub fn arb_staking_msg() -> impl Strategy<Value = Msg> {
    (arb_address(), arb_address(), 1u128..1_000_000).prop_flat_map(|(delegator, validator, amount)| {
        let amount = Coin::new(DENOM, amount);
        prop_oneof![
            Just(Msg::Delegate {
                delegator,
                validator,
                amount: amount.clone(),
            }),
            Just(Msg::Undelegate {
                delegator,
                validator,
                amount: amount.clone(),
            }),
            Just(Msg::BeginRedelegate {
                delegator,
                src_validator: validator,
                dst_validator: delegator,
                amount: amount.clone(),
            }),
            Just(Msg::CancelUnbondingDelegation {
                delegator,
                validator,
                amount,
                creation_height: 1,
            }),
        ]
    })
}
