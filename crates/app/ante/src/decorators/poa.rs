//! Policy overlays for chains with a permissioned validator set.

use evmd_math::Dec;

use crate::chain::{AnteDecorator, Next, Step};
use crate::context::Context;
use crate::error::{AnteError, AnteResult};
use crate::tx::{Msg, Tx};

/// Whether `pred` holds for any message, looking inside authz executions.
fn any_msg(msgs: &[Msg], pred: &impl Fn(&Msg) -> bool) -> bool {
    msgs.iter().any(|msg| match msg {
        Msg::Exec { msgs, .. } => any_msg(msgs, pred),
        other => pred(other),
    })
}

/// Staking is managed by the validator-set admin, not by delegations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisableStakingDecorator;

impl AnteDecorator for DisableStakingDecorator {
    fn step(&self) -> Step {
        Step::DisableStaking
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let is_staking = |m: &Msg| {
            matches!(
                m,
                Msg::Delegate { .. }
                    | Msg::Undelegate { .. }
                    | Msg::BeginRedelegate { .. }
                    | Msg::CancelUnbondingDelegation { .. }
            )
        };
        if any_msg(tx.msgs(), &is_staking) {
            return Err(AnteError::StakingActionNotAllowed);
        }
        next.run(ctx, tx, simulate)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisableWithdrawRewardsDecorator;

impl AnteDecorator for DisableWithdrawRewardsDecorator {
    fn step(&self) -> Step {
        Step::DisableWithdrawRewards
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let is_withdraw = |m: &Msg| matches!(m, Msg::WithdrawDelegatorReward { .. });
        if any_msg(tx.msgs(), &is_withdraw) {
            return Err(AnteError::WithdrawRewardsNotAllowed);
        }
        next.run(ctx, tx, simulate)
    }
}

/// Keeps validator commission rates within `[floor, ceil]`.
#[derive(Debug, Clone, Copy)]
pub struct CommissionLimitDecorator {
    validate_gentx: bool,
    floor: Dec,
    ceil: Dec,
}

impl CommissionLimitDecorator {
    /// Genesis transactions (height <= 1) are exempt unless
    /// `validate_gentx` is set.
    pub fn new(validate_gentx: bool, floor: Dec, ceil: Dec) -> Self {
        Self {
            validate_gentx,
            floor,
            ceil,
        }
    }

    fn check(&self, rate: Dec) -> AnteResult<()> {
        if rate < self.floor || rate > self.ceil {
            return Err(AnteError::CommissionOutOfRange {
                rate: rate.to_string(),
                floor: self.floor.to_string(),
                ceil: self.ceil.to_string(),
            });
        }
        Ok(())
    }

    fn check_msgs(&self, msgs: &[Msg]) -> AnteResult<()> {
        for msg in msgs {
            match msg {
                Msg::CreateValidator {
                    commission_rate, ..
                } => self.check(*commission_rate)?,
                Msg::EditValidator {
                    commission_rate: Some(rate),
                    ..
                } => self.check(*rate)?,
                Msg::Exec { msgs, .. } => self.check_msgs(msgs)?,
                _ => {}
            }
        }
        Ok(())
    }
}

impl AnteDecorator for CommissionLimitDecorator {
    fn step(&self) -> Step {
        Step::CommissionLimit
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if ctx.block_height() <= 1 && !self.validate_gentx {
            return next.run(ctx, tx, simulate);
        }
        self.check_msgs(tx.msgs())?;
        next.run(ctx, tx, simulate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::Address;

    fn edit(rate: &str) -> Msg {
        Msg::EditValidator {
            validator: Address([3; 20]),
            commission_rate: Some(rate.parse().unwrap()),
        }
    }

    #[test]
    fn test_commission_bounds_inclusive() {
        let limit = CommissionLimitDecorator::new(false, Dec::percent(10), Dec::percent(50));
        assert!(limit.check_msgs(&[edit("0.10"), edit("0.50"), edit("0.25")]).is_ok());
        assert!(limit.check_msgs(&[edit("0.60")]).is_err());
        assert!(limit.check_msgs(&[edit("0.05")]).is_err());
    }

    #[test]
    fn test_commission_checked_inside_exec() {
        let limit = CommissionLimitDecorator::new(false, Dec::percent(10), Dec::percent(50));
        let exec = Msg::Exec {
            grantee: Address([4; 20]),
            msgs: vec![edit("0.90")],
        };
        assert!(matches!(
            limit.check_msgs(&[exec]),
            Err(AnteError::CommissionOutOfRange { .. })
        ));
    }

    #[test]
    fn test_edit_without_rate_passes() {
        let limit = CommissionLimitDecorator::new(false, Dec::percent(10), Dec::percent(50));
        let msg = Msg::EditValidator {
            validator: Address([3; 20]),
            commission_rate: None,
        };
        assert!(limit.check_msgs(&[msg]).is_ok());
    }
}
