//! EVM decorators: fee-market checks on standard transactions and the
//! single decorator that admits EVM transactions.

use std::sync::Arc;

use crate::chain::{AnteDecorator, Next, Step};
use crate::coins::{Coins, DecCoin, DecCoins};
use crate::context::{Context, Event};
use crate::decorators::fee::check_tx_fee_with_validator_min_gas_prices;
use crate::error::{AnteError, AnteResult};
use crate::gas::GasMeter;
use crate::keepers::{
    EvmKeeper, ExtensionOptionChecker, FeeMarketKeeper, TxFeeChecker,
};
use crate::tx::{Any, Msg, MsgEthereumTx, Tx, EXT_DYNAMIC_FEE_TX};

/// Authz nesting depth at which a transaction is rejected outright.
pub const MAX_NESTED_MSGS: usize = 7;

/// Accepts the dynamic-fee extension option and nothing else.
pub fn dynamic_fee_extension_checker() -> ExtensionOptionChecker {
    Arc::new(|opt: &Any| opt.type_url == EXT_DYNAMIC_FEE_TX)
}

/// Fee checker for chains with a fee market.
///
/// Before the base fee activates this is the validator minimum gas price
/// check. Afterwards the fee must pay at least `base_fee` per gas in the
/// EVM denom, and the priority is the per-gas amount paid above it.
pub fn dynamic_fee_checker(
    fee_market: Arc<dyn FeeMarketKeeper>,
    evm: Arc<dyn EvmKeeper>,
) -> TxFeeChecker {
    Arc::new(move |ctx: &Context, tx: &Tx| {
        let params = fee_market.params(ctx);
        let Some(base_fee) = params.base_fee_at(ctx.block_height()) else {
            return check_tx_fee_with_validator_min_gas_prices(ctx, tx);
        };
        let denom = evm.params(ctx).evm_denom;
        let gas = tx.gas_limit();
        if gas == 0 {
            return Err(AnteError::InvalidGasLimit("must provide positive gas".into()));
        }
        let paid = tx.fee().amount_of(&denom);
        let required = base_fee.saturating_mul(u128::from(gas));
        if paid < required {
            return Err(AnteError::InsufficientFee(format!(
                "gas prices too low, got: {paid}{denom} required: {required}{denom}. \
                 Please retry using a higher gas price or a higher fee"
            )));
        }
        Ok((Coins::single(denom, paid), tip_priority(paid, gas, base_fee)))
    })
}

/// Per-gas amount paid above `base_fee`, saturating at both ends.
fn tip_priority(paid: u128, gas: u64, base_fee: u128) -> u64 {
    let price = paid / u128::from(gas.max(1));
    u64::try_from(price.saturating_sub(base_fee)).unwrap_or(u64::MAX)
}

/// EVM transactions must arrive through the EVM pipeline, never as a
/// message of a standard transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectEthereumMessagesDecorator;

impl AnteDecorator for RejectEthereumMessagesDecorator {
    fn step(&self) -> Step {
        Step::RejectEthereumMessages
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if tx.msgs().iter().any(|m| matches!(m, Msg::EthereumTx(_))) {
            return Err(AnteError::UnknownRequest(
                "MsgEthereumTx needs to be contained within a tx with 'ExtensionOptionsEthereumTx' option"
                    .into(),
            ));
        }
        next.run(ctx, tx, simulate)
    }
}

/// Blocks granting or executing disabled message types through authz.
#[derive(Debug, Clone)]
pub struct AuthzLimiterDecorator {
    disabled: Vec<String>,
}

impl AuthzLimiterDecorator {
    pub fn new(disabled: Vec<String>) -> Self {
        Self { disabled }
    }

    fn is_disabled(&self, type_url: &str) -> bool {
        self.disabled.iter().any(|d| d == type_url)
    }

    fn check(&self, msgs: &[Msg], inside_exec: bool, depth: usize) -> AnteResult<()> {
        if depth >= MAX_NESTED_MSGS {
            return Err(AnteError::Unauthorized(format!(
                "found more nested msgs than permitted. Limit is : {MAX_NESTED_MSGS}"
            )));
        }
        for msg in msgs {
            match msg {
                Msg::Exec { msgs, .. } => self.check(msgs, true, depth + 1)?,
                Msg::Grant { msg_type_url, .. } if self.is_disabled(msg_type_url) => {
                    return Err(AnteError::DisabledMessage(msg_type_url.clone()));
                }
                Msg::Grant { .. } => {}
                other if inside_exec && self.is_disabled(other.type_url()) => {
                    return Err(AnteError::DisabledMessage(other.type_url().to_string()));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl AnteDecorator for AuthzLimiterDecorator {
    fn step(&self) -> Step {
        Step::AuthzLimiter
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        self.check(tx.msgs(), false, 1)?;
        next.run(ctx, tx, simulate)
    }
}

/// Enforces the fee market's global minimum gas price on standard
/// transactions. Skipped when the minimum is zero or when simulating.
pub struct MinGasPriceDecorator {
    fee_market: Arc<dyn FeeMarketKeeper>,
    evm: Arc<dyn EvmKeeper>,
}

impl MinGasPriceDecorator {
    pub fn new(fee_market: Arc<dyn FeeMarketKeeper>, evm: Arc<dyn EvmKeeper>) -> Self {
        Self { fee_market, evm }
    }
}

impl AnteDecorator for MinGasPriceDecorator {
    fn step(&self) -> Step {
        Step::MinGasPrice
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let min_gas_price = self.fee_market.params(&ctx).min_gas_price;
        if min_gas_price.is_zero() || simulate {
            return next.run(ctx, tx, simulate);
        }
        let denom = self.evm.params(&ctx).evm_denom;
        let prices = DecCoins::new(vec![DecCoin::new(denom, min_gas_price)]);
        let required = prices.required_fees(tx.gas_limit())?;
        if !tx.fee().is_any_gte(&required) {
            return Err(AnteError::InsufficientFee(format!(
                "provided fee < minimum global fee ({} < {required}). Please increase the gas price.",
                tx.fee()
            )));
        }
        next.run(ctx, tx, simulate)
    }
}

/// Caps gas wanted at the block gas limit and records it in the fee market
/// while the base fee is active.
pub struct GasWantedDecorator {
    fee_market: Arc<dyn FeeMarketKeeper>,
}

impl GasWantedDecorator {
    pub fn new(fee_market: Arc<dyn FeeMarketKeeper>) -> Self {
        Self { fee_market }
    }
}

impl AnteDecorator for GasWantedDecorator {
    fn step(&self) -> Step {
        Step::GasWanted
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let gas_wanted = tx.gas_limit();
        if let Some(block_max) = ctx.consensus_params().max_gas {
            if gas_wanted > block_max {
                return Err(AnteError::BlockGasLimitExceeded {
                    gas: gas_wanted,
                    block_max,
                });
            }
        }
        if self
            .fee_market
            .params(&ctx)
            .base_fee_enabled(ctx.block_height())
        {
            self.fee_market.add_transient_gas_wanted(&ctx, gas_wanted)?;
        }
        next.run(ctx, tx, simulate)
    }
}

/// Admits an EVM transaction on its own.
///
/// Sets up the context, enforces the gas-wanted ceiling and the fee-market
/// rules, and delegates signature, fee and nonce handling to the execution
/// engine. None of the standard decorators run for these transactions.
pub struct EvmMonoDecorator {
    fee_market: Arc<dyn FeeMarketKeeper>,
    evm: Arc<dyn EvmKeeper>,
    max_tx_gas_wanted: u64,
}

impl EvmMonoDecorator {
    /// `max_tx_gas_wanted` of 0 disables the ceiling.
    pub fn new(
        fee_market: Arc<dyn FeeMarketKeeper>,
        evm: Arc<dyn EvmKeeper>,
        max_tx_gas_wanted: u64,
    ) -> Self {
        Self {
            fee_market,
            evm,
            max_tx_gas_wanted,
        }
    }

    fn single_msg(tx: &Tx) -> AnteResult<&MsgEthereumTx> {
        match tx.msgs() {
            [Msg::EthereumTx(msg)] => Ok(msg),
            [other] => Err(AnteError::UnknownRequest(format!(
                "invalid message type {}, expected {}",
                other.type_url(),
                crate::tx::MSG_ETHEREUM_TX
            ))),
            msgs => Err(AnteError::InvalidRequest(format!(
                "expected 1 message, got {}",
                msgs.len()
            ))),
        }
    }

    fn check_gas(&self, ctx: &Context, tx: &Tx, msg: &MsgEthereumTx) -> AnteResult<u64> {
        let gas_wanted = msg.gas_limit;
        if tx.gas_limit() != gas_wanted {
            return Err(AnteError::InvalidGasLimit(format!(
                "tx gas limit {} does not match message gas limit {gas_wanted}",
                tx.gas_limit()
            )));
        }
        if self.max_tx_gas_wanted != 0 && gas_wanted > self.max_tx_gas_wanted {
            return Err(AnteError::GasWantedExceeded {
                wanted: gas_wanted,
                max: self.max_tx_gas_wanted,
            });
        }
        if let Some(block_max) = ctx.consensus_params().max_gas {
            if gas_wanted > block_max {
                return Err(AnteError::BlockGasLimitExceeded {
                    gas: gas_wanted,
                    block_max,
                });
            }
        }
        Ok(gas_wanted)
    }

    fn check_protection(&self, ctx: &Context, msg: &MsgEthereumTx) -> AnteResult<()> {
        let params = self.evm.params(ctx);
        match msg.chain_id {
            Some(id) if id != self.evm.chain_id() => {
                return Err(AnteError::InvalidChainId(format!(
                    "expected {}, got {id}",
                    self.evm.chain_id()
                )));
            }
            None if !params.allow_unprotected_txs => {
                return Err(AnteError::Unauthorized(
                    "rejected unprotected Ethereum transaction; \
                     please sign your transaction according to EIP-155"
                        .into(),
                ));
            }
            _ => {}
        }
        match msg.to {
            None if !params.create_enabled => Err(AnteError::InvalidRequest(
                "failed to create new contract: contract creation is disabled".into(),
            )),
            Some(_) if !params.call_enabled => Err(AnteError::InvalidRequest(
                "failed to call contract: contract calls are disabled".into(),
            )),
            _ => Ok(()),
        }
    }

    /// Returns the effective gas price.
    fn check_fee_market(
        &self,
        ctx: &Context,
        msg: &MsgEthereumTx,
        base_fee: Option<u128>,
        simulate: bool,
    ) -> AnteResult<u128> {
        if msg.gas_tip_cap > msg.gas_fee_cap {
            return Err(AnteError::InvalidRequest(format!(
                "max priority fee per gas higher than max fee per gas ({} > {})",
                msg.gas_tip_cap, msg.gas_fee_cap
            )));
        }
        if let Some(base) = base_fee {
            if msg.gas_fee_cap < base {
                return Err(AnteError::InsufficientFee(format!(
                    "max fee per gas less than block base fee ({} < {base})",
                    msg.gas_fee_cap
                )));
            }
        }

        let params = self.fee_market.params(ctx);
        let denom = self.evm.params(ctx).evm_denom;
        let price = msg.effective_gas_price(base_fee);
        let paid = price.saturating_mul(u128::from(msg.gas_limit));

        if !params.min_gas_price.is_zero() {
            let required = params
                .min_gas_price
                .mul_int_ceil(msg.gas_limit)
                .map_err(|e| AnteError::InsufficientFee(e.to_string()))?;
            if paid < required {
                return Err(AnteError::InsufficientFee(format!(
                    "provided fee < minimum global fee ({paid}{denom} < {required}{denom}). \
                     Please increase the priority tip (for EIP-1559 txs) or the gas prices \
                     (for access list or legacy txs)"
                )));
            }
        }

        if ctx.is_check_tx() && !simulate {
            let local = ctx.min_gas_prices().amount_of(&denom);
            let required = local
                .mul_int_ceil(msg.gas_limit)
                .map_err(|e| AnteError::InsufficientFee(e.to_string()))?;
            if paid < required {
                return Err(AnteError::InsufficientFee(format!(
                    "gas prices too low, got: {paid}{denom} required: {required}{denom}. \
                     Please retry using a higher gas price or a higher fee"
                )));
            }
        }
        Ok(price)
    }
}

impl AnteDecorator for EvmMonoDecorator {
    fn step(&self) -> Step {
        Step::EvmMono
    }

    fn ante_handle(
        &self,
        ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        let msg = Self::single_msg(tx)?;
        let gas_wanted = self.check_gas(&ctx, tx, msg)?;

        // Execution gas is metered by the engine; the meter only carries the
        // limit forward.
        let mut ctx = ctx
            .with_gas_meter(GasMeter::infinite(gas_wanted))
            .with_events(Vec::new())
            .with_priority(0);

        self.check_protection(&ctx, msg)?;

        let fm_params = self.fee_market.params(&ctx);
        let base_fee = fm_params.base_fee_at(ctx.block_height());
        let price = self.check_fee_market(&ctx, msg, base_fee, simulate)?;

        if !simulate && !ctx.is_recheck_tx() && ctx.sigverify_enabled() {
            self.evm.verify_signature(&ctx, msg)?;
        }

        let denom = self.evm.params(&ctx).evm_denom;
        let fee = Coins::single(denom, price.saturating_mul(u128::from(gas_wanted)));
        self.evm.deduct_fee(&ctx, msg, &fee)?;
        self.evm.check_and_increment_nonce(&ctx, msg)?;

        if base_fee.is_some() {
            self.fee_market.add_transient_gas_wanted(&ctx, gas_wanted)?;
        }

        let tip = msg.effective_tip(base_fee);
        ctx.emit_event(
            Event::new("tx")
                .attr("fee", fee.to_string())
                .attr("fee_payer", msg.from.to_string()),
        );
        let ctx = ctx.with_priority(u64::try_from(tip).unwrap_or(u64::MAX));
        next.run(ctx, tx, simulate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tx::{Address, MSG_ETHEREUM_TX};

    fn nested(depth: usize, inner: Msg) -> Msg {
        (0..depth).fold(inner, |msg, _| Msg::Exec {
            grantee: Address([1; 20]),
            msgs: vec![msg],
        })
    }

    fn vesting() -> Msg {
        Msg::CreateVestingAccount {
            from: Address([1; 20]),
            to: Address([2; 20]),
            amount: Coins::single("stake", 1),
        }
    }

    #[test]
    fn test_authz_limiter_blocks_exec_and_grant() {
        let limiter = AuthzLimiterDecorator::new(vec![
            MSG_ETHEREUM_TX.into(),
            crate::tx::MSG_CREATE_VESTING_ACCOUNT.into(),
        ]);
        // Outside authz the message is allowed.
        assert!(limiter.check(&[vesting()], false, 1).is_ok());
        assert!(matches!(
            limiter.check(&[nested(1, vesting())], false, 1),
            Err(AnteError::DisabledMessage(_))
        ));

        let grant = Msg::Grant {
            granter: Address([1; 20]),
            grantee: Address([2; 20]),
            msg_type_url: MSG_ETHEREUM_TX.into(),
        };
        assert!(matches!(
            limiter.check(&[grant], false, 1),
            Err(AnteError::DisabledMessage(_))
        ));
    }

    #[test]
    fn test_tip_priority_saturates() {
        assert_eq!(tip_priority(2_000, 100, 8), 12);
        assert_eq!(tip_priority(800, 100, 8), 0);
        // base_fee * gas saturates, so a fee of u128::MAX passes the
        // required-fee check while paying less than base_fee per gas.
        let base_fee = u128::MAX / 2;
        assert_eq!(base_fee.saturating_mul(4), u128::MAX);
        assert_eq!(tip_priority(u128::MAX, 4, base_fee), 0);
        assert_eq!(tip_priority(u128::MAX, 1, 0), u64::MAX);
    }

    #[test]
    fn test_authz_limiter_nesting_limit() {
        let limiter = AuthzLimiterDecorator::new(vec![]);
        let send = Msg::Send {
            from: Address([1; 20]),
            to: Address([2; 20]),
            amount: Coins::single("stake", 1),
        };
        assert!(limiter.check(&[nested(5, send.clone())], false, 1).is_ok());
        assert!(matches!(
            limiter.check(&[nested(6, send)], false, 1),
            Err(AnteError::Unauthorized(_))
        ));
    }
}
