use std::sync::Arc;

use crate::chain::{AnteDecorator, Next, Step};
use crate::coins::Coins;
use crate::context::{Context, Event};
use crate::error::{AnteError, AnteResult};
use crate::keepers::{
    AccountKeeper, AddressCodec, BankKeeper, FeegrantKeeper, TxFeeChecker, FEE_COLLECTOR,
};
use crate::tx::Tx;

/// Default fee checker.
///
/// In CheckTx the fee must cover the validator's local minimum gas prices
/// in at least one denom. Priority is the lowest per-gas price across fee
/// coins.
pub fn check_tx_fee_with_validator_min_gas_prices(
    ctx: &Context,
    tx: &Tx,
) -> AnteResult<(Coins, u64)> {
    let fee = tx.fee().clone();
    let gas = tx.gas_limit();

    if ctx.is_check_tx() && !ctx.min_gas_prices().is_zero() {
        let required = ctx.min_gas_prices().required_fees(gas)?;
        if !fee.is_any_gte(&required) {
            return Err(AnteError::InsufficientFee(format!(
                "insufficient fees; got: {fee} required: {required}"
            )));
        }
    }

    let priority = tx_priority(&fee, gas);
    Ok((fee, priority))
}

fn default_fee_checker() -> TxFeeChecker {
    Arc::new(check_tx_fee_with_validator_min_gas_prices)
}

/// Minimum over fee coins of `amount / gas`, saturating at `u64::MAX`.
pub fn tx_priority(fee: &Coins, gas: u64) -> u64 {
    if gas == 0 {
        return 0;
    }
    fee.iter()
        .map(|coin| u64::try_from(coin.amount / u128::from(gas)).unwrap_or(u64::MAX))
        .min()
        .unwrap_or(0)
}

/// Charges the fee to the payer, or to a fee granter that allows it, and
/// sets the transaction priority.
pub struct DeductFeeDecorator {
    accounts: Arc<dyn AccountKeeper>,
    bank: Arc<dyn BankKeeper>,
    feegrant: Option<Arc<dyn FeegrantKeeper>>,
    codec: Arc<dyn AddressCodec>,
    fee_checker: TxFeeChecker,
}

impl DeductFeeDecorator {
    pub fn new(
        accounts: Arc<dyn AccountKeeper>,
        bank: Arc<dyn BankKeeper>,
        feegrant: Option<Arc<dyn FeegrantKeeper>>,
        codec: Arc<dyn AddressCodec>,
        fee_checker: Option<TxFeeChecker>,
    ) -> Self {
        Self {
            accounts,
            bank,
            feegrant,
            codec,
            fee_checker: fee_checker.unwrap_or_else(default_fee_checker),
        }
    }

    fn deduct(&self, ctx: &mut Context, tx: &Tx, fee: &Coins) -> AnteResult<()> {
        if self.accounts.module_address(FEE_COLLECTOR).is_none() {
            return Err(AnteError::Logic(format!(
                "fee collector module account ({FEE_COLLECTOR}) has not been set"
            )));
        }

        let payer = tx
            .fee_payer()
            .ok_or_else(|| AnteError::InvalidRequest("transaction has no fee payer".into()))?;
        let mut deduct_from = payer;

        if let Some(granter) = tx.fee_granter().filter(|g| *g != payer) {
            let feegrant = self.feegrant.as_ref().ok_or_else(|| {
                AnteError::InvalidRequest("fee grants are not enabled".into())
            })?;
            feegrant
                .use_granted_fees(ctx, &granter, &payer, fee, tx.msgs())
                .map_err(|e| {
                    AnteError::Unauthorized(format!(
                        "{} does not allow to pay fees for {}: {e}",
                        self.codec.bytes_to_string(&granter),
                        self.codec.bytes_to_string(&payer)
                    ))
                })?;
            deduct_from = granter;
        }

        if self.accounts.get_account(ctx, &deduct_from).is_none() {
            return Err(AnteError::UnknownAddress(format!(
                "fee payer address: {} does not exist",
                self.codec.bytes_to_string(&deduct_from)
            )));
        }

        if !fee.is_zero() {
            fee.validate()
                .map_err(|e| AnteError::InsufficientFee(format!("invalid fee amount: {e}")))?;
            self.bank
                .send_coins_from_account_to_module(ctx, &deduct_from, FEE_COLLECTOR, fee)?;
        }

        ctx.emit_event(
            Event::new("tx")
                .attr("fee", fee.to_string())
                .attr("fee_payer", self.codec.bytes_to_string(&deduct_from)),
        );
        Ok(())
    }
}

impl AnteDecorator for DeductFeeDecorator {
    fn step(&self) -> Step {
        Step::DeductFee
    }

    fn ante_handle(
        &self,
        mut ctx: Context,
        tx: &Tx,
        simulate: bool,
        next: Next<'_>,
    ) -> AnteResult<Context> {
        if !simulate && ctx.block_height() > 0 && tx.gas_limit() == 0 {
            return Err(AnteError::InvalidGasLimit("must provide positive gas".into()));
        }

        let (fee, priority) = if simulate {
            (tx.fee().clone(), 0)
        } else {
            (self.fee_checker)(&ctx, tx)?
        };

        self.deduct(&mut ctx, tx, &fee)?;
        next.run(ctx.with_priority(priority), tx, simulate)
    }
}
