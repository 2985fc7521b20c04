//! Coin amounts and decimal gas prices.

use borsh::{BorshDeserialize, BorshSerialize};
use evmd_math::Dec;
use std::fmt;

use crate::error::{AnteError, AnteResult};

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Denoms start with a letter and are 3..=128 characters of
/// `[a-zA-Z0-9/:._-]`.
pub fn validate_denom(denom: &str) -> AnteResult<()> {
    let len = denom.len();
    let mut chars = denom.chars();
    let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    if !(3..=128).contains(&len) || !first_ok || !rest_ok {
        return Err(AnteError::InvalidCoins(format!("invalid denom: {denom}")));
    }
    Ok(())
}

/// A set of coins. Valid sets are sorted by denom, contain no duplicates and
/// no zero amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn new(mut coins: Vec<Coin>) -> Self {
        coins.retain(|c| c.amount > 0);
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        Self(coins)
    }

    pub fn single(denom: impl Into<String>, amount: u128) -> Self {
        Self::new(vec![Coin::new(denom, amount)])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|c| c.amount == 0)
    }

    pub fn amount_of(&self, denom: &str) -> u128 {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map_or(0, |c| c.amount)
    }

    pub fn validate(&self) -> AnteResult<()> {
        for (i, coin) in self.0.iter().enumerate() {
            validate_denom(&coin.denom)?;
            if coin.amount == 0 {
                return Err(AnteError::InvalidCoins(format!("coin {coin} amount is not positive")));
            }
            if i > 0 && self.0[i - 1].denom >= coin.denom {
                return Err(AnteError::InvalidCoins(format!(
                    "denomination {} is not sorted or duplicated",
                    coin.denom
                )));
            }
        }
        Ok(())
    }

    /// True when at least one denom of `required` is covered by `self`.
    ///
    /// An empty `required` is never covered.
    pub fn is_any_gte(&self, required: &Coins) -> bool {
        required
            .iter()
            .any(|req| self.amount_of(&req.denom) >= req.amount)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{coin}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecCoin {
    pub denom: String,
    pub amount: Dec,
}

impl DecCoin {
    pub fn new(denom: impl Into<String>, amount: Dec) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }
}

/// Gas prices, e.g. the validator's local minimums.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecCoins(Vec<DecCoin>);

impl DecCoins {
    pub fn new(mut coins: Vec<DecCoin>) -> Self {
        coins.retain(|c| !c.amount.is_zero());
        coins.sort_by(|a, b| a.denom.cmp(&b.denom));
        Self(coins)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|c| c.amount.is_zero())
    }

    pub fn amount_of(&self, denom: &str) -> Dec {
        self.0
            .iter()
            .find(|c| c.denom == denom)
            .map_or(Dec::ZERO, |c| c.amount)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DecCoin> {
        self.0.iter()
    }

    /// `ceil(price * gas)` for every price.
    pub fn required_fees(&self, gas: u64) -> AnteResult<Coins> {
        let mut fees = Vec::with_capacity(self.0.len());
        for price in &self.0 {
            let amount = price
                .amount
                .mul_int_ceil(gas)
                .map_err(|e| AnteError::InsufficientFee(format!("required fee: {e}")))?;
            fees.push(Coin::new(price.denom.clone(), amount));
        }
        Ok(Coins::new(fees))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_and_drops_zero() {
        let coins = Coins::new(vec![
            Coin::new("uatom", 5),
            Coin::new("aevmd", 7),
            Coin::new("stake", 0),
        ]);
        assert_eq!(coins.to_string(), "7aevmd,5uatom");
        assert_eq!(coins.amount_of("stake"), 0);
        assert!(coins.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_denoms() {
        let coins = Coins(vec![Coin::new("1bad", 1)]);
        assert!(matches!(coins.validate(), Err(AnteError::InvalidCoins(_))));

        let dup = Coins(vec![Coin::new("stake", 1), Coin::new("stake", 2)]);
        assert!(matches!(dup.validate(), Err(AnteError::InvalidCoins(_))));
    }

    #[test]
    fn test_is_any_gte() {
        let fee = Coins::new(vec![Coin::new("stake", 10), Coin::new("uatom", 1)]);
        let required = Coins::new(vec![Coin::new("stake", 10), Coin::new("uatom", 50)]);
        assert!(fee.is_any_gte(&required));

        let too_high = Coins::single("stake", 11);
        assert!(!fee.is_any_gte(&too_high));
        assert!(!fee.is_any_gte(&Coins::default()));
    }

    #[test]
    fn test_required_fees_round_up() {
        let prices = DecCoins::new(vec![DecCoin::new("stake", "0.025".parse().unwrap())]);
        let fees = prices.required_fees(100_001).unwrap();
        assert_eq!(fees.amount_of("stake"), 2501);
    }
}
