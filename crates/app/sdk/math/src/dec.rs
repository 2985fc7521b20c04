use borsh::{BorshDeserialize, BorshSerialize};
use fixed::{types::extra::U64, FixedU128};
use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;
use thiserror::Error;

/// Number of fractional bits carried by [`Dec`].
const FRAC_BITS: u32 = 64;

/// Most fractional digits a decimal string may carry.
pub const PRECISION: u32 = 18;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid decimal '{0}'")]
    Parse(String),

    #[error("decimal arithmetic overflow")]
    Overflow,
}

/// Unsigned decimal with 64 integer and 64 fractional bits.
///
/// Wraps `FixedU128<U64>`. Values are parsed from their decimal string form
/// (`"0.10"`, `"2.5"`), which is how policy files and governance parameters
/// express rates. Decimal inputs that have no exact binary form are
/// truncated toward zero, so a stored value never exceeds the decimal it
/// came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Dec(FixedU128<U64>);

impl Dec {
    pub const ZERO: Self = Self(FixedU128::<U64>::from_bits(0));
    pub const ONE: Self = Self(FixedU128::<U64>::from_bits(1 << FRAC_BITS));

    /// Creates a decimal from its raw UQ64.64 representation.
    pub const fn from_bits(bits: u128) -> Self {
        Self(FixedU128::<U64>::from_bits(bits))
    }

    pub fn to_bits(self) -> u128 {
        self.0.to_bits()
    }

    pub fn from_u64(value: u64) -> Self {
        Self(FixedU128::<U64>::from_num(value))
    }

    /// `numerator / denominator`, truncated like a parsed decimal string.
    pub fn from_fraction(numerator: u64, denominator: u64) -> Result<Self, MathError> {
        if denominator == 0 {
            return Err(MathError::DivisionByZero);
        }
        Ok(Self::from_bits(
            (u128::from(numerator) << FRAC_BITS) / u128::from(denominator),
        ))
    }

    /// `value / 100`, e.g. `percent(50)` is one half.
    pub fn percent(value: u64) -> Self {
        Self::from_bits((u128::from(value) << FRAC_BITS) / 100)
    }

    pub fn is_zero(self) -> bool {
        self.0 == FixedU128::<U64>::ZERO
    }

    pub fn integer_part(self) -> u64 {
        self.0.int().to_num()
    }

    /// `ceil(self * amount)` as an integer.
    ///
    /// Used for required fees: a gas price of `0.25` over `3` gas needs a fee
    /// of `1`, never `0`. Any non-zero remainder rounds up.
    pub fn mul_int_ceil(self, amount: u64) -> Result<u128, MathError> {
        let product = self
            .to_bits()
            .checked_mul(u128::from(amount))
            .ok_or(MathError::Overflow)?;
        let mask = (1u128 << FRAC_BITS) - 1;
        let whole = product >> FRAC_BITS;
        if product & mask == 0 {
            Ok(whole)
        } else {
            whole.checked_add(1).ok_or(MathError::Overflow)
        }
    }

    pub fn checked_add(self, rhs: Self) -> Result<Self, MathError> {
        self.0.checked_add(rhs.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn checked_mul(self, rhs: Self) -> Result<Self, MathError> {
        self.0.checked_mul(rhs.0).map(Self).ok_or(MathError::Overflow)
    }

    pub fn checked_div(self, rhs: Self) -> Result<Self, MathError> {
        if rhs.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        self.0.checked_div(rhs.0).map(Self).ok_or(MathError::Overflow)
    }
}

impl FromStr for Dec {
    type Err = MathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MathError::Parse(s.to_string());
        let trimmed = s.trim();
        let (int, frac) = trimmed.split_once('.').unwrap_or((trimmed, ""));
        let digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if int.is_empty()
            || !digits(int)
            || !digits(frac)
            || (trimmed.contains('.') && frac.is_empty())
            || frac.len() > PRECISION as usize
        {
            return Err(invalid());
        }

        let int: u64 = int.parse().map_err(|_| invalid())?;
        let frac_bits = if frac.is_empty() {
            0
        } else {
            let numerator: u128 = frac.parse().map_err(|_| invalid())?;
            let scale = 10u128.pow(frac.len() as u32);
            (numerator << FRAC_BITS) / scale
        };
        Ok(Self::from_bits((u128::from(int) << FRAC_BITS) | frac_bits))
    }
}

// Prints the shortest decimal with at most PRECISION digits that parses
// back to the same value.
impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.to_bits();
        let int = bits >> FRAC_BITS;
        let frac = bits & ((1u128 << FRAC_BITS) - 1);
        let scale = 10u128.pow(PRECISION);
        let digits = (frac * scale).div_ceil(1u128 << FRAC_BITS).min(scale - 1);
        if digits == 0 {
            return write!(f, "{int}");
        }
        let padded = format!("{digits:0width$}", width = PRECISION as usize);
        write!(f, "{int}.{}", padded.trim_end_matches('0'))
    }
}

impl From<u64> for Dec {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

// Encoded as the raw bits so the wire form is independent of `fixed`.
impl BorshSerialize for Dec {
    fn serialize<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        self.to_bits().serialize(writer)
    }
}

impl BorshDeserialize for Dec {
    fn deserialize_reader<R: Read>(reader: &mut R) -> std::io::Result<Self> {
        u128::deserialize_reader(reader).map(Self::from_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rates() {
        let floor: Dec = "0.10".parse().unwrap();
        let ceil: Dec = "0.50".parse().unwrap();
        let rate: Dec = "0.60".parse().unwrap();

        assert!(floor < ceil);
        assert!(rate > ceil);
        assert_eq!("0.5".parse::<Dec>().unwrap(), ceil);
        assert_eq!(Dec::percent(50), Dec::from_fraction(1, 2).unwrap());
        assert_eq!(Dec::percent(10), floor);
        assert_eq!(Dec::from_fraction(1, 10).unwrap(), floor);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("".parse::<Dec>(), Err(MathError::Parse(_))));
        assert!(matches!("-0.1".parse::<Dec>(), Err(MathError::Parse(_))));
        assert!(matches!("abc".parse::<Dec>(), Err(MathError::Parse(_))));
    }

    #[test]
    fn test_mul_int_ceil() {
        let quarter = Dec::from_fraction(1, 4).unwrap();
        assert_eq!(quarter.mul_int_ceil(3).unwrap(), 1);
        assert_eq!(quarter.mul_int_ceil(4).unwrap(), 1);
        assert_eq!(quarter.mul_int_ceil(5).unwrap(), 2);
        assert_eq!(Dec::ZERO.mul_int_ceil(1_000_000).unwrap(), 0);
        assert_eq!(Dec::from_u64(7).mul_int_ceil(200_000).unwrap(), 1_400_000);

        let tenth: Dec = "0.1".parse().unwrap();
        assert_eq!(tenth.mul_int_ceil(1000).unwrap(), 100);
        assert_eq!(tenth.mul_int_ceil(1001).unwrap(), 101);
    }

    #[test]
    fn test_mul_int_ceil_rounds_up_any_remainder() {
        assert_eq!(Dec::from_bits(1).mul_int_ceil(1).unwrap(), 1);
        assert_eq!(Dec::from_bits(1).mul_int_ceil(1000).unwrap(), 1);
        let smallest: Dec = "0.000000000000000001".parse().unwrap();
        assert!(!smallest.is_zero());
        assert_eq!(smallest.mul_int_ceil(200_000).unwrap(), 1);
        assert_eq!(
            Dec::from_bits(u128::MAX).mul_int_ceil(2),
            Err(MathError::Overflow)
        );
    }

    #[test]
    fn test_parse_truncates_and_displays_round_trip() {
        let tenth: Dec = "0.1".parse().unwrap();
        assert_eq!(tenth.to_bits(), Dec::ONE.to_bits() / 10);
        assert_eq!(tenth.to_string(), "0.1");
        assert_eq!(Dec::percent(60).to_string(), "0.6");
        assert_eq!(Dec::from_u64(7).to_string(), "7");
        assert_eq!("2.5".parse::<Dec>().unwrap().to_string(), "2.5");
        for s in ["0.000000000000000001", "0.123456789012345678", "12.05"] {
            assert_eq!(s.parse::<Dec>().unwrap().to_string(), s);
        }
        // Too many digits, or a dangling point.
        assert!("0.1234567890123456789".parse::<Dec>().is_err());
        assert!("1.".parse::<Dec>().is_err());
        assert!(".5".parse::<Dec>().is_err());
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(Dec::from_fraction(1, 0), Err(MathError::DivisionByZero));
        assert_eq!(Dec::ONE.checked_div(Dec::ZERO), Err(MathError::DivisionByZero));
    }

    #[test]
    fn test_borsh_uses_raw_bits() {
        let half = Dec::percent(50);
        let bytes = borsh::to_vec(&half).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(Dec::try_from_slice(&bytes).unwrap(), half);
    }
}
