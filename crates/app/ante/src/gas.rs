use crate::error::{AnteError, AnteResult};

/// Tracks gas consumed by a single transaction admission.
///
/// - **Infinite** mode: consumption is recorded but never fails. Used while
///   simulating and at genesis, where the limit is informational.
/// - **Finite** mode: consumption beyond `limit` fails with
///   [`AnteError::OutOfGas`].
///
/// # Examples
///
/// ```
/// use evmd_ante::gas::GasMeter;
///
/// let mut meter = GasMeter::finite(1000);
/// meter.consume_gas(200, "txSize").unwrap();
/// assert!(meter.consume_gas(10_000, "txSize").is_err());
///
/// let mut sim = GasMeter::infinite(0);
/// sim.consume_gas(9_999_999, "txSize").unwrap();
/// assert_eq!(sim.consumed(), 9_999_999);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GasMeter {
    Infinite { limit: u64, consumed: u64 },
    Finite { limit: u64, consumed: u64 },
}

impl GasMeter {
    pub fn infinite(limit: u64) -> Self {
        GasMeter::Infinite { limit, consumed: 0 }
    }

    pub fn finite(limit: u64) -> Self {
        GasMeter::Finite { limit, consumed: 0 }
    }

    /// Consumes `amount` gas, attributing it to `descriptor` on failure.
    ///
    /// # Errors
    ///
    /// [`AnteError::GasOverflow`] if the counter would wrap, and
    /// [`AnteError::OutOfGas`] if a finite meter would exceed its limit.
    /// The meter is left unchanged on error.
    pub fn consume_gas(&mut self, amount: u64, descriptor: &str) -> AnteResult<()> {
        match self {
            GasMeter::Infinite { consumed, .. } => {
                *consumed = consumed
                    .checked_add(amount)
                    .ok_or_else(|| AnteError::GasOverflow(descriptor.to_string()))?;
                Ok(())
            }
            GasMeter::Finite { limit, consumed } => {
                let next = consumed
                    .checked_add(amount)
                    .ok_or_else(|| AnteError::GasOverflow(descriptor.to_string()))?;
                if next > *limit {
                    return Err(AnteError::OutOfGas {
                        descriptor: descriptor.to_string(),
                        limit: *limit,
                        used: next,
                    });
                }
                *consumed = next;
                Ok(())
            }
        }
    }

    pub fn limit(&self) -> u64 {
        match self {
            GasMeter::Infinite { limit, .. } | GasMeter::Finite { limit, .. } => *limit,
        }
    }

    pub fn consumed(&self) -> u64 {
        match self {
            GasMeter::Infinite { consumed, .. } | GasMeter::Finite { consumed, .. } => *consumed,
        }
    }

    /// Gas left before the limit; `u64::MAX` for infinite meters.
    pub fn remaining(&self) -> u64 {
        match self {
            GasMeter::Infinite { .. } => u64::MAX,
            GasMeter::Finite { limit, consumed } => limit.saturating_sub(*consumed),
        }
    }

    pub fn is_infinite(&self) -> bool {
        matches!(self, GasMeter::Infinite { .. })
    }
}

impl Default for GasMeter {
    fn default() -> Self {
        GasMeter::infinite(0)
    }
}
