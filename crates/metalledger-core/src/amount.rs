//! Rounding and tolerance helpers for money and quantities.
//!
//! Every stored or reported figure passes through one of the `round_*`
//! functions here. Comparisons against zero use [`EPSILON`] so that lots
//! drained by a long chain of subtractions are recognised as empty.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::EngineError;

/// Tolerance used for every comparison against zero (1e-9).
pub const EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 9);

/// Decimal places kept for money (revenue, cost, balances).
pub const MONEY_DP: u32 = 2;

/// Decimal places kept for quantities.
pub const QUANTITY_DP: u32 = 6;

/// Decimal places kept for unit prices, including weighted averages.
pub const PRICE_DP: u32 = 6;

/// Round a money figure to [`MONEY_DP`] places (half-to-even).
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(MONEY_DP)
}

/// Cut a money figure to [`MONEY_DP`] places, toward zero.
///
/// Never exceeds `value` in magnitude, so shares cut this way leave a
/// non-negative remainder.
#[must_use]
pub fn truncate_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DP, RoundingStrategy::ToZero)
}

/// Round a quantity to [`QUANTITY_DP`] places (half-to-even).
#[must_use]
pub fn round_quantity(value: Decimal) -> Decimal {
    value.round_dp(QUANTITY_DP)
}

/// Round a unit price to [`PRICE_DP`] places (half-to-even).
#[must_use]
pub fn round_price(value: Decimal) -> Decimal {
    value.round_dp(PRICE_DP)
}

/// True when `value` is zero within [`EPSILON`].
#[must_use]
pub fn is_dust(value: Decimal) -> bool {
    value.abs() <= EPSILON
}

/// True when `a` and `b` differ by at most `tolerance`.
#[must_use]
pub fn approx_eq(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

/// Parse user input into a decimal, reporting failures as
/// [`EngineError::InvalidQuantity`] against `field`.
pub fn parse_decimal(field: &'static str, input: &str) -> Result<Decimal, EngineError> {
    Decimal::from_str(input.trim()).map_err(|_| EngineError::InvalidQuantity {
        field,
        value: input.to_string(),
    })
}

/// Denominator used when expressing profit as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfitBase {
    /// `profit / cost * 100` (markup).
    #[default]
    Cost,
    /// `profit / revenue * 100` (margin).
    Revenue,
}

impl ProfitBase {
    /// Compute the profit percentage for a transaction.
    ///
    /// Returns zero when the chosen denominator is not positive.
    #[must_use]
    pub fn percentage(self, profit: Decimal, cost: Decimal, revenue: Decimal) -> Decimal {
        let base = match self {
            Self::Cost => cost,
            Self::Revenue => revenue,
        };
        if base > Decimal::ZERO {
            round_money(profit / base * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        }
    }
}

impl FromStr for ProfitBase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cost" => Ok(Self::Cost),
            "revenue" => Ok(Self::Revenue),
            _ => Err(format!("unknown profit base: {s}")),
        }
    }
}

impl fmt::Display for ProfitBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cost => write!(f, "cost"),
            Self::Revenue => write!(f, "revenue"),
        }
    }
}
