//! Common helpers shared by the tax rules and projections.
//!
//! Intermediate figures are never rounded; these helpers are applied only
//! when a figure is presented.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::CalculationError;

/// Truncates a currency figure to whole units, toward zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use planner_core::calculations::common::truncate_currency;
///
/// assert_eq!(truncate_currency(dec!(51913.725)), dec!(51913));
/// assert_eq!(truncate_currency(dec!(-10.9)), dec!(-10));
/// ```
pub fn truncate_currency(value: Decimal) -> Decimal {
    value.trunc()
}

/// Rounds a rate to two decimal places, ties to even.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use planner_core::calculations::common::round_rate;
///
/// assert_eq!(round_rate(dec!(0.259568625)), dec!(0.26));
/// assert_eq!(round_rate(dec!(0.125)), dec!(0.12));
/// ```
pub fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}

/// Returns the maximum of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// `a - b`, floored at zero. The shape of every "owed only on the excess"
/// comparison (AMT over regular tax, unused bracket room).
pub fn excess_over(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    max(a - b, Decimal::ZERO)
}

/// Fails with [`CalculationError::InvalidArgument`] when `value` is negative.
pub fn ensure_non_negative(
    name: &'static str,
    value: Decimal,
) -> Result<Decimal, CalculationError> {
    if value < Decimal::ZERO {
        return Err(CalculationError::InvalidArgument { name, value });
    }
    Ok(value)
}
