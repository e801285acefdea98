//! Progressive (marginal bracket) tax evaluation.
//!
//! An amount is cut into slices, one per bracket, starting from the lowest
//! threshold. Each slice is taxed at its bracket's rate and the slice taxes
//! are summed. The walk stops as soon as nothing remains, so an amount of
//! zero touches no bracket at all.

use rust_decimal::Decimal;
use serde::Serialize;

use super::common::ensure_non_negative;
use crate::{CalculationError, TaxTable};

/// The part of an amount that fell into one bracket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BracketSlice {
    pub threshold: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub tax: Decimal,
}

/// Slices of `amount` in ascending bracket order.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidArgument`] if `amount` is negative.
pub fn bracket_slices(
    table: &TaxTable,
    amount: Decimal,
) -> Result<Vec<BracketSlice>, CalculationError> {
    let mut remaining = ensure_non_negative("amount", amount)?;
    let mut slices = Vec::new();

    for (index, bracket) in table.brackets().iter().enumerate() {
        if remaining.is_zero() {
            break;
        }
        let slice = match table.upper_bound(index) {
            Some(upper) => remaining.min(upper - bracket.threshold),
            None => remaining,
        };
        remaining -= slice;
        slices.push(BracketSlice {
            threshold: bracket.threshold,
            rate: bracket.rate,
            amount: slice,
            tax: slice * bracket.rate,
        });
    }

    Ok(slices)
}

/// Total progressive tax on `amount`.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidArgument`] if `amount` is negative.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use planner_core::calculations::compute_tax;
/// use planner_core::{TaxRate, TaxTable};
///
/// let table = TaxTable::new(vec![
///     TaxRate::new(dec!(0), dec!(0.10)),
///     TaxRate::new(dec!(10275), dec!(0.12)),
///     TaxRate::new(dec!(41775), dec!(0.22)),
/// ])
/// .unwrap();
///
/// // 10275 × 10% + 31500 × 12% + 8225 × 22%
/// assert_eq!(compute_tax(&table, dec!(50000)).unwrap(), dec!(6617));
/// assert_eq!(compute_tax(&table, dec!(0)).unwrap(), dec!(0));
/// ```
pub fn compute_tax(
    table: &TaxTable,
    amount: Decimal,
) -> Result<Decimal, CalculationError> {
    Ok(bracket_slices(table, amount)?
        .iter()
        .map(|slice| slice.tax)
        .sum())
}

/// Tax on `amount` when it sits on top of `base` already occupying the
/// lower brackets. Equals `compute_tax(base + amount) - compute_tax(base)`.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidArgument`] if either figure is negative.
pub fn compute_stacked_tax(
    table: &TaxTable,
    base: Decimal,
    amount: Decimal,
) -> Result<Decimal, CalculationError> {
    let floor = ensure_non_negative("base", base)?;
    let ceiling = floor + ensure_non_negative("amount", amount)?;
    let mut tax = Decimal::ZERO;

    for (index, bracket) in table.brackets().iter().enumerate() {
        let start = floor.max(bracket.threshold);
        let end = match table.upper_bound(index) {
            Some(upper) => ceiling.min(upper),
            None => ceiling,
        };
        if end > start {
            tax += (end - start) * bracket.rate;
        }
    }

    Ok(tax)
}

/// Rate applied to the next unit earned above `amount`.
///
/// # Errors
///
/// Returns [`CalculationError::InvalidArgument`] if `amount` is negative.
pub fn marginal_rate(
    table: &TaxTable,
    amount: Decimal,
) -> Result<Decimal, CalculationError> {
    ensure_non_negative("amount", amount)?;
    Ok(table
        .brackets()
        .iter()
        .rev()
        .find(|bracket| bracket.threshold <= amount)
        .map_or(Decimal::ZERO, |bracket| bracket.rate))
}
