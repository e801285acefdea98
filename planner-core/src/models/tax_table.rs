use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ByFilingStatus;
use crate::CalculationError;

/// Lower edge of a bracket and the marginal rate applied above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate {
    pub threshold: Decimal,
    /// Marginal rate as a fraction, e.g. `0.22`.
    pub rate: Decimal,
}

impl TaxRate {
    pub fn new(
        threshold: Decimal,
        rate: Decimal,
    ) -> Self {
        Self { threshold, rate }
    }
}

/// An immutable progressive rate schedule.
///
/// Thresholds start at zero and strictly increase. The last bracket has no
/// upper bound. A bracket with a zero rate above some threshold models a cap
/// (social security wage base).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxTable {
    brackets: Vec<TaxRate>,
}

impl TaxTable {
    /// Builds a table after validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::Configuration`] if the table is empty, does
    /// not start at zero, has non-ascending thresholds, or has a rate outside
    /// `[0, 1]`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use planner_core::{TaxRate, TaxTable};
    ///
    /// let table = TaxTable::new(vec![
    ///     TaxRate::new(dec!(0), dec!(0.10)),
    ///     TaxRate::new(dec!(10275), dec!(0.12)),
    /// ])
    /// .unwrap();
    /// assert_eq!(table.brackets().len(), 2);
    ///
    /// let unsorted = TaxTable::new(vec![
    ///     TaxRate::new(dec!(0), dec!(0.10)),
    ///     TaxRate::new(dec!(0), dec!(0.12)),
    /// ]);
    /// assert!(unsorted.is_err());
    /// ```
    pub fn new(brackets: Vec<TaxRate>) -> Result<Self, CalculationError> {
        let first = brackets
            .first()
            .ok_or_else(|| CalculationError::configuration("tax table has no brackets"))?;
        if !first.threshold.is_zero() {
            return Err(CalculationError::Configuration(format!(
                "first threshold must be 0, got {}",
                first.threshold
            )));
        }
        for pair in brackets.windows(2) {
            if pair[1].threshold <= pair[0].threshold {
                return Err(CalculationError::Configuration(format!(
                    "thresholds must strictly increase, got {} after {}",
                    pair[1].threshold, pair[0].threshold
                )));
            }
        }
        if let Some(bad) = brackets
            .iter()
            .find(|b| b.rate < Decimal::ZERO || b.rate > Decimal::ONE)
        {
            return Err(CalculationError::Configuration(format!(
                "rate must be between 0 and 1, got {}",
                bad.rate
            )));
        }
        Ok(Self { brackets })
    }

    /// A single bracket starting at zero.
    pub fn flat(rate: Decimal) -> Result<Self, CalculationError> {
        Self::new(vec![TaxRate::new(Decimal::ZERO, rate)])
    }

    pub fn brackets(&self) -> &[TaxRate] {
        &self.brackets
    }

    pub fn bracket(
        &self,
        index: usize,
    ) -> Option<&TaxRate> {
        self.brackets.get(index)
    }

    /// Upper edge of bracket `index`; `None` for the open-ended last bracket.
    pub fn upper_bound(
        &self,
        index: usize,
    ) -> Option<Decimal> {
        self.brackets.get(index + 1).map(|next| next.threshold)
    }
}

impl<'de> Deserialize<'de> for TaxTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let brackets = Vec::<TaxRate>::deserialize(deserializer)?;
        TaxTable::new(brackets).map_err(serde::de::Error::custom)
    }
}

/// A table per filing status for one schedule.
pub type TaxTableSet = ByFilingStatus<TaxTable>;

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn rate(
        threshold: Decimal,
        rate: Decimal,
    ) -> TaxRate {
        TaxRate::new(threshold, rate)
    }

    #[test]
    fn new_accepts_well_formed_table() {
        let table = TaxTable::new(vec![
            rate(dec!(0), dec!(0.062)),
            rate(dec!(147000), dec!(0)),
        ])
        .expect("valid table");

        assert_eq!(table.brackets().len(), 2);
        assert_eq!(table.upper_bound(0), Some(dec!(147000)));
        assert_eq!(table.upper_bound(1), None);
    }

    #[test]
    fn new_rejects_empty_table() {
        let result = TaxTable::new(vec![]);

        assert!(matches!(result, Err(CalculationError::Configuration(_))));
    }

    #[test]
    fn new_rejects_nonzero_first_threshold() {
        let result = TaxTable::new(vec![rate(dec!(100), dec!(0.10))]);

        assert!(matches!(result, Err(CalculationError::Configuration(_))));
    }

    #[test]
    fn new_rejects_repeated_threshold() {
        let result = TaxTable::new(vec![rate(dec!(0), dec!(0)), rate(dec!(0), dec!(0.07))]);

        assert!(matches!(result, Err(CalculationError::Configuration(_))));
    }

    #[test]
    fn new_rejects_descending_thresholds() {
        let result = TaxTable::new(vec![
            rate(dec!(0), dec!(0.10)),
            rate(dec!(20000), dec!(0.12)),
            rate(dec!(10000), dec!(0.22)),
        ]);

        assert!(matches!(result, Err(CalculationError::Configuration(_))));
    }

    #[test]
    fn new_rejects_rate_above_one() {
        let result = TaxTable::new(vec![rate(dec!(0), dec!(12.3))]);

        assert!(matches!(result, Err(CalculationError::Configuration(_))));
    }

    #[test]
    fn flat_builds_single_bracket() {
        let table = TaxTable::flat(dec!(0.038)).expect("valid");

        assert_eq!(table.brackets(), &[rate(dec!(0), dec!(0.038))]);
    }
}
