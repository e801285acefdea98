use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CalculationError;
use crate::calculations::common::ensure_non_negative;

/// Salary and RSU facts for one calendar year of a household.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiscalYearFacts {
    pub year: i32,
    pub salary: Decimal,
    #[serde(default)]
    pub spouse_salary: Decimal,
    #[serde(default)]
    pub vested_rsu: Decimal,
    #[serde(default)]
    pub spouse_vested_rsu: Decimal,

    /// State-sourced income that does not come from equity events, such as
    /// salary earned while resident in a relocation year. Added as-is to the
    /// apportioned event income.
    #[serde(default)]
    pub state_income_adjustment: Decimal,
}

impl FiscalYearFacts {
    pub fn new(
        year: i32,
        salary: Decimal,
    ) -> Self {
        Self {
            year,
            salary,
            spouse_salary: Decimal::ZERO,
            vested_rsu: Decimal::ZERO,
            spouse_vested_rsu: Decimal::ZERO,
            state_income_adjustment: Decimal::ZERO,
        }
    }

    /// Own salary plus own vested RSUs.
    pub fn own_compensation(&self) -> Decimal {
        self.salary + self.vested_rsu
    }

    /// Spouse salary plus spouse vested RSUs.
    pub fn spouse_compensation(&self) -> Decimal {
        self.spouse_salary + self.spouse_vested_rsu
    }

    /// # Errors
    ///
    /// Returns [`CalculationError::InvalidArgument`] for any negative figure.
    pub fn validate(&self) -> Result<(), CalculationError> {
        ensure_non_negative("salary", self.salary)?;
        ensure_non_negative("spouse salary", self.spouse_salary)?;
        ensure_non_negative("vested RSU value", self.vested_rsu)?;
        ensure_non_negative("spouse vested RSU value", self.spouse_vested_rsu)?;
        ensure_non_negative("state income adjustment", self.state_income_adjustment)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn compensation_sums_salary_and_rsu() {
        let facts = FiscalYearFacts {
            spouse_salary: dec!(127710),
            vested_rsu: dec!(56250),
            spouse_vested_rsu: dec!(1000),
            ..FiscalYearFacts::new(2022, dec!(238050))
        };

        assert_eq!(facts.own_compensation(), dec!(294300));
        assert_eq!(facts.spouse_compensation(), dec!(128710));
    }

    #[test]
    fn validate_rejects_negative_salary() {
        let facts = FiscalYearFacts::new(2022, dec!(-5));

        assert_eq!(
            facts.validate(),
            Err(CalculationError::InvalidArgument {
                name: "salary",
                value: dec!(-5)
            })
        );
    }
}
