//! Rate tables shipped with the crate.

use planner_core::TaxYearRates;

use crate::rate_loader::{RateLoader, RateLoaderError};

/// Bracket tables for every bundled year, in the loader's CSV format.
pub const BUNDLED_BRACKETS: &str = include_str!("../data/brackets_2022.csv");

/// Standard deductions for every bundled year.
pub const BUNDLED_DEDUCTIONS: &str = include_str!("../data/deductions_2022.csv");

/// Most recent bundled tax year.
pub const DEFAULT_TAX_YEAR: i32 = 2022;

/// Builds the bundled rates for `tax_year`.
///
/// # Example
///
/// ```
/// use planner_data::bundled_rates;
///
/// let rates = bundled_rates(2022).unwrap();
/// assert_eq!(rates.tax_year, 2022);
/// assert!(bundled_rates(1999).is_err());
/// ```
pub fn bundled_rates(tax_year: i32) -> Result<TaxYearRates, RateLoaderError> {
    let brackets = RateLoader::parse_brackets(BUNDLED_BRACKETS.as_bytes())?;
    let deductions = RateLoader::parse_deductions(BUNDLED_DEDUCTIONS.as_bytes())?;
    RateLoader::build(tax_year, &brackets, &deductions)
}

/// Tax years available without supplying rate files.
pub fn bundled_years() -> Result<Vec<i32>, RateLoaderError> {
    let brackets = RateLoader::parse_brackets(BUNDLED_BRACKETS.as_bytes())?;
    Ok(RateLoader::available_years(&brackets))
}

#[cfg(test)]
mod tests {
    use planner_core::FilingStatus;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_bundled_years() {
        assert_eq!(bundled_years().unwrap(), vec![DEFAULT_TAX_YEAR]);
    }

    #[test]
    fn test_bundled_2022_tables() {
        let rates = bundled_rates(2022).expect("bundled tables should build");

        assert_eq!(*rates.standard_deduction.get(FilingStatus::Single), dec!(12950));
        assert_eq!(rates.income.get(FilingStatus::Married).brackets().len(), 7);
        assert_eq!(rates.state_income.get(FilingStatus::Single).brackets().len(), 9);
        assert_eq!(
            rates.capital_gain.get(FilingStatus::Married).bracket(2).map(|b| b.threshold),
            Some(dec!(501601))
        );
    }

    #[test]
    fn test_bundled_unknown_year() {
        assert!(matches!(
            bundled_rates(2019),
            Err(RateLoaderError::TaxYearNotFound(2019))
        ));
    }
}
