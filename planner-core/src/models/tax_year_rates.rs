use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{ByFilingStatus, FilingStatus, TaxTableSet};
use crate::CalculationError;

/// The named rate schedules a tax year carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    Income,
    SocialSecurity,
    Medicare,
    Niit,
    Amt,
    CapitalGain,
    StateIncome,
    StateAmt,
}

impl Schedule {
    pub const ALL: [Schedule; 8] = [
        Schedule::Income,
        Schedule::SocialSecurity,
        Schedule::Medicare,
        Schedule::Niit,
        Schedule::Amt,
        Schedule::CapitalGain,
        Schedule::StateIncome,
        Schedule::StateAmt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::SocialSecurity => "social_security",
            Self::Medicare => "medicare",
            Self::Niit => "niit",
            Self::Amt => "amt",
            Self::CapitalGain => "capital_gain",
            Self::StateIncome => "state_income",
            Self::StateAmt => "state_amt",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|schedule| schedule.as_str() == s.trim())
    }
}

impl fmt::Display for Schedule {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every rate schedule and deduction for one tax year.
///
/// Values are immutable once built; several years can live side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearRates {
    pub tax_year: i32,
    pub standard_deduction: ByFilingStatus<Decimal>,
    pub income: TaxTableSet,
    pub social_security: TaxTableSet,
    pub medicare: TaxTableSet,
    pub niit: TaxTableSet,
    pub amt: TaxTableSet,
    /// Needs three brackets: 0%, the low long-term rate, the high rate.
    pub capital_gain: TaxTableSet,
    pub state_income: TaxTableSet,
    pub state_amt: TaxTableSet,
}

impl TaxYearRates {
    pub fn table(
        &self,
        schedule: Schedule,
    ) -> &TaxTableSet {
        match schedule {
            Schedule::Income => &self.income,
            Schedule::SocialSecurity => &self.social_security,
            Schedule::Medicare => &self.medicare,
            Schedule::Niit => &self.niit,
            Schedule::Amt => &self.amt,
            Schedule::CapitalGain => &self.capital_gain,
            Schedule::StateIncome => &self.state_income,
            Schedule::StateAmt => &self.state_amt,
        }
    }

    /// Checks the cross-table constraints that [`TaxTable::new`] cannot see.
    ///
    /// [`TaxTable::new`]: super::TaxTable::new
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::Configuration`] if a capital gain table has
    /// fewer than three brackets or a standard deduction is negative.
    pub fn validate(&self) -> Result<(), CalculationError> {
        for status in FilingStatus::ALL {
            let brackets = self.capital_gain.get(status).brackets().len();
            if brackets < 3 {
                return Err(CalculationError::Configuration(format!(
                    "{} capital gain table for {} needs 3 brackets, has {}",
                    status, self.tax_year, brackets
                )));
            }
            let deduction = *self.standard_deduction.get(status);
            if deduction < Decimal::ZERO {
                return Err(CalculationError::Configuration(format!(
                    "{} standard deduction for {} is negative: {}",
                    status, self.tax_year, deduction
                )));
            }
        }
        Ok(())
    }
}
