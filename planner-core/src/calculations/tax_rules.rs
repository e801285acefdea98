//! Compound tax figures for one filing status and tax year.
//!
//! Every rule is a pure function of its arguments and the injected
//! [`TaxYearRates`]. Negative inputs are rejected rather than clamped.

use rust_decimal::Decimal;
use serde::Serialize;

use super::common::{ensure_non_negative, excess_over};
use super::progressive::compute_tax;
use crate::{CalculationError, FilingStatus, Schedule, TaxTable, TaxYearRates};

/// How a capital gain was split across the long-term brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapitalGainBreakdown {
    /// Gain that fit under the high-rate threshold above ordinary income.
    pub low_rate_portion: Decimal,
    pub high_rate_portion: Decimal,
    pub low_rate_tax: Decimal,
    pub high_rate_tax: Decimal,
    pub niit: Decimal,
}

impl CapitalGainBreakdown {
    pub fn total(&self) -> Decimal {
        self.low_rate_tax + self.high_rate_tax + self.niit
    }
}

/// Tax rules bound to a rate set and a filing status.
///
/// # Example
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use planner_core::calculations::TaxRules;
/// use planner_core::{ByFilingStatus, FilingStatus, TaxRate, TaxTable, TaxTableSet, TaxYearRates};
///
/// let flat = |rate| TaxTableSet::uniform(TaxTable::flat(rate).unwrap());
/// let rates = TaxYearRates {
///     tax_year: 2022,
///     standard_deduction: ByFilingStatus::new(dec!(12950), dec!(25900)),
///     income: flat(dec!(0.10)),
///     social_security: flat(dec!(0)),
///     medicare: flat(dec!(0)),
///     niit: flat(dec!(0.038)),
///     amt: flat(dec!(0.26)),
///     capital_gain: TaxTableSet::uniform(
///         TaxTable::new(vec![
///             TaxRate::new(dec!(0), dec!(0)),
///             TaxRate::new(dec!(40401), dec!(0.15)),
///             TaxRate::new(dec!(445851), dec!(0.20)),
///         ])
///         .unwrap(),
///     ),
///     state_income: flat(dec!(0.05)),
///     state_amt: flat(dec!(0.07)),
/// };
///
/// let rules = TaxRules::new(&rates, FilingStatus::Single);
/// // 10% of (100000 - 12950)
/// assert_eq!(rules.federal_income_tax(dec!(100000)).unwrap(), dec!(8705));
/// // AMT is owed only above the regular tax
/// assert_eq!(rules.federal_amt(dec!(20000), dec!(8705)).unwrap(), Decimal::ZERO);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TaxRules<'a> {
    rates: &'a TaxYearRates,
    status: FilingStatus,
}

impl<'a> TaxRules<'a> {
    pub fn new(
        rates: &'a TaxYearRates,
        status: FilingStatus,
    ) -> Self {
        Self { rates, status }
    }

    pub fn filing_status(&self) -> FilingStatus {
        self.status
    }

    pub fn rates(&self) -> &'a TaxYearRates {
        self.rates
    }

    fn table(
        &self,
        schedule: Schedule,
    ) -> &'a TaxTable {
        self.rates.table(schedule).get(self.status)
    }

    fn tax(
        &self,
        schedule: Schedule,
        amount: Decimal,
    ) -> Result<Decimal, CalculationError> {
        compute_tax(self.table(schedule), amount)
    }

    pub fn standard_deduction(&self) -> Decimal {
        *self.rates.standard_deduction.get(self.status)
    }

    pub fn social_security_tax(
        &self,
        amount: Decimal,
    ) -> Result<Decimal, CalculationError> {
        self.tax(Schedule::SocialSecurity, amount)
    }

    pub fn medicare_tax(
        &self,
        amount: Decimal,
    ) -> Result<Decimal, CalculationError> {
        self.tax(Schedule::Medicare, amount)
    }

    /// Social security plus Medicare.
    pub fn fica_tax(
        &self,
        amount: Decimal,
    ) -> Result<Decimal, CalculationError> {
        Ok(self.social_security_tax(amount)? + self.medicare_tax(amount)?)
    }

    /// `amount` less the standard deduction, floored at zero.
    pub fn taxable_income(
        &self,
        amount: Decimal,
    ) -> Result<Decimal, CalculationError> {
        ensure_non_negative("income", amount)?;
        Ok(excess_over(amount, self.standard_deduction()))
    }

    /// Regular federal tax: FICA plus bracket income tax, both on income
    /// after the standard deduction.
    pub fn federal_income_tax(
        &self,
        amount: Decimal,
    ) -> Result<Decimal, CalculationError> {
        let taxable = self.taxable_income(amount)?;
        Ok(self.fica_tax(taxable)? + self.tax(Schedule::Income, taxable)?)
    }

    /// Tentative minimum tax on the AMT base, before comparing with the
    /// regular tax.
    pub fn amt_tax(
        &self,
        amt_base: Decimal,
    ) -> Result<Decimal, CalculationError> {
        self.tax(Schedule::Amt, amt_base)
    }

    /// AMT owed: the excess of tentative minimum tax on `amt_base` (regular
    /// income plus ISO spread, no deduction) over `regular_tax`.
    pub fn federal_amt(
        &self,
        amt_base: Decimal,
        regular_tax: Decimal,
    ) -> Result<Decimal, CalculationError> {
        ensure_non_negative("regular tax", regular_tax)?;
        Ok(excess_over(self.amt_tax(amt_base)?, regular_tax))
    }

    /// Net investment income tax on `gain`.
    pub fn niit(
        &self,
        gain: Decimal,
    ) -> Result<Decimal, CalculationError> {
        self.tax(Schedule::Niit, gain)
    }

    /// Splits `gain` across the long-term brackets stacked on top of
    /// `ordinary_income`.
    ///
    /// Gain below the high-rate threshold (less ordinary income already
    /// earned) is taxed at the middle bracket's rate, the rest at the top
    /// bracket's rate. NIIT applies to the whole gain.
    ///
    /// # Errors
    ///
    /// * [`CalculationError::InvalidArgument`] for negative inputs.
    /// * [`CalculationError::Configuration`] if the capital gain table has
    ///   fewer than three brackets.
    pub fn capital_gain_breakdown(
        &self,
        gain: Decimal,
        ordinary_income: Decimal,
    ) -> Result<CapitalGainBreakdown, CalculationError> {
        ensure_non_negative("capital gain", gain)?;
        ensure_non_negative("ordinary income", ordinary_income)?;

        let table = self.table(Schedule::CapitalGain);
        let (Some(low), Some(high)) = (table.bracket(1), table.bracket(2)) else {
            return Err(CalculationError::Configuration(format!(
                "{} capital gain table needs 3 brackets",
                self.status
            )));
        };

        let room = excess_over(high.threshold, ordinary_income);
        let low_rate_portion = gain.min(room);
        let high_rate_portion = gain - low_rate_portion;

        Ok(CapitalGainBreakdown {
            low_rate_portion,
            high_rate_portion,
            low_rate_tax: low_rate_portion * low.rate,
            high_rate_tax: high_rate_portion * high.rate,
            niit: self.niit(gain)?,
        })
    }

    /// Total of [`capital_gain_breakdown`](Self::capital_gain_breakdown).
    pub fn capital_gain_tax(
        &self,
        gain: Decimal,
        ordinary_income: Decimal,
    ) -> Result<Decimal, CalculationError> {
        Ok(self.capital_gain_breakdown(gain, ordinary_income)?.total())
    }

    pub fn state_income_tax(
        &self,
        amount: Decimal,
    ) -> Result<Decimal, CalculationError> {
        self.tax(Schedule::StateIncome, amount)
    }

    /// State AMT owed: the excess of state minimum tax on `amt_base` over
    /// `regular_state_tax`.
    pub fn state_amt(
        &self,
        amt_base: Decimal,
        regular_state_tax: Decimal,
    ) -> Result<Decimal, CalculationError> {
        ensure_non_negative("regular state tax", regular_state_tax)?;
        Ok(excess_over(
            self.tax(Schedule::StateAmt, amt_base)?,
            regular_state_tax,
        ))
    }
}
