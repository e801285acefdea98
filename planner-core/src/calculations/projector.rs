//! One year of household cash and tax.
//!
//! The projector sums a year's salary and RSU facts with the income,
//! spread, gain and cash flows of that year's equity events, then runs
//! them through [`TaxRules`] for one filing status.
//!
//! Married households are taxed on combined income in one bracket walk.
//! Single filers are taxed spouse by spouse and the two regular taxes are
//! summed; the AMT base then holds only the filer's own income plus the ISO
//! spread.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::common::{round_rate, truncate_currency};
use super::tax_rules::TaxRules;
use crate::{CalculationError, EquityEvent, FilingStatus, FiscalYearFacts, ProjectionResult, TaxYearRates};

/// Event totals for one year, before any tax is applied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct EventTotals {
    income: Decimal,
    iso_spread: Decimal,
    state_income: Decimal,
    state_iso_spread: Decimal,
    capital_gain: Decimal,
    proceeds: Decimal,
    cost: Decimal,
}

impl EventTotals {
    fn collect(events: &[EquityEvent]) -> Result<Self, CalculationError> {
        let mut totals = Self::default();
        for event in events {
            let ratio = event.state_apportionment_ratio()?;
            totals.income += event.income();
            totals.iso_spread += event.iso_spread();
            totals.state_income += event.income() * ratio;
            totals.state_iso_spread += event.iso_spread() * ratio;
            totals.capital_gain += event.capital_gain();
            totals.proceeds += event.cash_proceeds();
            totals.cost += event.cost();
        }
        Ok(totals)
    }
}

/// Projects [`ProjectionResult`] rows from one tax year's rates.
///
/// # Example
///
/// ```
/// # use rust_decimal_macros::dec;
/// # use planner_core::calculations::YearlyProjector;
/// # use planner_core::{FilingStatus, FiscalYearFacts, TaxYearRates};
/// # fn run(rates: &TaxYearRates) -> Result<(), planner_core::CalculationError> {
/// let projector = YearlyProjector::new(rates)?;
/// let facts = FiscalYearFacts::new(2022, dec!(200000));
/// let row = projector.project(FilingStatus::Single, &facts, &[])?;
/// assert_eq!(row.family_income, dec!(200000));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct YearlyProjector<'a> {
    rates: &'a TaxYearRates,
}

impl<'a> YearlyProjector<'a> {
    /// # Errors
    ///
    /// Returns [`CalculationError::Configuration`] if `rates` fails
    /// [`TaxYearRates::validate`].
    pub fn new(rates: &'a TaxYearRates) -> Result<Self, CalculationError> {
        rates.validate()?;
        Ok(Self { rates })
    }

    /// Projects one (year, filing status) row from `facts` and the events
    /// that fall in that year.
    ///
    /// Currency fields are truncated to whole units and the effective rate
    /// is rounded to two places; nothing is rounded before that.
    ///
    /// # Errors
    ///
    /// * [`CalculationError::InvalidArgument`] for negative facts.
    /// * [`CalculationError::DivisionByZero`] when an exercise falls on the
    ///   grant date, or when income plus capital gain is zero.
    pub fn project(
        &self,
        status: FilingStatus,
        facts: &FiscalYearFacts,
        events: &[EquityEvent],
    ) -> Result<ProjectionResult, CalculationError> {
        facts.validate()?;
        let rules = TaxRules::new(self.rates, status);
        let totals = EventTotals::collect(events)?;

        let own_income = facts.own_compensation() + totals.income;
        let spouse_income = facts.spouse_compensation();
        let family_income = own_income + spouse_income;

        let state_income = totals.state_income + facts.state_income_adjustment;
        let state_income_tax = rules.state_income_tax(state_income)?;
        let state_amt = rules.state_amt(state_income + totals.state_iso_spread, state_income_tax)?;

        let (federal_income_tax, amt_base, ordinary_income) = match status {
            FilingStatus::Married => (
                rules.federal_income_tax(family_income)?,
                family_income + totals.iso_spread,
                family_income,
            ),
            FilingStatus::Single => (
                rules.federal_income_tax(own_income)? + rules.federal_income_tax(spouse_income)?,
                own_income + totals.iso_spread,
                own_income,
            ),
        };
        let federal_amt = rules.federal_amt(amt_base, federal_income_tax)?;

        // a net loss is reported as is but taxed as no gain
        let capital_gain = totals.capital_gain;
        if capital_gain < Decimal::ZERO {
            warn!(year = facts.year, %capital_gain, "net capital loss taxed as zero gain");
        }
        let capital_gain_tax =
            rules.capital_gain_tax(capital_gain.max(Decimal::ZERO), ordinary_income)?;

        let total_tax =
            federal_income_tax + federal_amt + capital_gain_tax + state_income_tax + state_amt;
        let net_cash = facts.own_compensation() + spouse_income + totals.proceeds
            - totals.cost
            - total_tax;

        let effective_tax_rate = total_tax
            .checked_div(family_income + capital_gain)
            .ok_or(CalculationError::DivisionByZero("effective tax rate"))?;

        debug!(
            year = facts.year,
            %status,
            %family_income,
            %amt_base,
            %federal_income_tax,
            %federal_amt,
            %capital_gain_tax,
            %state_income_tax,
            %state_amt,
            %net_cash,
            "projected year"
        );

        Ok(ProjectionResult {
            year: facts.year,
            filing_status: status,
            net_cash: truncate_currency(net_cash),
            family_income: truncate_currency(family_income),
            capital_gain: truncate_currency(capital_gain),
            federal_income_tax: truncate_currency(federal_income_tax),
            state_income_tax: truncate_currency(state_income_tax),
            capital_gain_tax: truncate_currency(capital_gain_tax),
            federal_amt: truncate_currency(federal_amt),
            state_amt: truncate_currency(state_amt),
            effective_tax_rate: round_rate(effective_tax_rate),
        })
    }
}
