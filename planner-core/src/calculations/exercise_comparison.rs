//! Exercise now or at sale.
//!
//! Compares exercising a block of options today at fair market value and
//! holding the shares to a long-term sale, against waiting and exercising
//! at the sale price. Everything is measured against one year's ordinary
//! income, which is assumed unchanged between the two dates.
//!
//! The grant totals also price what is left over: every ISO unit not
//! exercised, and the NSO units of the first vest beyond the ISO grant,
//! sold at the sale price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::common::ensure_non_negative;
use super::tax_rules::TaxRules;
use crate::CalculationError;

/// Units and prices being compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseComparisonInput {
    /// Ordinary income for the year before the standard deduction,
    /// excluding anything from these options.
    pub ordinary_income: Decimal,
    pub iso_units: Decimal,
    pub nso_units: Decimal,
    /// Units granted; the exercised units come out of these.
    pub iso_total_units: Decimal,
    pub nso_total_units: Decimal,
    pub strike_price: Decimal,
    pub fair_market_value: Decimal,
    pub sale_price: Decimal,
}

impl ExerciseComparisonInput {
    fn validate(&self) -> Result<(), CalculationError> {
        ensure_non_negative("ordinary income", self.ordinary_income)?;
        ensure_non_negative("ISO units", self.iso_units)?;
        ensure_non_negative("NSO units", self.nso_units)?;
        ensure_non_negative("unexercised ISO units", self.iso_total_units - self.iso_units)?;
        ensure_non_negative("unexercised NSO units", self.nso_total_units - self.nso_units)?;
        ensure_non_negative("strike price", self.strike_price)?;
        ensure_non_negative("fair market value", self.fair_market_value)?;
        ensure_non_negative("sale price", self.sale_price)?;
        Ok(())
    }

    fn units(&self) -> Decimal {
        self.iso_units + self.nso_units
    }

    /// Unexercised units that can be sold: (ISO, NSO).
    ///
    /// The first vest is a quarter of the whole grant, ISO units first, so
    /// only its remainder past the ISO grant is NSO.
    fn sellable_units(&self) -> (Decimal, Decimal) {
        let nso_first_vest = (self.iso_total_units + self.nso_total_units) / Decimal::from(4)
            - self.iso_total_units;
        let iso = self.iso_total_units - self.iso_units;
        let nso = (nso_first_vest - self.nso_units).max(Decimal::ZERO);
        (iso, nso)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseComparison {
    /// Regular federal and state tax on the NSO spread today.
    pub income_tax_due_now: Decimal,
    /// Federal AMT triggered by today's spread.
    pub amt_due_now: Decimal,
    pub tax_due_now: Decimal,
    /// Strike paid plus tax due now.
    pub cost_now: Decimal,
    /// Long-term gain tax when the exercised shares are sold.
    pub tax_at_sale: Decimal,
    pub long_term_profit: Decimal,
    /// Total tax if every unit is instead exercised at the sale price.
    pub tax_if_exercised_at_sale: Decimal,
    pub tax_savings: Decimal,
    /// Tax of exercising now, as a share of the total spread at sale.
    pub current_tax_rate: Decimal,
    /// Tax of exercising at sale, as a share of the same spread.
    pub deferred_tax_rate: Decimal,
    /// Proceeds of selling the sellable unexercised units at the sale
    /// price, net of strike and the tax on their spread.
    pub sellable_value_after_tax: Decimal,
}

/// Regular tax on `income`: federal (with FICA) plus state.
fn regular_tax(
    rules: &TaxRules<'_>,
    income: Decimal,
) -> Result<Decimal, CalculationError> {
    Ok(rules.federal_income_tax(income)? + rules.state_income_tax(income)?)
}

/// Extra regular tax from raising `base` by `extra`.
fn incremental_regular_tax(
    rules: &TaxRules<'_>,
    base: Decimal,
    extra: Decimal,
) -> Result<Decimal, CalculationError> {
    Ok(regular_tax(rules, base + extra)? - regular_tax(rules, base)?)
}

/// Extra state tax from raising `base` by `extra`.
fn incremental_state_tax(
    rules: &TaxRules<'_>,
    base: Decimal,
    extra: Decimal,
) -> Result<Decimal, CalculationError> {
    Ok(rules.state_income_tax(base + extra)? - rules.state_income_tax(base)?)
}

/// Tax owed when `iso_units` and `nso_units` are exercised at `price`:
/// regular tax on the NSO spread plus AMT over the new regular tax.
fn exercise_tax(
    rules: &TaxRules<'_>,
    input: &ExerciseComparisonInput,
    price: Decimal,
) -> Result<(Decimal, Decimal), CalculationError> {
    let spread = price - input.strike_price;
    let income = input.ordinary_income;
    let nso_income = input.nso_units * spread;

    let income_tax = incremental_regular_tax(rules, income, nso_income)?;
    let amt = rules.federal_amt(
        income + input.units() * spread,
        rules.federal_income_tax(income + nso_income)?,
    )?;
    Ok((income_tax, amt))
}

/// Exercise-and-sell of the sellable units at the sale price: NSO spread as
/// ordinary income, ISO spread as long-term gain on top of it.
fn sellable_after_tax(
    rules: &TaxRules<'_>,
    input: &ExerciseComparisonInput,
) -> Result<Decimal, CalculationError> {
    let spread = input.sale_price - input.strike_price;
    let income = input.ordinary_income;
    let (iso_units, nso_units) = input.sellable_units();
    let nso_income = nso_units * spread;
    let iso_gain = iso_units * spread;

    let tax = incremental_regular_tax(rules, income, nso_income)?
        + rules.capital_gain_tax(iso_gain, income + nso_income)?
        + incremental_state_tax(rules, income + nso_income, iso_gain)?;
    Ok(nso_income + iso_gain - tax)
}

/// Compares exercising now against exercising at the sale price.
///
/// # Errors
///
/// * [`CalculationError::InvalidArgument`] for negative inputs, or a fair
///   market value or sale price below the strike.
/// * [`CalculationError::DivisionByZero`] when there are no units or the
///   sale price equals the strike.
pub fn compare_exercise_timing(
    rules: &TaxRules<'_>,
    input: &ExerciseComparisonInput,
) -> Result<ExerciseComparison, CalculationError> {
    input.validate()?;
    ensure_non_negative("spread at fair market value", input.fair_market_value - input.strike_price)?;
    ensure_non_negative("spread at sale", input.sale_price - input.strike_price)?;

    let income = input.ordinary_income;
    let units = input.units();

    let (income_tax_due_now, amt_due_now) = exercise_tax(rules, input, input.fair_market_value)?;
    let tax_due_now = income_tax_due_now + amt_due_now;
    let cost_now = units * input.strike_price + tax_due_now;

    // ISO basis is the strike, NSO basis steps up to today's value
    let gain = input.iso_units * (input.sale_price - input.strike_price)
        + input.nso_units * (input.sale_price - input.fair_market_value);
    let gain = gain.max(Decimal::ZERO);
    let tax_at_sale =
        rules.capital_gain_tax(gain, income)? + incremental_state_tax(rules, income, gain)?;
    let long_term_profit = units * input.sale_price - cost_now - tax_at_sale;

    let spread_at_sale = input.sale_price - input.strike_price;
    let (income_tax_later, amt_later) = exercise_tax(rules, input, input.sale_price)?;
    let nso_income_later = input.nso_units * spread_at_sale;
    let iso_gain_later = input.iso_units * spread_at_sale;
    let gain_tax_later = rules.capital_gain_tax(iso_gain_later, income + nso_income_later)?
        + incremental_state_tax(rules, income + nso_income_later, iso_gain_later)?;
    let tax_if_exercised_at_sale = income_tax_later + amt_later + gain_tax_later;

    let tax_savings = tax_if_exercised_at_sale - tax_at_sale - tax_due_now;

    let total_spread = spread_at_sale * units;
    let current_tax_rate = (tax_at_sale + tax_due_now)
        .checked_div(total_spread)
        .ok_or(CalculationError::DivisionByZero("exercise comparison rate"))?;
    let deferred_tax_rate = tax_if_exercised_at_sale
        .checked_div(total_spread)
        .ok_or(CalculationError::DivisionByZero("exercise comparison rate"))?;

    let sellable_value_after_tax = sellable_after_tax(rules, input)?;

    debug!(
        status = %rules.filing_status(),
        %tax_due_now,
        %tax_at_sale,
        %tax_if_exercised_at_sale,
        %tax_savings,
        %sellable_value_after_tax,
        "compared exercise timing"
    );

    Ok(ExerciseComparison {
        income_tax_due_now,
        amt_due_now,
        tax_due_now,
        cost_now,
        tax_at_sale,
        long_term_profit,
        tax_if_exercised_at_sale,
        tax_savings,
        current_tax_rate,
        deferred_tax_rate,
        sellable_value_after_tax,
    })
}
