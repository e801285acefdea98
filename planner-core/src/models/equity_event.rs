use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::PriceModel;
use crate::CalculationError;
use crate::calculations::common::ensure_non_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Exercise,
    Sale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    /// Incentive stock option: exercise spread is AMT-only income.
    Iso,
    /// Non-qualified stock option: exercise spread is ordinary income.
    Nso,
}

/// Grant terms shared by every event in a scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityGrant {
    pub strike_price: Decimal,
    pub grant_date: NaiveDate,
    /// Date residency in the taxing state ended. `None` means resident
    /// throughout, so exercises are fully apportioned to the state.
    pub move_out_date: Option<NaiveDate>,
}

impl EquityGrant {
    /// # Errors
    ///
    /// Returns [`CalculationError::Configuration`] when the move-out date
    /// precedes the grant date.
    pub fn validate(&self) -> Result<(), CalculationError> {
        match self.move_out_date {
            Some(move_out) if move_out < self.grant_date => Err(CalculationError::Configuration(format!(
                "move-out date {move_out} is before the grant date {}",
                self.grant_date
            ))),
            _ => Ok(()),
        }
    }

    /// Calendar date `months` after the grant date.
    pub fn date_after_months(
        &self,
        months: u32,
    ) -> Result<NaiveDate, CalculationError> {
        self.grant_date
            .checked_add_months(Months::new(months))
            .ok_or_else(|| {
                CalculationError::Configuration(format!(
                    "{months} months after {} is out of range",
                    self.grant_date
                ))
            })
    }
}

/// Caller-facing description of one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquityEventInput {
    pub date: NaiveDate,
    pub transaction: TransactionType,
    pub option: OptionType,
    /// Units; may be fractional when a lot is split across dates.
    pub quantity: Decimal,
    /// Price at which the sold NSO units were exercised (their cost basis).
    pub exercise_price: Option<Decimal>,
}

/// One exercise or sale, with its market price fixed at construction.
///
/// Every derived figure is a pure function of the stored fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquityEvent {
    date: NaiveDate,
    transaction: TransactionType,
    option: OptionType,
    quantity: Decimal,
    exercise_price: Option<Decimal>,
    market_price: Decimal,
    cost_basis: Decimal,
    grant: EquityGrant,
}

impl EquityEvent {
    /// Prices the event from `prices` and captures the grant terms.
    ///
    /// # Errors
    ///
    /// * [`CalculationError::InvalidArgument`] for a negative quantity or
    ///   exercise price.
    /// * [`CalculationError::Configuration`] for an NSO sale without an
    ///   exercise price, or a grant whose move-out date precedes its grant
    ///   date.
    pub fn new(
        input: EquityEventInput,
        grant: &EquityGrant,
        prices: &PriceModel,
    ) -> Result<Self, CalculationError> {
        grant.validate()?;
        ensure_non_negative("quantity", input.quantity)?;
        if let Some(price) = input.exercise_price {
            ensure_non_negative("exercise price", price)?;
        }

        let cost_basis = match (input.option, input.transaction, input.exercise_price) {
            (OptionType::Nso, TransactionType::Sale, Some(price)) => price,
            (OptionType::Nso, TransactionType::Sale, None) => {
                return Err(CalculationError::Configuration(format!(
                    "NSO sale on {} needs the exercise price of the sold units",
                    input.date
                )));
            }
            // qualifying ISO disposition: basis stays at strike
            _ => grant.strike_price,
        };

        Ok(Self {
            date: input.date,
            transaction: input.transaction,
            option: input.option,
            quantity: input.quantity,
            exercise_price: input.exercise_price,
            market_price: prices.price_at(input.date),
            cost_basis,
            grant: *grant,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn transaction(&self) -> TransactionType {
        self.transaction
    }

    pub fn option(&self) -> OptionType {
        self.option
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn exercise_price(&self) -> Option<Decimal> {
        self.exercise_price
    }

    pub fn market_price(&self) -> Decimal {
        self.market_price
    }

    pub fn is_exercise(&self) -> bool {
        self.transaction == TransactionType::Exercise
    }

    pub fn is_sale(&self) -> bool {
        self.transaction == TransactionType::Sale
    }

    fn spread(&self) -> Decimal {
        (self.market_price - self.grant.strike_price) * self.quantity
    }

    /// Ordinary income: the spread of an NSO exercise, otherwise zero.
    pub fn income(&self) -> Decimal {
        match (self.transaction, self.option) {
            (TransactionType::Exercise, OptionType::Nso) => self.spread(),
            _ => Decimal::ZERO,
        }
    }

    /// AMT-only income: the spread of an ISO exercise, otherwise zero.
    pub fn iso_spread(&self) -> Decimal {
        match (self.transaction, self.option) {
            (TransactionType::Exercise, OptionType::Iso) => self.spread(),
            _ => Decimal::ZERO,
        }
    }

    /// Realised gain on a sale over its cost basis; zero for exercises.
    pub fn capital_gain(&self) -> Decimal {
        match self.transaction {
            TransactionType::Sale => (self.market_price - self.cost_basis) * self.quantity,
            TransactionType::Exercise => Decimal::ZERO,
        }
    }

    /// Share of exercise income sourced to the state: days resident since
    /// grant over days from grant to the event. Zero for sales.
    ///
    /// # Errors
    ///
    /// Returns [`CalculationError::DivisionByZero`] when an exercise falls on
    /// the grant date.
    pub fn state_apportionment_ratio(&self) -> Result<Decimal, CalculationError> {
        if self.is_sale() {
            return Ok(Decimal::ZERO);
        }
        let Some(move_out) = self.grant.move_out_date else {
            return Ok(Decimal::ONE);
        };

        let resident_days = Decimal::from((move_out - self.grant.grant_date).num_days());
        let held_days = Decimal::from((self.date - self.grant.grant_date).num_days());
        let ratio = resident_days
            .checked_div(held_days)
            .ok_or(CalculationError::DivisionByZero("state apportionment ratio"))?;

        if ratio > Decimal::ONE {
            warn!(date = %self.date, %ratio, "exercise before move-out apportions more than all income to the state");
        }
        Ok(ratio)
    }

    /// Cash paid to exercise: strike × units.
    pub fn cost(&self) -> Decimal {
        match self.transaction {
            TransactionType::Exercise => self.grant.strike_price * self.quantity,
            TransactionType::Sale => Decimal::ZERO,
        }
    }

    /// Cash received from a sale: market price × units.
    pub fn cash_proceeds(&self) -> Decimal {
        match self.transaction {
            TransactionType::Sale => self.market_price * self.quantity,
            TransactionType::Exercise => Decimal::ZERO,
        }
    }
}
