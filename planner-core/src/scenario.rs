//! Multi-year scenario driver.

use std::collections::HashSet;

use chrono::Datelike;
use tracing::{info, warn};

use crate::calculations::YearlyProjector;
use crate::{
    CalculationError, EquityEvent, EquityEventInput, EquityGrant, FilingStatus, FiscalYearFacts,
    PriceModel, ProjectionResult, TaxYearRates,
};

/// One grant, its price path, the household's yearly facts and the planned
/// transactions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    grant: EquityGrant,
    prices: PriceModel,
    years: Vec<FiscalYearFacts>,
    events: Vec<EquityEvent>,
}

impl Scenario {
    /// Prices every event and checks the yearly facts.
    ///
    /// # Errors
    ///
    /// * [`CalculationError::Configuration`] if the grant moves out before
    ///   it is granted, a year is listed twice or an event is malformed.
    /// * [`CalculationError::InvalidArgument`] for negative facts or
    ///   quantities.
    pub fn new(
        grant: EquityGrant,
        prices: PriceModel,
        years: Vec<FiscalYearFacts>,
        events: Vec<EquityEventInput>,
    ) -> Result<Self, CalculationError> {
        grant.validate()?;
        let mut seen = HashSet::new();
        for facts in &years {
            facts.validate()?;
            if !seen.insert(facts.year) {
                return Err(CalculationError::Configuration(format!(
                    "year {} is listed more than once",
                    facts.year
                )));
            }
        }

        let events = events
            .into_iter()
            .map(|input| EquityEvent::new(input, &grant, &prices))
            .collect::<Result<Vec<_>, _>>()?;

        for event in &events {
            if !seen.contains(&event.date().year()) {
                warn!(date = %event.date(), "event falls outside every projected year");
            }
        }

        Ok(Self {
            grant,
            prices,
            years,
            events,
        })
    }

    pub fn grant(&self) -> &EquityGrant {
        &self.grant
    }

    pub fn prices(&self) -> &PriceModel {
        &self.prices
    }

    pub fn years(&self) -> &[FiscalYearFacts] {
        &self.years
    }

    pub fn events(&self) -> &[EquityEvent] {
        &self.events
    }

    /// Events dated in calendar year `year`, in input order.
    pub fn events_in_year(
        &self,
        year: i32,
    ) -> Vec<EquityEvent> {
        self.events
            .iter()
            .filter(|event| event.date().year() == year)
            .cloned()
            .collect()
    }

    /// One row per (year, status): years in the order given, statuses in
    /// the order requested.
    ///
    /// # Errors
    ///
    /// Stops at the first projection that fails and returns its error.
    pub fn project(
        &self,
        rates: &TaxYearRates,
        statuses: &[FilingStatus],
    ) -> Result<Vec<ProjectionResult>, CalculationError> {
        let projector = YearlyProjector::new(rates)?;
        let mut rows = Vec::with_capacity(self.years.len() * statuses.len());

        for facts in &self.years {
            let events = self.events_in_year(facts.year);
            for &status in statuses {
                rows.push(projector.project(status, facts, &events)?);
            }
        }

        info!(
            years = self.years.len(),
            events = self.events.len(),
            rows = rows.len(),
            tax_year = rates.tax_year,
            "projected scenario"
        );
        Ok(rows)
    }
}
