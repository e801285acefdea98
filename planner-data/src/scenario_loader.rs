use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use planner_core::{
    CalculationError, EquityEventInput, EquityGrant, FilingStatus, FiscalYearFacts, OptionType,
    PriceModel, PricePoint, Scenario, TransactionType,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading a scenario file.
#[derive(Debug, Error)]
pub enum ScenarioLoadError {
    #[error("Failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("Event {index} must give exactly one of `date` or `months_after_grant`")]
    EventTiming { index: usize },

    #[error("Invalid scenario: {0}")]
    Calculation(#[from] CalculationError),
}

impl From<toml::de::Error> for ScenarioLoadError {
    fn from(err: toml::de::Error) -> Self {
        ScenarioLoadError::TomlParse(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    strike_price: Decimal,
    grant_date: NaiveDate,
    move_out_date: Option<NaiveDate>,
    price: PriceAnchors,
    rates_year: Option<i32>,
    #[serde(default)]
    statuses: Vec<FilingStatus>,
    #[serde(default)]
    years: Vec<FiscalYearFacts>,
    #[serde(default)]
    events: Vec<EventRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PriceAnchors {
    start: PricePoint,
    end: PricePoint,
}

/// One `[[events]]` table. Timing is either a calendar date or a count of
/// months after the grant date.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EventRecord {
    date: Option<NaiveDate>,
    months_after_grant: Option<u32>,
    transaction: TransactionType,
    option: OptionType,
    quantity: Decimal,
    exercise_price: Option<Decimal>,
}

impl EventRecord {
    fn into_input(
        self,
        index: usize,
        grant: &EquityGrant,
    ) -> Result<EquityEventInput, ScenarioLoadError> {
        let date = match (self.date, self.months_after_grant) {
            (Some(date), None) => date,
            (None, Some(months)) => grant.date_after_months(months)?,
            _ => return Err(ScenarioLoadError::EventTiming { index }),
        };
        Ok(EquityEventInput {
            date,
            transaction: self.transaction,
            option: self.option,
            quantity: self.quantity,
            exercise_price: self.exercise_price,
        })
    }
}

/// A parsed scenario plus the run options stored alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioPlan {
    /// Tax year of the rate tables to apply, when the file names one.
    pub rates_year: Option<i32>,
    /// Filing statuses to project, in output order. Both when the file
    /// lists none.
    pub statuses: Vec<FilingStatus>,
    pub scenario: Scenario,
}

/// Loader for TOML scenario files.
///
/// Dates are quoted `YYYY-MM-DD` strings; amounts may be numbers or
/// quoted decimals.
///
/// ```toml
/// strike_price = 15.68
/// grant_date = "2021-03-19"
/// move_out_date = "2022-02-01"
///
/// [price.start]
/// date = "2022-02-01"
/// price = 60
///
/// [price.end]
/// date = "2025-03-15"
/// price = 140
///
/// [[years]]
/// year = 2022
/// salary = 200000
///
/// [[events]]
/// months_after_grant = 18
/// transaction = "exercise"
/// option = "iso"
/// quantity = 1000
/// ```
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Parse a scenario from TOML text.
    pub fn parse(text: &str) -> Result<ScenarioPlan, ScenarioLoadError> {
        let file: ScenarioFile = toml::from_str(text)?;

        let grant = EquityGrant {
            strike_price: file.strike_price,
            grant_date: file.grant_date,
            move_out_date: file.move_out_date,
        };
        let prices = PriceModel::new(file.price.start, file.price.end)?;

        let events = file
            .events
            .into_iter()
            .enumerate()
            .map(|(index, record)| record.into_input(index, &grant))
            .collect::<Result<Vec<_>, _>>()?;

        let statuses = if file.statuses.is_empty() {
            FilingStatus::ALL.to_vec()
        } else {
            file.statuses
        };

        debug!(
            years = file.years.len(),
            events = events.len(),
            "parsed scenario"
        );

        Ok(ScenarioPlan {
            rates_year: file.rates_year,
            statuses,
            scenario: Scenario::new(grant, prices, file.years, events)?,
        })
    }

    /// Read and parse a scenario file.
    pub fn load(path: &Path) -> Result<ScenarioPlan, ScenarioLoadError> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = r#"
strike_price = 15.68
grant_date = "2021-03-19"
move_out_date = "2022-02-01"

[price.start]
date = "2022-02-01"
price = 60

[price.end]
date = "2025-03-15"
price = 140
"#;

    fn date(
        y: i32,
        m: u32,
        d: u32,
    ) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_minimal_scenario() {
        let plan = ScenarioLoader::parse(HEADER).expect("Failed to parse scenario");

        assert_eq!(plan.rates_year, None);
        assert_eq!(plan.statuses, FilingStatus::ALL.to_vec());
        assert_eq!(plan.scenario.grant().strike_price, dec!(15.68));
        assert_eq!(plan.scenario.grant().move_out_date, Some(date(2022, 2, 1)));
        assert_eq!(plan.scenario.prices().end().price, dec!(140));
        assert!(plan.scenario.events().is_empty());
    }

    #[test]
    fn test_parse_years_with_defaults() {
        let text = format!(
            "{HEADER}\n[[years]]\nyear = 2022\nsalary = 200000\nspouse_salary = 150000\n"
        );

        let plan = ScenarioLoader::parse(&text).unwrap();

        let facts = &plan.scenario.years()[0];
        assert_eq!(facts.year, 2022);
        assert_eq!(facts.spouse_salary, dec!(150000));
        assert_eq!(facts.vested_rsu, dec!(0));
    }

    #[test]
    fn test_parse_event_by_month_index() {
        let text = format!(
            "{HEADER}\n[[events]]\nmonths_after_grant = 18\ntransaction = \"exercise\"\noption = \"iso\"\nquantity = 1000\n"
        );

        let plan = ScenarioLoader::parse(&text).unwrap();

        let event = &plan.scenario.events()[0];
        assert_eq!(event.date(), date(2022, 9, 19));
        assert_eq!(event.option(), OptionType::Iso);
        assert!(event.is_exercise());
    }

    #[test]
    fn test_parse_event_by_date_with_statuses() {
        let text = format!(
            "rates_year = 2022\nstatuses = [\"single\"]\n{HEADER}\n[[events]]\ndate = \"2023-02-01\"\ntransaction = \"sale\"\noption = \"nso\"\nquantity = 10\nexercise_price = \"20.00\"\n"
        );

        let plan = ScenarioLoader::parse(&text).unwrap();

        assert_eq!(plan.rates_year, Some(2022));
        assert_eq!(plan.statuses, vec![FilingStatus::Single]);
        let event = &plan.scenario.events()[0];
        assert_eq!(event.market_price(), dec!(85.66));
        assert_eq!(event.capital_gain(), dec!(656.60));
    }

    #[test]
    fn test_parse_event_with_both_timings() {
        let text = format!(
            "{HEADER}\n[[events]]\ndate = \"2023-02-01\"\nmonths_after_grant = 3\ntransaction = \"exercise\"\noption = \"iso\"\nquantity = 1\n"
        );

        let result = ScenarioLoader::parse(&text);

        assert!(matches!(result, Err(ScenarioLoadError::EventTiming { index: 0 })));
    }

    #[test]
    fn test_parse_event_without_timing() {
        let text = format!(
            "{HEADER}\n[[events]]\ntransaction = \"exercise\"\noption = \"iso\"\nquantity = 1\n"
        );

        let result = ScenarioLoader::parse(&text);

        assert!(matches!(result, Err(ScenarioLoadError::EventTiming { index: 0 })));
    }

    #[test]
    fn test_parse_rejects_unknown_field() {
        let text = format!("strik_price = 1\n{HEADER}");

        let err = ScenarioLoader::parse(&text).expect_err("Should fail for unknown field");
        let ScenarioLoadError::TomlParse(msg) = err else {
            panic!("Expected TomlParse error, got: {:?}", err);
        };
        assert!(msg.contains("unknown field"), "Expected 'unknown field' in error, got: {}", msg);
    }

    #[test]
    fn test_parse_rejects_move_out_before_grant() {
        let text = HEADER.replace(
            "move_out_date = \"2022-02-01\"",
            "move_out_date = \"2021-01-01\"",
        );
        let text = format!(
            "{text}\n[[events]]\ndate = \"2022-06-01\"\ntransaction = \"exercise\"\noption = \"nso\"\nquantity = 100\n"
        );

        let err = ScenarioLoader::parse(&text).expect_err("Should fail for move-out before grant");
        let ScenarioLoadError::Calculation(CalculationError::Configuration(msg)) = err else {
            panic!("Expected Configuration error, got: {:?}", err);
        };
        assert!(msg.contains("move-out date"), "got: {}", msg);
    }

    #[test]
    fn test_parse_rejects_reversed_price_anchors() {
        let text = HEADER.replace("2025-03-15", "2020-03-15");

        let result = ScenarioLoader::parse(&text);

        assert!(matches!(
            result,
            Err(ScenarioLoadError::Calculation(CalculationError::Configuration(_)))
        ));
    }
}
