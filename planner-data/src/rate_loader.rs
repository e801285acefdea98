use std::collections::BTreeSet;
use std::io::Read;

use planner_core::{
    ByFilingStatus, CalculationError, FilingStatus, Schedule, TaxRate, TaxTable, TaxTableSet,
    TaxYearRates,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur when loading rate tables.
#[derive(Debug, Error)]
pub enum RateLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Invalid filing status: {0}")]
    InvalidFilingStatus(String),

    #[error("Tax year {0} not found in rate data")]
    TaxYearNotFound(i32),

    #[error("No {schedule} brackets for {filing_status} in {tax_year}")]
    MissingTable {
        tax_year: i32,
        schedule: Schedule,
        filing_status: FilingStatus,
    },

    #[error("No standard deduction for {filing_status} in {tax_year}")]
    MissingDeduction {
        tax_year: i32,
        filing_status: FilingStatus,
    },

    #[error("Invalid rate data: {0}")]
    Calculation(#[from] CalculationError),
}

impl From<csv::Error> for RateLoaderError {
    fn from(err: csv::Error) -> Self {
        RateLoaderError::CsvParse(err.to_string())
    }
}

/// A single record from the brackets CSV file.
///
/// - `tax_year`: The tax year (e.g., 2022)
/// - `schedule`: One of `income`, `social_security`, `medicare`, `niit`,
///   `amt`, `capital_gain`, `state_income`, `state_amt`
/// - `filing_status`: `single` or `married`
/// - `threshold`: Lower bound of the bracket
/// - `rate`: The marginal rate as a decimal (e.g., 0.10 for 10%)
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BracketRecord {
    pub tax_year: i32,
    pub schedule: String,
    pub filing_status: String,
    pub threshold: Decimal,
    pub rate: Decimal,
}

/// A single record from the standard deductions CSV file.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DeductionRecord {
    pub tax_year: i32,
    pub filing_status: String,
    pub amount: Decimal,
}

fn parse_schedule(code: &str) -> Result<Schedule, RateLoaderError> {
    Schedule::parse(code).ok_or_else(|| RateLoaderError::InvalidSchedule(code.to_string()))
}

fn parse_filing_status(code: &str) -> Result<FilingStatus, RateLoaderError> {
    FilingStatus::parse(code).ok_or_else(|| RateLoaderError::InvalidFilingStatus(code.to_string()))
}

/// Loader for bracket tables and standard deductions from CSV files.
///
/// Rows for one (schedule, filing status) must appear in ascending threshold
/// order; they are not re-sorted, so an out-of-order file is rejected rather
/// than silently repaired.
pub struct RateLoader;

impl RateLoader {
    /// Parse bracket records from a CSV reader.
    pub fn parse_brackets<R: Read>(reader: R) -> Result<Vec<BracketRecord>, RateLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: BracketRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Parse standard deduction records from a CSV reader.
    pub fn parse_deductions<R: Read>(reader: R) -> Result<Vec<DeductionRecord>, RateLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: DeductionRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Tax years present in `brackets`, ascending.
    pub fn available_years(brackets: &[BracketRecord]) -> Vec<i32> {
        brackets
            .iter()
            .map(|record| record.tax_year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Assemble one tax year's [`TaxYearRates`] from parsed records.
    ///
    /// Every schedule needs brackets for both filing statuses, and both
    /// statuses need a standard deduction. Records for other years are
    /// ignored, but every schedule and filing status code is checked.
    pub fn build(
        tax_year: i32,
        brackets: &[BracketRecord],
        deductions: &[DeductionRecord],
    ) -> Result<TaxYearRates, RateLoaderError> {
        let mut rows = Vec::new();
        for record in brackets {
            let schedule = parse_schedule(&record.schedule)?;
            let status = parse_filing_status(&record.filing_status)?;
            if record.tax_year == tax_year {
                rows.push((schedule, status, TaxRate::new(record.threshold, record.rate)));
            }
        }
        if rows.is_empty() {
            return Err(RateLoaderError::TaxYearNotFound(tax_year));
        }

        let table = |schedule: Schedule, status: FilingStatus| -> Result<TaxTable, RateLoaderError> {
            let rates: Vec<TaxRate> = rows
                .iter()
                .filter(|(s, f, _)| *s == schedule && *f == status)
                .map(|(_, _, rate)| *rate)
                .collect();
            if rates.is_empty() {
                return Err(RateLoaderError::MissingTable {
                    tax_year,
                    schedule,
                    filing_status: status,
                });
            }
            Ok(TaxTable::new(rates)?)
        };
        let table_set = |schedule: Schedule| -> Result<TaxTableSet, RateLoaderError> {
            Ok(ByFilingStatus::new(
                table(schedule, FilingStatus::Single)?,
                table(schedule, FilingStatus::Married)?,
            ))
        };

        let mut amounts = Vec::new();
        for record in deductions {
            let status = parse_filing_status(&record.filing_status)?;
            if record.tax_year == tax_year {
                amounts.push((status, record.amount));
            }
        }
        let deduction = |status: FilingStatus| -> Result<Decimal, RateLoaderError> {
            amounts
                .iter()
                .find(|(s, _)| *s == status)
                .map(|(_, amount)| *amount)
                .ok_or(RateLoaderError::MissingDeduction {
                    tax_year,
                    filing_status: status,
                })
        };

        let rates = TaxYearRates {
            tax_year,
            standard_deduction: ByFilingStatus::new(
                deduction(FilingStatus::Single)?,
                deduction(FilingStatus::Married)?,
            ),
            income: table_set(Schedule::Income)?,
            social_security: table_set(Schedule::SocialSecurity)?,
            medicare: table_set(Schedule::Medicare)?,
            niit: table_set(Schedule::Niit)?,
            amt: table_set(Schedule::Amt)?,
            capital_gain: table_set(Schedule::CapitalGain)?,
            state_income: table_set(Schedule::StateIncome)?,
            state_amt: table_set(Schedule::StateAmt)?,
        };
        rates.validate()?;

        debug!(tax_year, brackets = rows.len(), "built rate tables");
        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const DEDUCTIONS: &str = "tax_year,filing_status,amount\n2022,single,12950\n2022,married,25900\n";

    /// One bracket per schedule and status, except a three-bracket
    /// capital gain table.
    fn minimal_brackets() -> String {
        let mut csv = String::from("tax_year,schedule,filing_status,threshold,rate\n");
        for schedule in Schedule::ALL {
            for status in ["single", "married"] {
                if schedule == Schedule::CapitalGain {
                    csv.push_str(&format!("2022,capital_gain,{status},0,0\n"));
                    csv.push_str(&format!("2022,capital_gain,{status},40401,0.15\n"));
                    csv.push_str(&format!("2022,capital_gain,{status},445851,0.20\n"));
                } else {
                    csv.push_str(&format!("2022,{},{status},0,0.10\n", schedule.as_str()));
                }
            }
        }
        csv
    }

    fn build(brackets: &str) -> Result<TaxYearRates, RateLoaderError> {
        let brackets = RateLoader::parse_brackets(brackets.as_bytes())?;
        let deductions = RateLoader::parse_deductions(DEDUCTIONS.as_bytes())?;
        RateLoader::build(2022, &brackets, &deductions)
    }

    #[test]
    fn test_parse_brackets_single_row() {
        let csv = "tax_year,schedule,filing_status,threshold,rate\n2022,income,single,10275,0.12";

        let records = RateLoader::parse_brackets(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![BracketRecord {
                tax_year: 2022,
                schedule: "income".to_string(),
                filing_status: "single".to_string(),
                threshold: dec!(10275),
                rate: dec!(0.12),
            }]
        );
    }

    #[test]
    fn test_parse_deductions() {
        let records = RateLoader::parse_deductions(DEDUCTIONS.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].filing_status, "married");
        assert_eq!(records[1].amount, dec!(25900));
    }

    #[test]
    fn test_parse_missing_column() {
        let csv = "tax_year,schedule,threshold\n2022,income,0";

        let err = RateLoader::parse_brackets(csv.as_bytes()).expect_err("Should fail for missing column");
        let RateLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "Expected 'missing field' in error, got: {}", msg);
    }

    #[test]
    fn test_build_minimal_tables() {
        let rates = build(&minimal_brackets()).expect("Failed to build rates");

        assert_eq!(rates.tax_year, 2022);
        assert_eq!(*rates.standard_deduction.get(FilingStatus::Married), dec!(25900));
        assert_eq!(rates.capital_gain.get(FilingStatus::Single).brackets().len(), 3);
        assert_eq!(rates.income.get(FilingStatus::Single).brackets().len(), 1);
    }

    #[test]
    fn test_build_unknown_year() {
        let brackets = RateLoader::parse_brackets(minimal_brackets().as_bytes()).unwrap();

        let result = RateLoader::build(2030, &brackets, &[]);

        assert!(matches!(result, Err(RateLoaderError::TaxYearNotFound(2030))));
    }

    #[test]
    fn test_build_invalid_schedule() {
        let csv = format!("{}2022,payroll,single,0,0.1\n", minimal_brackets());

        let result = build(&csv);

        let Err(RateLoaderError::InvalidSchedule(code)) = result else {
            panic!("Expected InvalidSchedule error, got: {:?}", result);
        };
        assert_eq!(code, "payroll");
    }

    #[test]
    fn test_build_missing_table() {
        let csv: String = minimal_brackets()
            .lines()
            .filter(|line| !line.starts_with("2022,niit,married"))
            .map(|line| format!("{line}\n"))
            .collect();

        let result = build(&csv);

        assert!(matches!(
            result,
            Err(RateLoaderError::MissingTable {
                schedule: Schedule::Niit,
                filing_status: FilingStatus::Married,
                ..
            })
        ));
    }

    #[test]
    fn test_build_rejects_out_of_order_thresholds() {
        let csv = format!(
            "{}2022,income,single,0,0.12\n",
            minimal_brackets()
        );

        let result = build(&csv);

        assert!(matches!(
            result,
            Err(RateLoaderError::Calculation(CalculationError::Configuration(_)))
        ));
    }

    #[test]
    fn test_build_missing_deduction() {
        let brackets = RateLoader::parse_brackets(minimal_brackets().as_bytes()).unwrap();
        let deductions = RateLoader::parse_deductions(
            "tax_year,filing_status,amount\n2022,single,12950\n".as_bytes(),
        )
        .unwrap();

        let result = RateLoader::build(2022, &brackets, &deductions);

        assert!(matches!(
            result,
            Err(RateLoaderError::MissingDeduction {
                filing_status: FilingStatus::Married,
                ..
            })
        ));
    }

    #[test]
    fn test_available_years_sorted_and_unique() {
        let csv = "tax_year,schedule,filing_status,threshold,rate\n\
                   2023,income,single,0,0.1\n\
                   2022,income,single,0,0.1\n\
                   2023,income,married,0,0.1\n";
        let records = RateLoader::parse_brackets(csv.as_bytes()).unwrap();

        assert_eq!(RateLoader::available_years(&records), vec![2022, 2023]);
    }
}
