use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use planner_core::calculations::common::{round_rate, truncate_currency};
use planner_core::{ExerciseComparisonInput, FilingStatus, TaxRules, TaxYearRates, compare_exercise_timing};
use planner_data::logging::init_logging;
use planner_data::{DEFAULT_TAX_YEAR, RateLoader, ScenarioLoader, bundled_rates};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

/// Project taxes and cash for ISO/NSO exercise and sale plans.
///
/// Output is CSV on stdout; logs go to stderr. Rate tables default to the
/// bundled ones. Supply both --brackets and --deductions to use your own,
/// with the columns:
/// - brackets: tax_year,schedule,filing_status,threshold,rate
/// - deductions: tax_year,filing_status,amount
#[derive(Parser, Debug)]
#[command(name = "equity-planner")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level or filter directive (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Append log output to this file as well as stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// CSV file of bracket tables
    #[arg(long, global = true, requires = "deductions")]
    brackets: Option<PathBuf>,

    /// CSV file of standard deductions
    #[arg(long, global = true, requires = "brackets")]
    deductions: Option<PathBuf>,

    /// Tax year of the rate tables (defaults to the scenario's, then the
    /// latest bundled year)
    #[arg(short, long, global = true)]
    year: Option<i32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Project every year of a scenario file
    Project {
        /// TOML scenario file
        #[arg(short, long)]
        scenario: PathBuf,

        /// Filing status to project; repeat for several (defaults to the
        /// scenario's list)
        #[arg(long = "status", value_parser = parse_status)]
        statuses: Vec<FilingStatus>,
    },

    /// Compare exercising now against exercising at sale
    Compare {
        /// Ordinary income for the year, before the standard deduction
        #[arg(long)]
        ordinary_income: Decimal,

        #[arg(long, default_value = "0")]
        iso_units: Decimal,

        #[arg(long, default_value = "0")]
        nso_units: Decimal,

        /// ISO units granted (defaults to --iso-units)
        #[arg(long)]
        iso_total_units: Option<Decimal>,

        /// NSO units granted (defaults to --nso-units)
        #[arg(long)]
        nso_total_units: Option<Decimal>,

        #[arg(long)]
        strike: Decimal,

        /// Fair market value today
        #[arg(long)]
        fmv: Decimal,

        /// Expected price at the long-term sale
        #[arg(long)]
        sale_price: Decimal,

        #[arg(long, default_value = "single", value_parser = parse_status)]
        status: FilingStatus,
    },
}

fn parse_status(s: &str) -> Result<FilingStatus, String> {
    FilingStatus::parse(s).ok_or_else(|| format!("unknown filing status '{s}' (expected single or married)"))
}

/// One `compare` output row, currency truncated and rates rounded.
#[derive(Debug, Serialize)]
struct ComparisonRow {
    filing_status: FilingStatus,
    income_tax_due_now: Decimal,
    amt_due_now: Decimal,
    tax_due_now: Decimal,
    cost_now: Decimal,
    tax_at_sale: Decimal,
    long_term_profit: Decimal,
    tax_if_exercised_at_sale: Decimal,
    tax_savings: Decimal,
    current_tax_rate: Decimal,
    deferred_tax_rate: Decimal,
    sellable_value_after_tax: Decimal,
}

fn load_rates(
    brackets: Option<&Path>,
    deductions: Option<&Path>,
    year: i32,
) -> Result<TaxYearRates> {
    let (Some(brackets), Some(deductions)) = (brackets, deductions) else {
        return bundled_rates(year)
            .with_context(|| format!("No bundled rate tables for {year}"));
    };

    let file = File::open(brackets)
        .with_context(|| format!("Failed to open: {}", brackets.display()))?;
    let bracket_records = RateLoader::parse_brackets(file)
        .with_context(|| format!("Failed to parse CSV: {}", brackets.display()))?;

    let file = File::open(deductions)
        .with_context(|| format!("Failed to open: {}", deductions.display()))?;
    let deduction_records = RateLoader::parse_deductions(file)
        .with_context(|| format!("Failed to parse CSV: {}", deductions.display()))?;

    RateLoader::build(year, &bracket_records, &deduction_records)
        .with_context(|| format!("Failed to build {year} rate tables from {}", brackets.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref(), args.log_file.as_deref())?;

    let mut out = csv::Writer::from_writer(io::stdout());

    match args.command {
        Command::Project { scenario, statuses } => {
            let plan = ScenarioLoader::load(&scenario)
                .with_context(|| format!("Failed to load scenario: {}", scenario.display()))?;

            let year = args.year.or(plan.rates_year).unwrap_or(DEFAULT_TAX_YEAR);
            let rates = load_rates(args.brackets.as_deref(), args.deductions.as_deref(), year)?;
            let statuses = if statuses.is_empty() { plan.statuses } else { statuses };

            let rows = plan
                .scenario
                .project(&rates, &statuses)
                .context("Failed to project scenario")?;
            info!(rows = rows.len(), tax_year = year, "writing projection");

            for row in &rows {
                out.serialize(row).context("Failed to write CSV row")?;
            }
        }
        Command::Compare {
            ordinary_income,
            iso_units,
            nso_units,
            iso_total_units,
            nso_total_units,
            strike,
            fmv,
            sale_price,
            status,
        } => {
            let year = args.year.unwrap_or(DEFAULT_TAX_YEAR);
            let rates = load_rates(args.brackets.as_deref(), args.deductions.as_deref(), year)?;
            let rules = TaxRules::new(&rates, status);

            let input = ExerciseComparisonInput {
                ordinary_income,
                iso_units,
                nso_units,
                iso_total_units: iso_total_units.unwrap_or(iso_units),
                nso_total_units: nso_total_units.unwrap_or(nso_units),
                strike_price: strike,
                fair_market_value: fmv,
                sale_price,
            };
            let result = compare_exercise_timing(&rules, &input).context("Failed to compare exercise timing")?;

            out.serialize(ComparisonRow {
                filing_status: status,
                income_tax_due_now: truncate_currency(result.income_tax_due_now),
                amt_due_now: truncate_currency(result.amt_due_now),
                tax_due_now: truncate_currency(result.tax_due_now),
                cost_now: truncate_currency(result.cost_now),
                tax_at_sale: truncate_currency(result.tax_at_sale),
                long_term_profit: truncate_currency(result.long_term_profit),
                tax_if_exercised_at_sale: truncate_currency(result.tax_if_exercised_at_sale),
                tax_savings: truncate_currency(result.tax_savings),
                current_tax_rate: round_rate(result.current_tax_rate),
                deferred_tax_rate: round_rate(result.deferred_tax_rate),
                sellable_value_after_tax: truncate_currency(result.sellable_value_after_tax),
            })
            .context("Failed to write CSV row")?;
        }
    }

    out.flush().context("Failed to flush output")?;
    Ok(())
}
