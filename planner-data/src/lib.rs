//! Rate tables, scenario files and logging for the equity planner.

mod bundled;
pub mod logging;
mod rate_loader;
mod scenario_loader;

pub use bundled::{BUNDLED_BRACKETS, BUNDLED_DEDUCTIONS, DEFAULT_TAX_YEAR, bundled_rates, bundled_years};
pub use rate_loader::{BracketRecord, DeductionRecord, RateLoader, RateLoaderError};
pub use scenario_loader::{ScenarioLoadError, ScenarioLoader, ScenarioPlan};
