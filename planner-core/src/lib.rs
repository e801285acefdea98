//! Tax and cash planning for ISO/NSO equity compensation.
//!
//! Rate tables are plain data ([`TaxYearRates`]) passed into every
//! calculation, so several tax years can be evaluated side by side.

mod error;
pub mod calculations;
pub mod models;
pub mod scenario;

#[cfg(test)]
mod testing;

pub use calculations::{
    ExerciseComparison, ExerciseComparisonInput, TaxRules, YearlyProjector, compare_exercise_timing,
    compute_tax,
};
pub use error::CalculationError;
pub use models::*;
pub use scenario::Scenario;
