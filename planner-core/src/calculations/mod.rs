//! Tax and cash calculations for equity compensation planning.
//!
//! Layered bottom-up: the progressive bracket engine, the compound tax rules
//! built on it, and the yearly projector and exercise-timing comparison
//! built on the rules.

pub mod common;
pub mod exercise_comparison;
pub mod progressive;
pub mod projector;
pub mod tax_rules;

pub use exercise_comparison::{ExerciseComparison, ExerciseComparisonInput, compare_exercise_timing};
pub use progressive::{BracketSlice, bracket_slices, compute_stacked_tax, compute_tax, marginal_rate};
pub use projector::YearlyProjector;
pub use tax_rules::{CapitalGainBreakdown, TaxRules};
