use rust_decimal::Decimal;
use thiserror::Error;

/// Errors surfaced by the computation core.
///
/// The core never recovers from these; the scenario driver (or whatever
/// sits above it) decides how to report them.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculationError {
    /// Rate tables, price anchors or event descriptors are malformed.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// An amount that must be non-negative was negative.
    #[error("{name} must be non-negative, got {value}")]
    InvalidArgument { name: &'static str, value: Decimal },

    /// A ratio had a zero denominator.
    #[error("division by zero while computing {0}")]
    DivisionByZero(&'static str),
}

impl CalculationError {
    pub(crate) fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}
