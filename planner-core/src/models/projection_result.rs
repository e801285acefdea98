use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::FilingStatus;

/// One projected (year, filing status) row.
///
/// Currency figures are whole units truncated toward zero;
/// `effective_tax_rate` is rounded to two decimal places.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub year: i32,
    pub filing_status: FilingStatus,
    pub net_cash: Decimal,
    pub family_income: Decimal,
    pub capital_gain: Decimal,
    pub federal_income_tax: Decimal,
    pub state_income_tax: Decimal,
    pub capital_gain_tax: Decimal,
    pub federal_amt: Decimal,
    pub state_amt: Decimal,
    pub effective_tax_rate: Decimal,
}

impl ProjectionResult {
    /// Sum of the five tax components.
    pub fn total_tax(&self) -> Decimal {
        self.federal_income_tax
            + self.state_income_tax
            + self.capital_gain_tax
            + self.federal_amt
            + self.state_amt
    }
}
