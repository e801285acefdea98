use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::CalculationError;

/// A known (date, share price) checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: Decimal,
}

impl PricePoint {
    pub fn new(
        date: NaiveDate,
        price: Decimal,
    ) -> Self {
        Self { date, price }
    }
}

/// Straight-line share price between two anchors.
///
/// Dates outside the anchors extrapolate along the same line; nothing is
/// clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceModel {
    start: PricePoint,
    end: PricePoint,
}

impl PriceModel {
    /// # Errors
    ///
    /// Returns [`CalculationError::Configuration`] unless `end.date` is after
    /// `start.date`.
    pub fn new(
        start: PricePoint,
        end: PricePoint,
    ) -> Result<Self, CalculationError> {
        if end.date <= start.date {
            return Err(CalculationError::Configuration(format!(
                "price anchors must be in date order, got {} then {}",
                start.date, end.date
            )));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> PricePoint {
        self.start
    }

    pub fn end(&self) -> PricePoint {
        self.end
    }

    /// Interpolated price on `date`, rounded to cents.
    ///
    /// # Example
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use rust_decimal_macros::dec;
    /// use planner_core::{PriceModel, PricePoint};
    ///
    /// let day = |d| NaiveDate::from_ymd_opt(2022, 1, d).unwrap();
    /// let model = PriceModel::new(
    ///     PricePoint::new(day(1), dec!(10.00)),
    ///     PricePoint::new(day(11), dec!(20.00)),
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(model.price_at(day(6)), dec!(15.00));
    /// assert_eq!(model.price_at(day(16)), dec!(25.00));
    /// ```
    pub fn price_at(
        &self,
        date: NaiveDate,
    ) -> Decimal {
        if date < self.start.date || date > self.end.date {
            warn!(%date, start = %self.start.date, end = %self.end.date, "extrapolating price outside anchors");
        }
        let elapsed = Decimal::from((date - self.start.date).num_days());
        // span is positive, checked in `new`
        let span = Decimal::from((self.end.date - self.start.date).num_days());
        let price = self.start.price + (self.end.price - self.start.price) * elapsed / span;
        price.round_dp(2)
    }
}
