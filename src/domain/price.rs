//! Daily price record.

use chrono::NaiveDate;

/// One day of market data. Immutable once loaded; the pipeline driver owns
/// the series for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
    pub volume: f64,
}
