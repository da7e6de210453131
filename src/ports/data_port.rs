//! Price data access port trait.

use chrono::NaiveDate;

use crate::domain::error::CrosstraderError;
use crate::domain::price::PricePoint;

pub trait DataPort {
    /// Fetch daily prices for `symbol` in `[start, end]`, sorted by date.
    /// An empty result is not an error; callers decide whether empty is
    /// acceptable for their operation.
    fn fetch_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PricePoint>, CrosstraderError>;
}
