//! Price data access port trait.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Bars from `source` within the inclusive date range, ascending and validated.
    fn fetch_bars(
        &self,
        source: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, SigtraderError>;

    fn list_sources(&self) -> Result<Vec<String>, SigtraderError>;
}
