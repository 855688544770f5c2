//! Daily price bar representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::SigtraderError;

/// One OHLCV observation. Bars are immutable once loaded and handed to the
/// core by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl PriceBar {
    /// Checks positivity and `low <= open, close <= high`.
    pub fn validate(&self) -> Result<(), String> {
        let prices = [self.open, self.high, self.low, self.close];
        if prices.iter().any(|p| !p.is_finite() || *p <= 0.0) {
            return Err("prices must be positive and finite".to_string());
        }
        if self.low > self.high {
            return Err(format!("low {} above high {}", self.low, self.high));
        }
        for (label, value) in [("open", self.open), ("close", self.close)] {
            if value < self.low || value > self.high {
                return Err(format!(
                    "{label} {value} outside [{}, {}]",
                    self.low, self.high
                ));
            }
        }
        Ok(())
    }
}

/// Validate a whole series: every bar well formed, dates strictly increasing.
pub fn validate_bars(bars: &[PriceBar]) -> Result<(), SigtraderError> {
    for (index, bar) in bars.iter().enumerate() {
        bar.validate()
            .map_err(|reason| SigtraderError::InvalidBar { index, reason })?;
        if index > 0 && bar.date <= bars[index - 1].date {
            return Err(SigtraderError::InvalidBar {
                index,
                reason: format!(
                    "date {} not after previous {}",
                    bar.date,
                    bars[index - 1].date
                ),
            });
        }
    }
    Ok(())
}

/// Closing prices in bar order.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|b| b.close).collect()
}
