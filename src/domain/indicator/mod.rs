//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values, index-aligned to its bars
//! - `IndicatorSet`: Pre-computed series keyed by `IndicatorType`
//!
//! Every calculation is a pure function of the bars and its parameters.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use ema::{calculate_ema, ema_values};
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use sma::calculate_sma;

use chrono::NaiveDate;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::PriceBar;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    pub(crate) fn invalid(date: NaiveDate) -> Self {
        IndicatorPoint {
            date,
            valid: false,
            value: IndicatorValue::Simple(0.0),
        }
    }

    /// The scalar reading, if this point is past warm-up.
    pub fn simple(&self) -> Option<f64> {
        match (self.valid, &self.value) {
            (true, IndicatorValue::Simple(v)) => Some(*v),
            _ => None,
        }
    }

    /// `(line, signal, histogram)` for a valid MACD point.
    pub fn macd(&self) -> Option<(f64, f64, f64)> {
        match (self.valid, &self.value) {
            (
                true,
                IndicatorValue::Macd {
                    line,
                    signal,
                    histogram,
                },
            ) => Some((*line, *signal, *histogram)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Ema(usize),
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
}

impl IndicatorType {
    pub fn compute(&self, bars: &[PriceBar]) -> IndicatorSeries {
        match *self {
            IndicatorType::Sma(period) => calculate_sma(bars, period),
            IndicatorType::Ema(span) => calculate_ema(bars, span),
            IndicatorType::Rsi(period) => calculate_rsi(bars, period),
            IndicatorType::Macd { fast, slow, signal } => calculate_macd(bars, fast, slow, signal),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Scalar readings with warm-up bars as `None`.
    pub fn simple_values(&self) -> Vec<Option<f64>> {
        self.values.iter().map(IndicatorPoint::simple).collect()
    }

    /// Number of leading bars without a defined value.
    pub fn warmup_len(&self) -> usize {
        self.values.iter().take_while(|p| !p.valid).count()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(span) => write!(f, "EMA({})", span),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
        }
    }
}

/// Indicator series computed ahead of signal generation.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSet {
    series: HashMap<IndicatorType, IndicatorSeries>,
}

impl IndicatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute every requested indicator over `bars`. Duplicates are computed once.
    pub fn compute(bars: &[PriceBar], types: &[IndicatorType]) -> Self {
        let mut set = IndicatorSet::new();
        for indicator_type in types {
            if !set.series.contains_key(indicator_type) {
                set.insert(indicator_type.compute(bars));
            }
        }
        set
    }

    pub fn insert(&mut self, series: IndicatorSeries) {
        self.series.insert(series.indicator_type.clone(), series);
    }

    pub fn get(&self, indicator_type: &IndicatorType) -> Option<&IndicatorSeries> {
        self.series.get(indicator_type)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// The pre-computed series when present, otherwise computed on demand.
    ///
    /// A pre-computed series must be index-aligned with `bars`.
    pub fn resolve<'a>(
        &'a self,
        indicator_type: &IndicatorType,
        bars: &[PriceBar],
    ) -> Result<Cow<'a, IndicatorSeries>, SigtraderError> {
        match self.series.get(indicator_type) {
            Some(series) => {
                if series.len() != bars.len() {
                    return Err(SigtraderError::alignment(format!(
                        "{} has {} values for {} bars",
                        indicator_type,
                        series.len(),
                        bars.len()
                    )));
                }
                let misdated = series
                    .values
                    .iter()
                    .zip(bars)
                    .position(|(point, bar)| point.date != bar.date);
                if let Some(index) = misdated {
                    return Err(SigtraderError::alignment(format!(
                        "{} dated {} at index {} but bar is {}",
                        indicator_type, series.values[index].date, index, bars[index].date
                    )));
                }
                Ok(Cow::Borrowed(series))
            }
            None => Ok(Cow::Owned(indicator_type.compute(bars))),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn make_bars(prices: &[f64]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: start + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::make_bars;
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        };
        assert_eq!(macd.to_string(), "MACD(12,26,9)");
    }

    #[test]
    fn indicator_type_hash_eq() {
        let mut map = HashMap::new();
        let sma20 = IndicatorType::Sma(20);
        let rsi14 = IndicatorType::Rsi(14);

        map.insert(sma20.clone(), "sma20_series".to_string());
        map.insert(rsi14.clone(), "rsi14_series".to_string());

        assert_eq!(
            map.get(&IndicatorType::Sma(20)),
            Some(&"sma20_series".to_string())
        );
        assert_eq!(map.get(&rsi14), Some(&"rsi14_series".to_string()));
        assert_eq!(map.get(&IndicatorType::Ema(20)), None);
    }

    #[test]
    fn compute_deduplicates() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        let set = IndicatorSet::compute(
            &bars,
            &[
                IndicatorType::Sma(2),
                IndicatorType::Sma(2),
                IndicatorType::Ema(3),
            ],
        );
        assert_eq!(set.len(), 2);
        assert!(set.get(&IndicatorType::Sma(2)).is_some());
    }

    #[test]
    fn resolve_uses_precomputed_series() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let set = IndicatorSet::compute(&bars, &[IndicatorType::Sma(2)]);
        let resolved = set.resolve(&IndicatorType::Sma(2), &bars).unwrap();
        assert!(matches!(resolved, Cow::Borrowed(_)));
    }

    #[test]
    fn resolve_computes_missing_series() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let set = IndicatorSet::new();
        let resolved = set.resolve(&IndicatorType::Ema(2), &bars).unwrap();
        assert!(matches!(resolved, Cow::Owned(_)));
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn resolve_rejects_misaligned_series() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let set = IndicatorSet::compute(&bars[..2], &[IndicatorType::Sma(2)]);
        let err = set.resolve(&IndicatorType::Sma(2), &bars).unwrap_err();
        assert!(matches!(err, SigtraderError::Alignment { .. }));
    }

    #[test]
    fn warmup_len_counts_leading_invalid() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(calculate_sma(&bars, 3).warmup_len(), 2);
        assert_eq!(calculate_ema(&bars, 3).warmup_len(), 0);
    }
}
