//! Signal-generating strategies.
//!
//! A strategy is a named, parameterised, pure mapping from a bar series to a
//! signal series. Parameters are checked once before any computation.

pub mod macd;
pub mod moving_average;
pub mod params;
pub mod registry;
pub mod rsi;

pub use macd::MacdCrossover;
pub use moving_average::{MaType, MovingAverageCrossover};
pub use params::{ParamMap, ParamValue};
pub use registry::{StrategyInfo, StrategyRegistry};
pub use rsi::RsiThreshold;

use std::fmt;

use crate::domain::error::SigtraderError;
use crate::domain::indicator::{IndicatorSet, IndicatorType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::{Signal, SignalSeries};

pub trait Strategy: Send + Sync + fmt::Debug {
    /// Registry name, e.g. `moving_average`.
    fn name(&self) -> &'static str;

    fn validate_parameters(&self) -> Result<(), SigtraderError>;

    /// Indicators the strategy reads, so callers can compute them ahead of time.
    fn required_indicators(&self) -> Vec<IndicatorType>;

    /// The effective parameters, defaults filled in.
    fn parameters(&self) -> ParamMap;

    /// One signal per bar. Called only with validated parameters.
    fn compute_signals(
        &self,
        bars: &[PriceBar],
        indicators: &IndicatorSet,
    ) -> Result<Vec<Signal>, SigtraderError>;

    /// Validate, then generate a signal series aligned to `bars`.
    ///
    /// Series in `indicators` are used when present and computed otherwise.
    fn generate_signals(
        &self,
        bars: &[PriceBar],
        indicators: &IndicatorSet,
    ) -> Result<SignalSeries, SigtraderError> {
        self.validate_parameters()?;
        let signals = self.compute_signals(bars, indicators)?;
        if signals.len() != bars.len() {
            return Err(SigtraderError::alignment(format!(
                "{} produced {} signals for {} bars",
                self.name(),
                signals.len(),
                bars.len()
            )));
        }
        Ok(SignalSeries::from_signals(bars, signals))
    }
}
