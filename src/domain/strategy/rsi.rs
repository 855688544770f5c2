//! RSI threshold cross.
//!
//! BUY when RSI crosses up through the oversold level, SELL when it crosses
//! down through the overbought level. Only readings after warm-up count, so
//! an RSI that starts above the oversold level is not a cross.

use super::{ParamMap, Strategy};
use crate::domain::error::SigtraderError;
use crate::domain::indicator::{IndicatorSet, IndicatorType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::{cross_signals, threshold_relations, Signal, WarmupPolicy};

pub const NAME: &str = "rsi";
const KNOWN: &[&str] = &["period", "oversold", "overbought"];

#[derive(Debug, Clone, PartialEq)]
pub struct RsiThreshold {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for RsiThreshold {
    fn default() -> Self {
        RsiThreshold {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
        }
    }
}

impl RsiThreshold {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        RsiThreshold {
            period,
            oversold,
            overbought,
        }
    }

    pub fn from_params(params: &ParamMap) -> Result<Self, SigtraderError> {
        params.check_known(NAME, KNOWN)?;
        let defaults = Self::default();
        Ok(RsiThreshold {
            period: params.get_usize(NAME, "period", defaults.period)?,
            oversold: params.get_f64(NAME, "oversold", defaults.oversold)?,
            overbought: params.get_f64(NAME, "overbought", defaults.overbought)?,
        })
    }
}

fn check_level(name: &str, value: f64) -> Result<(), SigtraderError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(SigtraderError::parameter(
            NAME,
            name,
            format!("must be within [0, 100], got {}", value),
        ));
    }
    Ok(())
}

impl Strategy for RsiThreshold {
    fn name(&self) -> &'static str {
        NAME
    }

    fn validate_parameters(&self) -> Result<(), SigtraderError> {
        if self.period == 0 {
            return Err(SigtraderError::parameter(NAME, "period", "must be positive"));
        }
        check_level("oversold", self.oversold)?;
        check_level("overbought", self.overbought)?;
        if self.oversold >= self.overbought {
            return Err(SigtraderError::parameter(
                NAME,
                "oversold",
                format!(
                    "must be below overbought ({} >= {})",
                    self.oversold, self.overbought
                ),
            ));
        }
        Ok(())
    }

    fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![IndicatorType::Rsi(self.period)]
    }

    fn parameters(&self) -> ParamMap {
        ParamMap::new()
            .with("period", self.period)
            .with("oversold", self.oversold)
            .with("overbought", self.overbought)
    }

    fn compute_signals(
        &self,
        bars: &[PriceBar],
        indicators: &IndicatorSet,
    ) -> Result<Vec<Signal>, SigtraderError> {
        let rsi = indicators
            .resolve(&IndicatorType::Rsi(self.period), bars)?
            .simple_values();
        Ok(cross_signals(
            &threshold_relations(&rsi, self.oversold),
            &threshold_relations(&rsi, self.overbought),
            WarmupPolicy::Strict,
        ))
    }
}
