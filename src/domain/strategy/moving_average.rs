//! Moving-average crossover.
//!
//! BUY when the fast average crosses above the slow one, SELL when it crosses
//! below. The bar on which both averages first become defined counts as a
//! cross if the fast average is already on one side.

use std::fmt;
use std::str::FromStr;

use super::{ParamMap, Strategy};
use crate::domain::error::SigtraderError;
use crate::domain::indicator::{IndicatorSet, IndicatorType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::{crossover_signals, Signal, WarmupPolicy};

pub const NAME: &str = "moving_average";
const KNOWN: &[&str] = &["fast_period", "slow_period", "ma_type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaType {
    Sma,
    Ema,
}

impl MaType {
    fn indicator(self, period: usize) -> IndicatorType {
        match self {
            MaType::Sma => IndicatorType::Sma(period),
            MaType::Ema => IndicatorType::Ema(period),
        }
    }
}

impl FromStr for MaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" => Ok(MaType::Sma),
            "ema" => Ok(MaType::Ema),
            other => Err(format!("expected 'sma' or 'ema', got '{}'", other)),
        }
    }
}

impl fmt::Display for MaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaType::Sma => write!(f, "sma"),
            MaType::Ema => write!(f, "ema"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverageCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
    pub ma_type: MaType,
}

impl Default for MovingAverageCrossover {
    fn default() -> Self {
        MovingAverageCrossover {
            fast_period: 20,
            slow_period: 50,
            ma_type: MaType::Sma,
        }
    }
}

impl MovingAverageCrossover {
    pub fn new(fast_period: usize, slow_period: usize, ma_type: MaType) -> Self {
        MovingAverageCrossover {
            fast_period,
            slow_period,
            ma_type,
        }
    }

    /// Build from a parameter map, defaults filling the gaps. Does not validate.
    pub fn from_params(params: &ParamMap) -> Result<Self, SigtraderError> {
        params.check_known(NAME, KNOWN)?;
        let defaults = Self::default();
        let ma_type = params
            .get_text("ma_type", "sma")
            .parse::<MaType>()
            .map_err(|reason| SigtraderError::parameter(NAME, "ma_type", reason))?;
        Ok(MovingAverageCrossover {
            fast_period: params.get_usize(NAME, "fast_period", defaults.fast_period)?,
            slow_period: params.get_usize(NAME, "slow_period", defaults.slow_period)?,
            ma_type,
        })
    }

    fn fast_indicator(&self) -> IndicatorType {
        self.ma_type.indicator(self.fast_period)
    }

    fn slow_indicator(&self) -> IndicatorType {
        self.ma_type.indicator(self.slow_period)
    }
}

impl Strategy for MovingAverageCrossover {
    fn name(&self) -> &'static str {
        NAME
    }

    fn validate_parameters(&self) -> Result<(), SigtraderError> {
        if self.fast_period == 0 {
            return Err(SigtraderError::parameter(NAME, "fast_period", "must be positive"));
        }
        if self.slow_period == 0 {
            return Err(SigtraderError::parameter(NAME, "slow_period", "must be positive"));
        }
        if self.fast_period >= self.slow_period {
            return Err(SigtraderError::parameter(
                NAME,
                "fast_period",
                format!(
                    "must be less than slow_period ({} >= {})",
                    self.fast_period, self.slow_period
                ),
            ));
        }
        Ok(())
    }

    fn required_indicators(&self) -> Vec<IndicatorType> {
        vec![self.fast_indicator(), self.slow_indicator()]
    }

    fn parameters(&self) -> ParamMap {
        ParamMap::new()
            .with("fast_period", self.fast_period)
            .with("slow_period", self.slow_period)
            .with("ma_type", self.ma_type.to_string().as_str())
    }

    fn compute_signals(
        &self,
        bars: &[PriceBar],
        indicators: &IndicatorSet,
    ) -> Result<Vec<Signal>, SigtraderError> {
        let fast = indicators.resolve(&self.fast_indicator(), bars)?;
        let slow = indicators.resolve(&self.slow_indicator(), bars)?;
        Ok(crossover_signals(
            &fast.simple_values(),
            &slow.simple_values(),
            WarmupPolicy::Neutral,
        ))
    }
}
