//! MACD line / signal line crossover.

use super::{ParamMap, Strategy};
use crate::domain::error::SigtraderError;
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SIGNAL, DEFAULT_SLOW};
use crate::domain::indicator::{IndicatorPoint, IndicatorSet, IndicatorType};
use crate::domain::ohlcv::PriceBar;
use crate::domain::signal::{crossover_signals, Signal, WarmupPolicy};

pub const NAME: &str = "macd";
const KNOWN: &[&str] = &["fast_period", "slow_period", "signal_period"];

#[derive(Debug, Clone, PartialEq)]
pub struct MacdCrossover {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

impl Default for MacdCrossover {
    fn default() -> Self {
        MacdCrossover {
            fast_period: DEFAULT_FAST,
            slow_period: DEFAULT_SLOW,
            signal_period: DEFAULT_SIGNAL,
        }
    }
}

impl MacdCrossover {
    pub fn new(fast_period: usize, slow_period: usize, signal_period: usize) -> Self {
        MacdCrossover {
            fast_period,
            slow_period,
            signal_period,
        }
    }

    pub fn from_params(params: &ParamMap) -> Result<Self, SigtraderError> {
        params.check_known(NAME, KNOWN)?;
        let defaults = Self::default();
        Ok(MacdCrossover {
            fast_period: params.get_usize(NAME, "fast_period", defaults.fast_period)?,
            slow_period: params.get_usize(NAME, "slow_period", defaults.slow_period)?,
            signal_period: params.get_usize(NAME, "signal_period", defaults.signal_period)?,
        })
    }

    fn indicator(&self) -> IndicatorType {
        IndicatorType::Macd {
            fast: self.fast_period,
            slow: self.slow_period,
            signal: self.signal_period,
        }
    }
}

impl Strategy for MacdCrossover {
    fn name(&self) -> &'static str {
        NAME
    }

    fn validate_parameters(&self) -> Result<(), SigtraderError> {
        for (name, value) in [
            ("fast_period", self.fast_period),
            ("slow_period", self.slow_period),
            ("signal_period", self.signal_period),
        ] {
            if value == 0 {
                return Err(SigtraderError::parameter(NAME, name, "must be positive"));
            }
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
        vec![self.indicator()]
    }

    fn parameters(&self) -> ParamMap {
        ParamMap::new()
            .with("fast_period", self.fast_period)
            .with("slow_period", self.slow_period)
            .with("signal_period", self.signal_period)
    }

    fn compute_signals(
        &self,
        bars: &[PriceBar],
        indicators: &IndicatorSet,
    ) -> Result<Vec<Signal>, SigtraderError> {
        let series = indicators.resolve(&self.indicator(), bars)?;
        let (lines, signals): (Vec<Option<f64>>, Vec<Option<f64>>) = series
            .values
            .iter()
            .map(IndicatorPoint::macd)
            .map(|m| (m.map(|(line, _, _)| line), m.map(|(_, signal, _)| signal)))
            .unzip();
        Ok(crossover_signals(&lines, &signals, WarmupPolicy::Neutral))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn defaults() {
        let strategy = MacdCrossover::from_params(&ParamMap::new()).unwrap();
        assert_eq!(strategy, MacdCrossover::new(12, 26, 9));
    }

    #[test]
    fn flat_series_is_silent() {
        let series = MacdCrossover::default()
            .generate_signals(&make_bars(&[100.0; 20]), &IndicatorSet::new())
            .unwrap();
        assert_eq!(series.active_count(), 0);
    }

    #[test]
    fn trend_change_buys_then_sells() {
        let mut prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        prices.extend((0..20).map(|i| 81.0 + 2.0 * i as f64));
        prices.extend((0..20).map(|i| 119.0 - 2.0 * i as f64));
        let series = MacdCrossover::new(3, 6, 3)
            .generate_signals(&make_bars(&prices), &IndicatorSet::new())
            .unwrap();

        let first_buy = series.signals().position(|s| s == Signal::Buy).unwrap();
        let last_sell = series
            .signals()
            .collect::<Vec<_>>()
            .iter()
            .rposition(|s| *s == Signal::Sell)
            .unwrap();
        assert!((20..40).contains(&first_buy), "buy at {}", first_buy);
        assert!(last_sell >= 40, "sell at {}", last_sell);
    }

    #[test]
    fn signals_alternate_on_crossings() {
        let prices: Vec<f64> = (0..60)
            .map(|i| 100.0 + 10.0 * (i as f64 / 5.0).sin())
            .collect();
        let series = MacdCrossover::new(3, 8, 3)
            .generate_signals(&make_bars(&prices), &IndicatorSet::new())
            .unwrap();
        let active: Vec<Signal> = series.signals().filter(|s| *s != Signal::Hold).collect();
        assert!(!active.is_empty());
        for pair in active.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn fast_not_below_slow_is_rejected() {
        assert!(MacdCrossover::new(26, 12, 9).validate_parameters().is_err());
    }

    #[test]
    fn zero_signal_period_is_rejected() {
        let err = MacdCrossover::new(12, 26, 0)
            .validate_parameters()
            .unwrap_err();
        assert!(err.to_string().contains("signal_period"));
    }

    #[test]
    fn required_indicator() {
        assert_eq!(
            MacdCrossover::default().required_indicators(),
            vec![IndicatorType::Macd {
                fast: 12,
                slow: 26,
                signal: 9
            }]
        );
    }
}
