//! Side-by-side comparison of several strategy runs over one bar series.
//!
//! Runs are independent: each builds its own strategy and portfolio state,
//! and the bars and shared indicator series are only read. A failing run is
//! reported in its slot without affecting the others.

use rayon::prelude::*;
use std::fmt;

use super::backtest::{run_backtest, BacktestResult, SimulationConfig};
use super::error::SigtraderError;
use super::indicator::IndicatorSet;
use super::ohlcv::PriceBar;
use super::strategy::{ParamMap, Strategy, StrategyRegistry};

/// A registry name plus parameter overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRun {
    pub name: String,
    pub params: ParamMap,
}

impl StrategyRun {
    pub fn new(name: &str, params: ParamMap) -> Self {
        StrategyRun {
            name: name.to_string(),
            params,
        }
    }

    /// Parse `name` or `name:key=value,key=value`.
    pub fn parse(text: &str) -> Result<Self, SigtraderError> {
        let (name, assignments) = text.split_once(':').unwrap_or((text, ""));
        let name = name.trim();
        if name.is_empty() {
            return Err(SigtraderError::parameter(
                text.trim(),
                "name",
                "run has no strategy name",
            ));
        }
        Ok(StrategyRun::new(name, ParamMap::parse_assignments(name, assignments)?))
    }
}

impl fmt::Display for StrategyRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.name, self.params)
        }
    }
}

#[derive(Debug)]
pub struct RunOutcome {
    pub run: StrategyRun,
    pub result: Result<BacktestResult, SigtraderError>,
}

/// Run every strategy against `bars` in parallel. Outcomes keep input order.
pub fn compare(
    registry: &StrategyRegistry,
    bars: &[PriceBar],
    runs: &[StrategyRun],
    config: &SimulationConfig,
) -> Vec<RunOutcome> {
    let strategies: Vec<Result<Box<dyn Strategy>, SigtraderError>> = runs
        .iter()
        .map(|run| registry.create(&run.name, &run.params))
        .collect();

    // indicators shared by several runs are computed once
    let required: Vec<_> = strategies
        .iter()
        .flatten()
        .flat_map(|s| s.required_indicators())
        .collect();
    let indicators = IndicatorSet::compute(bars, &required);
    tracing::debug!(
        runs = runs.len(),
        indicators = indicators.len(),
        "comparing strategies"
    );

    runs.par_iter()
        .zip(strategies.into_par_iter())
        .map(|(run, strategy)| {
            let result = strategy
                .and_then(|strategy| run_backtest(strategy.as_ref(), bars, &indicators, config));
            if let Err(err) = &result {
                tracing::warn!(run = %run, error = %err, "strategy run failed");
            }
            RunOutcome {
                run: run.clone(),
                result,
            }
        })
        .collect()
}
