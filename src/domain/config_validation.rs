//! Configuration loading and validation.
//!
//! Checks every config value before a backtest runs.

use crate::domain::backtest::{
    SimulationConfig, DEFAULT_COMMISSION_RATE, DEFAULT_INITIAL_CAPITAL,
};
use crate::domain::batch::StrategyRun;
use crate::domain::error::SigtraderError;
use crate::domain::execution::PnlMode;
use crate::domain::strategy::{ParamMap, ParamValue, StrategyRegistry};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const BACKTEST_SECTION: &str = "backtest";
pub const STRATEGY_SECTION: &str = "strategy";

/// The `[backtest]` section, parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacktestSettings {
    pub data: Option<String>,
    pub simulation: SimulationConfig,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl BacktestSettings {
    /// Read the `[backtest]` section; absent keys take their defaults.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SigtraderError> {
        let initial_capital = config
            .get_double(BACKTEST_SECTION, "initial_capital")?
            .unwrap_or(DEFAULT_INITIAL_CAPITAL);
        let commission_rate = config
            .get_double(BACKTEST_SECTION, "commission")?
            .unwrap_or(DEFAULT_COMMISSION_RATE);
        let pnl_mode = match non_empty(config, BACKTEST_SECTION, "pnl_mode") {
            None => PnlMode::default(),
            Some(raw) => raw
                .parse::<PnlMode>()
                .map_err(|reason| invalid(BACKTEST_SECTION, "pnl_mode", reason))?,
        };

        Ok(BacktestSettings {
            data: non_empty(config, BACKTEST_SECTION, "data"),
            simulation: SimulationConfig::new(initial_capital, commission_rate)
                .with_pnl_mode(pnl_mode),
            start_date: config.get_date(BACKTEST_SECTION, "start_date")?,
            end_date: config.get_date(BACKTEST_SECTION, "end_date")?,
        })
    }

    pub fn validate(&self) -> Result<(), SigtraderError> {
        self.simulation.validate()?;
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start > end {
                return Err(invalid(
                    BACKTEST_SECTION,
                    "start_date",
                    format!("start_date {} is after end_date {}", start, end),
                ));
            }
        }
        Ok(())
    }
}

/// Parse and validate `[backtest]`.
pub fn validate_backtest_config(
    config: &dyn ConfigPort,
) -> Result<BacktestSettings, SigtraderError> {
    let settings = BacktestSettings::from_config(config)?;
    settings.validate()?;
    Ok(settings)
}

/// `[strategy]`: `name` plus every other key as a parameter.
pub fn strategy_run_from_config(config: &dyn ConfigPort) -> Result<StrategyRun, SigtraderError> {
    let name = non_empty(config, STRATEGY_SECTION, "name").ok_or_else(|| {
        SigtraderError::ConfigMissing {
            section: STRATEGY_SECTION.to_string(),
            key: "name".to_string(),
        }
    })?;

    let mut params = ParamMap::new();
    for key in config.section_keys(STRATEGY_SECTION) {
        if key == "name" {
            continue;
        }
        if let Some(raw) = non_empty(config, STRATEGY_SECTION, &key) {
            params.insert(&key, ParamValue::parse(&raw));
        }
    }
    Ok(StrategyRun::new(&name, params))
}

/// Parse `[strategy]` and check it against the registry.
pub fn validate_strategy_config(
    config: &dyn ConfigPort,
    registry: &StrategyRegistry,
) -> Result<StrategyRun, SigtraderError> {
    let run = strategy_run_from_config(config)?;
    registry.create(&run.name, &run.params)?;
    Ok(run)
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Option<String> {
    config
        .get_string(section, key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
