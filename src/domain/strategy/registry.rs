//! Name → constructor lookup for the closed set of strategies.

use std::collections::BTreeMap;

use super::{
    macd, moving_average, rsi, MacdCrossover, MovingAverageCrossover, ParamMap, RsiThreshold,
    Strategy,
};
use crate::domain::error::SigtraderError;

pub type StrategyConstructor = fn(&ParamMap) -> Result<Box<dyn Strategy>, SigtraderError>;

#[derive(Debug, Clone)]
struct RegistryEntry {
    description: &'static str,
    constructor: StrategyConstructor,
}

/// What `describe` reports about a registered strategy.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyInfo {
    pub name: String,
    pub description: String,
    pub defaults: ParamMap,
}

#[derive(Debug, Clone, Default)]
pub struct StrategyRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

fn build_moving_average(params: &ParamMap) -> Result<Box<dyn Strategy>, SigtraderError> {
    Ok(Box::new(MovingAverageCrossover::from_params(params)?))
}

fn build_rsi(params: &ParamMap) -> Result<Box<dyn Strategy>, SigtraderError> {
    Ok(Box::new(RsiThreshold::from_params(params)?))
}

fn build_macd(params: &ParamMap) -> Result<Box<dyn Strategy>, SigtraderError> {
    Ok(Box::new(MacdCrossover::from_params(params)?))
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in strategies.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            moving_average::NAME,
            "fast/slow moving average crossover (sma or ema)",
            build_moving_average,
        );
        registry.register(
            rsi::NAME,
            "RSI crossing up through oversold / down through overbought",
            build_rsi,
        );
        registry.register(
            macd::NAME,
            "MACD line crossing its signal line",
            build_macd,
        );
        registry
    }

    /// Add or replace a strategy under `name`.
    pub fn register(
        &mut self,
        name: &str,
        description: &'static str,
        constructor: StrategyConstructor,
    ) {
        self.entries.insert(
            name.to_string(),
            RegistryEntry {
                description,
                constructor,
            },
        );
    }

    /// Construct and validate a strategy.
    pub fn create(
        &self,
        name: &str,
        params: &ParamMap,
    ) -> Result<Box<dyn Strategy>, SigtraderError> {
        let entry = self.entry(name)?;
        let strategy = (entry.constructor)(params)?;
        strategy.validate_parameters()?;
        Ok(strategy)
    }

    /// Registered names in sorted order.
    pub fn list(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn describe(&self, name: &str) -> Result<StrategyInfo, SigtraderError> {
        let entry = self.entry(name)?;
        let defaults = (entry.constructor)(&ParamMap::new())?.parameters();
        Ok(StrategyInfo {
            name: name.to_string(),
            description: entry.description.to_string(),
            defaults,
        })
    }

    fn entry(&self, name: &str) -> Result<&RegistryEntry, SigtraderError> {
        self.entries
            .get(name)
            .ok_or_else(|| SigtraderError::UnknownStrategy {
                name: name.to_string(),
                available: self.list().join(", "),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_registered() {
        let registry = StrategyRegistry::with_defaults();
        assert_eq!(registry.list(), vec!["macd", "moving_average", "rsi"]);
    }

    #[test]
    fn create_applies_parameters() {
        let registry = StrategyRegistry::with_defaults();
        let params = ParamMap::new().with("fast_period", 5usize).with("slow_period", 10usize);
        let strategy = registry.create("moving_average", &params).unwrap();
        assert_eq!(strategy.name(), "moving_average");
        assert_eq!(strategy.parameters().get_text("fast_period", ""), "5");
    }

    #[test]
    fn create_validates() {
        let registry = StrategyRegistry::with_defaults();
        let params = ParamMap::new().with("fast_period", 60usize);
        let err = registry.create("moving_average", &params).unwrap_err();
        assert!(matches!(err, SigtraderError::Parameter { .. }));
    }

    #[test]
    fn unknown_name_lists_available() {
        let registry = StrategyRegistry::with_defaults();
        let err = registry.create("bollinger", &ParamMap::new()).unwrap_err();
        match err {
            SigtraderError::UnknownStrategy { name, available } => {
                assert_eq!(name, "bollinger");
                assert!(available.contains("rsi"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn describe_reports_defaults() {
        let info = StrategyRegistry::with_defaults().describe("rsi").unwrap();
        assert_eq!(info.defaults.to_string(), "overbought=70,oversold=30,period=14");
        assert!(!info.description.is_empty());
    }

    #[test]
    fn register_custom_constructor() {
        fn build(params: &ParamMap) -> Result<Box<dyn Strategy>, SigtraderError> {
            Ok(Box::new(RsiThreshold::from_params(params)?))
        }
        let mut registry = StrategyRegistry::new();
        registry.register("rsi_alias", "alias", build);
        assert!(registry.contains("rsi_alias"));
        assert!(registry.create("rsi_alias", &ParamMap::new()).is_ok());
    }
}
