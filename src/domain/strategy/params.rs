//! Strategy parameter maps.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::error::SigtraderError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Integers first, then floats, anything else is text.
    pub fn parse(raw: &str) -> ParamValue {
        let raw = raw.trim();
        if let Ok(i) = raw.parse::<i64>() {
            ParamValue::Int(i)
        } else if let Ok(f) = raw.parse::<f64>() {
            ParamValue::Float(f)
        } else {
            ParamValue::Text(raw.to_string())
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(f) => Some(*f),
            ParamValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{}", i),
            ParamValue::Float(v) => write!(f, "{}", v),
            ParamValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<usize> for ParamValue {
    fn from(value: usize) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

/// Ordered name → value mapping handed to strategy constructors.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamMap {
    values: BTreeMap<String, ParamValue>,
}

impl ParamMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<ParamValue>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Parse `key=value` pairs separated by commas, for `strategy`.
    pub fn parse_assignments(strategy: &str, input: &str) -> Result<ParamMap, SigtraderError> {
        let mut map = ParamMap::new();
        for pair in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').ok_or_else(|| {
                SigtraderError::parameter(strategy, pair, "expected key=value")
            })?;
            map.insert(key.trim(), ParamValue::parse(value));
        }
        Ok(map)
    }

    /// Reject keys the strategy does not know.
    pub fn check_known(&self, strategy: &str, known: &[&str]) -> Result<(), SigtraderError> {
        match self.values.keys().find(|k| !known.contains(&k.as_str())) {
            Some(key) => Err(SigtraderError::parameter(
                strategy,
                key,
                format!("unknown parameter (expected one of: {})", known.join(", ")),
            )),
            None => Ok(()),
        }
    }

    /// A whole, non-negative count. Floats are accepted when they have no fraction.
    pub fn get_usize(
        &self,
        strategy: &str,
        key: &str,
        default: usize,
    ) -> Result<usize, SigtraderError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(ParamValue::Int(i)) if *i >= 0 => Ok(*i as usize),
            Some(ParamValue::Float(f)) if *f >= 0.0 && f.fract() == 0.0 => Ok(*f as usize),
            Some(other) => Err(SigtraderError::parameter(
                strategy,
                key,
                format!("expected a positive whole number, got {}", other),
            )),
        }
    }

    pub fn get_f64(&self, strategy: &str, key: &str, default: f64) -> Result<f64, SigtraderError> {
        match self.values.get(key) {
            None => Ok(default),
            Some(value) => value.as_f64().ok_or_else(|| {
                SigtraderError::parameter(strategy, key, format!("expected a number, got {}", value))
            }),
        }
    }

    pub fn get_text<'a>(&'a self, key: &str, default: &'a str) -> String {
        match self.values.get(key) {
            None => default.to_string(),
            Some(value) => value.to_string(),
        }
    }
}

impl fmt::Display for ParamMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pairs: Vec<String> = self.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", pairs.join(","))
    }
}
