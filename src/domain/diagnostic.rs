//! Structured events returned alongside results instead of being printed.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// BUY arrived while already long.
    BuyWhileLong { date: NaiveDate },
    /// SELL arrived with nothing to sell.
    SellWhileFlat { date: NaiveDate },
    /// BUY arrived while flat but there was no cash to commit.
    NoCashToBuy { date: NaiveDate },
    /// Floating-point shortfall after a BUY, cash clamped to zero.
    RoundingAbsorbed { date: NaiveDate, amount: f64 },
    /// Leading bars on which an indicator had no value.
    Warmup { indicator: String, bars: usize },
    /// The run produced no BUY or SELL at all.
    NoSignals,
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::RoundingAbsorbed { .. } | Diagnostic::NoCashToBuy { .. } => {
                Severity::Warning
            }
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::BuyWhileLong { date } => write!(f, "{}: BUY ignored, already long", date),
            Diagnostic::SellWhileFlat { date } => write!(f, "{}: SELL ignored, no position", date),
            Diagnostic::NoCashToBuy { date } => write!(f, "{}: BUY ignored, no cash", date),
            Diagnostic::RoundingAbsorbed { date, amount } => {
                write!(f, "{}: absorbed {:e} of rounding shortfall", date, amount)
            }
            Diagnostic::Warmup { indicator, bars } => {
                write!(f, "{} undefined for the first {} bars", indicator, bars)
            }
            Diagnostic::NoSignals => write!(f, "no BUY or SELL signals generated"),
        }
    }
}
