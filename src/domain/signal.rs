//! Discrete trade signals and the edge-cross primitive shared by all strategies.
//!
//! A cross is a change of side between two adjacent bars, never a level: a
//! fast line that stays above a slow line produces one BUY, on the bar where
//! it got there.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use super::ohlcv::PriceBar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    Hold,
}

impl Signal {
    /// +1 / -1 / 0
    pub fn value(self) -> i8 {
        match self {
            Signal::Buy => 1,
            Signal::Sell => -1,
            Signal::Hold => 0,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
            Signal::Hold => write!(f, "HOLD"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub signal: Signal,
}

/// One signal per bar, in bar order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalSeries {
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    /// Pair each bar with its signal. The caller guarantees equal lengths.
    pub fn from_signals(bars: &[PriceBar], signals: Vec<Signal>) -> Self {
        debug_assert_eq!(bars.len(), signals.len());
        SignalSeries {
            points: bars
                .iter()
                .zip(signals)
                .map(|(bar, signal)| SignalPoint {
                    date: bar.date,
                    signal,
                })
                .collect(),
        }
    }

    /// All HOLD.
    pub fn hold(bars: &[PriceBar]) -> Self {
        Self::from_signals(bars, vec![Signal::Hold; bars.len()])
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn count(&self, signal: Signal) -> usize {
        self.points.iter().filter(|p| p.signal == signal).count()
    }

    /// BUY and SELL count, HOLD excluded.
    pub fn active_count(&self) -> usize {
        self.points.len() - self.count(Signal::Hold)
    }

    pub fn signals(&self) -> impl Iterator<Item = Signal> + '_ {
        self.points.iter().map(|p| p.signal)
    }
}

/// How a bar whose prior bar is still warming up is judged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupPolicy {
    /// An undefined prior bar sits on neither side, so reaching a side on the
    /// first comparable bar is a cross.
    Neutral,
    /// A cross needs a defined prior bar on the other side.
    Strict,
}

/// Side of `left` against `right` per bar; `None` where either is undefined.
pub fn relations(left: &[Option<f64>], right: &[Option<f64>]) -> Vec<Option<Ordering>> {
    left.iter()
        .zip(right)
        .map(|(l, r)| match (l, r) {
            (Some(l), Some(r)) => l.partial_cmp(r),
            _ => None,
        })
        .collect()
}

/// Side of each value against a fixed threshold.
pub fn threshold_relations(values: &[Option<f64>], threshold: f64) -> Vec<Option<Ordering>> {
    values
        .iter()
        .map(|v| v.and_then(|v| v.partial_cmp(&threshold)))
        .collect()
}

fn crossed_into(
    relations: &[Option<Ordering>],
    index: usize,
    side: Ordering,
    policy: WarmupPolicy,
) -> bool {
    if index == 0 || relations[index] != Some(side) {
        return false;
    }
    match relations[index - 1] {
        Some(prior) => prior != side,
        None => policy == WarmupPolicy::Neutral,
    }
}

/// True when bar `index` moved strictly above from at-or-below.
pub fn crossed_above(relations: &[Option<Ordering>], index: usize, policy: WarmupPolicy) -> bool {
    crossed_into(relations, index, Ordering::Greater, policy)
}

/// True when bar `index` moved strictly below from at-or-above.
pub fn crossed_below(relations: &[Option<Ordering>], index: usize, policy: WarmupPolicy) -> bool {
    crossed_into(relations, index, Ordering::Less, policy)
}

/// BUY where `buy_side` crosses above, SELL where `sell_side` crosses below.
///
/// Both relation series must have the same length. BUY wins if both fire on
/// one bar.
pub fn cross_signals(
    buy_side: &[Option<Ordering>],
    sell_side: &[Option<Ordering>],
    policy: WarmupPolicy,
) -> Vec<Signal> {
    (0..buy_side.len())
        .map(|i| {
            if crossed_above(buy_side, i, policy) {
                Signal::Buy
            } else if crossed_below(sell_side, i, policy) {
                Signal::Sell
            } else {
                Signal::Hold
            }
        })
        .collect()
}

/// Line-vs-line crossover: BUY when `fast` crosses above `slow`, SELL when below.
pub fn crossover_signals(
    fast: &[Option<f64>],
    slow: &[Option<f64>],
    policy: WarmupPolicy,
) -> Vec<Signal> {
    let rel = relations(fast, slow);
    cross_signals(&rel, &rel, policy)
}
