//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seeded with the first close, then EMA[i] = EMA[i-1] + k*(C[i] - EMA[i-1]).
//! No warmup gap; early values lean towards the seed.

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::{closes, PriceBar};

pub fn calculate_ema(bars: &[PriceBar], span: usize) -> IndicatorSeries {
    if span == 0 {
        return IndicatorSeries {
            indicator_type: IndicatorType::Ema(span),
            values: bars.iter().map(|b| IndicatorPoint::invalid(b.date)).collect(),
        };
    }

    let values = ema_values(&closes(bars), span)
        .into_iter()
        .zip(bars)
        .map(|(ema, bar)| IndicatorPoint {
            date: bar.date,
            valid: true,
            value: IndicatorValue::Simple(ema),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values,
    }
}

/// Recursive EMA over raw values. `span` must be positive.
///
/// The update is written as `prev + k * (x - prev)` so a constant input stays
/// exactly constant.
pub fn ema_values(input: &[f64], span: usize) -> Vec<f64> {
    let k = smoothing_factor(span);
    let mut out = Vec::with_capacity(input.len());
    let mut iter = input.iter();
    if let Some(&seed) = iter.next() {
        let mut ema = seed;
        out.push(ema);
        for &x in iter {
            ema += k * (x - ema);
            out.push(ema);
        }
    }
    out
}

pub fn smoothing_factor(span: usize) -> f64 {
    2.0 / (span as f64 + 1.0)
}
