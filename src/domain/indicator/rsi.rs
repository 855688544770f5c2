//! RSI (Relative Strength Index) indicator implementation.
//!
//! Average gain and average loss are plain means over the trailing n price
//! changes (gains are positive changes, losses are negated negative changes).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100 (this includes a window with no movement at all).
//!
//! Warmup: first n bars are invalid (need n price changes).

use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_rsi(bars: &[PriceBar], period: usize) -> IndicatorSeries {
    let mut values: Vec<IndicatorPoint> = bars
        .iter()
        .map(|b| IndicatorPoint::invalid(b.date))
        .collect();

    if period == 0 || bars.len() <= period {
        return IndicatorSeries {
            indicator_type: IndicatorType::Rsi(period),
            values,
        };
    }

    // changes[j] is the move from bar j to bar j + 1
    let changes: Vec<f64> = bars.windows(2).map(|w| w[1].close - w[0].close).collect();

    for (i, point) in values.iter_mut().enumerate().skip(period) {
        let window = &changes[i - period..i];
        let gain: f64 = window.iter().filter(|c| **c > 0.0).sum();
        let loss: f64 = window.iter().filter(|c| **c < 0.0).map(|c| -c).sum();
        let avg_gain = gain / period as f64;
        let avg_loss = loss / period as f64;

        point.valid = true;
        point.value = IndicatorValue::Simple(rsi_from_averages(avg_gain, avg_loss));
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}

pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        100.0
    } else {
        100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::make_bars;

    #[test]
    fn rsi_empty_bars() {
        let series = calculate_rsi(&make_bars(&[]), 14);
        assert_eq!(series.values.len(), 0);
    }

    #[test]
    fn rsi_single_bar() {
        let series = calculate_rsi(&make_bars(&[100.0]), 14);
        assert_eq!(series.values.len(), 1);
        assert!(!series.values[0].valid);
    }

    #[test]
    fn rsi_warmup_period() {
        let prices: Vec<f64> = (1..=15).map(|i| 100.0 + (i as f64 % 5.0) * 2.0).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);

        assert_eq!(series.values.len(), 15);
        for i in 0..14 {
            assert!(!series.values[i].valid, "Bar {} should be invalid", i);
        }
        assert!(series.values[14].valid, "Bar 14 should be valid");
    }

    #[test]
    fn rsi_all_gains_no_losses() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);
        assert_eq!(series.values[14].simple(), Some(100.0));
    }

    #[test]
    fn rsi_all_losses_no_gains() {
        let prices: Vec<f64> = (0..15).map(|i| 100.0 - i as f64).collect();
        let series = calculate_rsi(&make_bars(&prices), 14);
        assert_eq!(series.values[14].simple(), Some(0.0));
    }

    #[test]
    fn rsi_flat_prices_read_100() {
        let series = calculate_rsi(&make_bars(&[100.0; 20]), 14);
        for point in &series.values[14..] {
            assert_eq!(point.simple(), Some(100.0));
        }
    }

    #[test]
    fn rsi_known_ratio() {
        // two gains of 2 and one loss of 1 over period 3: RS = (4/3)/(1/3) = 4
        let series = calculate_rsi(&make_bars(&[10.0, 12.0, 11.0, 13.0]), 3);
        let rsi = series.values[3].simple().unwrap();
        assert!((rsi - 80.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_uses_trailing_window_only() {
        // the early crash drops out of the 3-change window
        let series = calculate_rsi(&make_bars(&[100.0, 50.0, 51.0, 52.0, 53.0]), 3);
        assert_eq!(series.values[4].simple(), Some(100.0));
        assert!(series.values[3].simple().unwrap() < 10.0);
    }

    #[test]
    fn rsi_in_range() {
        let prices: Vec<f64> = (1..=20)
            .map(|i| 100.0 + (i as f64 % 7.0 - 3.0) * 2.0)
            .collect();
        let series = calculate_rsi(&make_bars(&prices), 14);

        for rsi in series.simple_values().into_iter().flatten() {
            assert!((0.0..=100.0).contains(&rsi), "RSI {} out of range", rsi);
        }
    }

    #[test]
    fn rsi_indicator_type() {
        let series = calculate_rsi(&make_bars(&[100.0]), 14);
        assert_eq!(series.indicator_type, IndicatorType::Rsi(14));
    }

    #[test]
    fn rsi_zero_period() {
        let series = calculate_rsi(&make_bars(&[100.0, 101.0]), 0);
        assert_eq!(series.values.len(), 2);
        assert!(series.values.iter().all(|p| !p.valid));
    }
}
