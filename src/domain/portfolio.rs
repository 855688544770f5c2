//! Portfolio state and per-bar equity snapshots.

use chrono::NaiveDate;
use serde::Serialize;

/// FLAT or LONG; there are no partial positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PositionState {
    Flat,
    Long,
}

/// Mutable simulation state, owned by a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioState {
    pub cash: f64,
    pub shares: f64,
    pub last_price: Option<f64>,
    /// Cash spent opening the current position, commission included.
    pub cost_basis: f64,
    /// Date the current position was opened.
    pub entry_date: Option<NaiveDate>,
}

impl PortfolioState {
    pub fn new(initial_capital: f64) -> Self {
        PortfolioState {
            cash: initial_capital,
            shares: 0.0,
            last_price: None,
            cost_basis: 0.0,
            entry_date: None,
        }
    }

    pub fn position(&self) -> PositionState {
        if self.shares > 0.0 {
            PositionState::Long
        } else {
            PositionState::Flat
        }
    }

    pub fn is_long(&self) -> bool {
        self.position() == PositionState::Long
    }

    pub fn position_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.position_value(price)
    }

    /// Record `close` as the latest price and snapshot the marked value.
    pub fn mark(&mut self, date: NaiveDate, close: f64) -> EquitySnapshot {
        self.last_price = Some(close);
        let position_value = self.position_value(close);
        EquitySnapshot {
            date,
            cash: self.cash,
            shares: self.shares,
            close,
            position_value,
            total_value: self.cash + position_value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquitySnapshot {
    pub date: NaiveDate,
    pub cash: f64,
    pub shares: f64,
    pub close: f64,
    pub position_value: f64,
    pub total_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    #[test]
    fn new_state_is_flat() {
        let state = PortfolioState::new(10_000.0);
        assert_eq!(state.position(), PositionState::Flat);
        assert_eq!(state.cash, 10_000.0);
        assert_eq!(state.shares, 0.0);
        assert!(state.last_price.is_none());
    }

    #[test]
    fn long_when_holding_shares() {
        let mut state = PortfolioState::new(0.0);
        state.shares = 2.5;
        assert!(state.is_long());
    }

    #[test]
    fn total_value_marks_shares() {
        let mut state = PortfolioState::new(500.0);
        state.shares = 10.0;
        assert_relative_eq!(state.total_value(110.0), 1600.0);
    }

    #[test]
    fn mark_snapshots_and_records_price() {
        let mut state = PortfolioState::new(1000.0);
        state.shares = 5.0;
        state.cash = 100.0;
        let snap = state.mark(day(), 200.0);
        assert_eq!(state.last_price, Some(200.0));
        assert_eq!(snap.date, day());
        assert_relative_eq!(snap.position_value, 1000.0);
        assert_relative_eq!(snap.total_value, 1100.0);
        assert_eq!(snap.shares, 5.0);
    }
}
