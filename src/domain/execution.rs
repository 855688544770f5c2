//! Order execution against the portfolio state.
//!
//! Every fill is all-or-nothing at the bar's close: a BUY commits all cash,
//! a SELL liquidates all shares.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::diagnostic::Diagnostic;
use super::portfolio::PortfolioState;

/// How realized P&L is measured on a SELL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PnlMode {
    /// Net proceeds minus the cash spent on the opening BUY, commission included.
    #[default]
    RoundTrip,
    /// Net proceeds minus the same-bar notional, which is `-commission`.
    SameBarMark,
}

impl std::str::FromStr for PnlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "round_trip" => Ok(PnlMode::RoundTrip),
            "same_bar_mark" => Ok(PnlMode::SameBarMark),
            other => Err(format!(
                "expected 'round_trip' or 'same_bar_mark', got '{}'",
                other
            )),
        }
    }
}

impl fmt::Display for PnlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PnlMode::RoundTrip => write!(f, "round_trip"),
            PnlMode::SameBarMark => write!(f, "same_bar_mark"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeDirection {
    Buy,
    Sell,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Buy => write!(f, "BUY"),
            TradeDirection::Sell => write!(f, "SELL"),
        }
    }
}

/// One ledger entry. `pnl` is zero on BUYs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub date: NaiveDate,
    pub direction: TradeDirection,
    pub price: f64,
    pub shares: f64,
    pub notional: f64,
    pub commission: f64,
    pub pnl: f64,
    pub cash_after: f64,
    pub shares_after: f64,
    /// Cash left over after a BUY before clamping; zero on SELLs.
    pub cash_residual: f64,
}

/// Outcome of applying one signal to the state.
#[derive(Debug, Clone, PartialEq)]
pub enum Fill {
    Executed {
        trade: Trade,
        diagnostic: Option<Diagnostic>,
    },
    Skipped(Diagnostic),
}

pub fn calculate_commission(notional: f64, commission_rate: f64) -> f64 {
    notional * commission_rate
}

/// Commit all available cash at `price`.
///
/// shares = cash / (price * (1 + rate)), so notional plus commission equals
/// cash up to rounding. A negative residual is clamped to zero and reported.
pub fn execute_buy(
    state: &mut PortfolioState,
    date: NaiveDate,
    price: f64,
    commission_rate: f64,
) -> Fill {
    if state.is_long() {
        return Fill::Skipped(Diagnostic::BuyWhileLong { date });
    }
    if state.cash <= 0.0 {
        return Fill::Skipped(Diagnostic::NoCashToBuy { date });
    }

    let cash_before = state.cash;
    let shares = cash_before / (price * (1.0 + commission_rate));
    let notional = shares * price;
    let commission = calculate_commission(notional, commission_rate);
    let residual = cash_before - notional - commission;
    let (cash_after, diagnostic) = absorb_residual(residual, date);

    state.cash = cash_after;
    state.shares = shares;
    state.cost_basis = notional + commission;
    state.entry_date = Some(date);

    Fill::Executed {
        trade: Trade {
            date,
            direction: TradeDirection::Buy,
            price,
            shares,
            notional,
            commission,
            pnl: 0.0,
            cash_after: state.cash,
            shares_after: state.shares,
            cash_residual: residual,
        },
        diagnostic,
    }
}

/// Cash kept after a BUY. Rounding overdraw is clamped to zero and noted.
fn absorb_residual(residual: f64, date: NaiveDate) -> (f64, Option<Diagnostic>) {
    if residual < 0.0 {
        (
            0.0,
            Some(Diagnostic::RoundingAbsorbed {
                date,
                amount: -residual,
            }),
        )
    } else {
        (residual, None)
    }
}

/// Liquidate the whole position at `price`.
pub fn execute_sell(
    state: &mut PortfolioState,
    date: NaiveDate,
    price: f64,
    commission_rate: f64,
    pnl_mode: PnlMode,
) -> Fill {
    if !state.is_long() {
        return Fill::Skipped(Diagnostic::SellWhileFlat { date });
    }

    let shares = state.shares;
    let proceeds = shares * price;
    let commission = calculate_commission(proceeds, commission_rate);
    let net = proceeds - commission;
    let pnl = match pnl_mode {
        PnlMode::RoundTrip => net - state.cost_basis,
        PnlMode::SameBarMark => net - shares * price,
    };

    state.cash += net;
    state.shares = 0.0;
    state.cost_basis = 0.0;
    state.entry_date = None;

    Fill::Executed {
        trade: Trade {
            date,
            direction: TradeDirection::Sell,
            price,
            shares,
            notional: proceeds,
            commission,
            pnl,
            cash_after: state.cash,
            shares_after: 0.0,
            cash_residual: 0.0,
        },
        diagnostic: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn executed(fill: Fill) -> Trade {
        match fill {
            Fill::Executed { trade, .. } => trade,
            Fill::Skipped(d) => panic!("expected a trade, got {}", d),
        }
    }

    #[test]
    fn commission_is_fraction_of_notional() {
        assert_relative_eq!(calculate_commission(10_000.0, 0.001), 10.0);
        assert_eq!(calculate_commission(10_000.0, 0.0), 0.0);
    }

    #[test]
    fn buy_commits_all_cash() {
        let mut state = PortfolioState::new(10_000.0);
        let trade = executed(execute_buy(&mut state, day(2), 100.0, 0.0));
        assert_eq!(trade.direction, TradeDirection::Buy);
        assert_relative_eq!(trade.shares, 100.0);
        assert_relative_eq!(trade.notional, 10_000.0);
        assert_eq!(trade.pnl, 0.0);
        assert!(state.cash.abs() < 1e-9);
        assert!(state.is_long());
    }

    #[test]
    fn buy_with_commission_conserves_value() {
        let mut state = PortfolioState::new(10_000.0);
        let trade = executed(execute_buy(&mut state, day(2), 100.0, 0.001));
        assert_relative_eq!(trade.shares, 10_000.0 / 100.1, max_relative = 1e-12);
        assert_relative_eq!(
            trade.notional + trade.commission + state.cash,
            10_000.0,
            max_relative = 1e-12
        );
        assert_relative_eq!(state.cost_basis, 10_000.0, max_relative = 1e-12);
        assert!(state.cash >= 0.0);
    }

    #[test]
    fn negative_residual_is_clamped_and_reported() {
        let (cash, diagnostic) = absorb_residual(-2.5e-12, day(4));
        assert_eq!(cash, 0.0);
        assert_eq!(
            diagnostic,
            Some(Diagnostic::RoundingAbsorbed {
                date: day(4),
                amount: 2.5e-12
            })
        );
    }

    #[test]
    fn positive_residual_stays_as_cash() {
        assert_eq!(absorb_residual(3.0e-13, day(4)), (3.0e-13, None));
        assert_eq!(absorb_residual(0.0, day(4)), (0.0, None));
    }

    #[test]
    fn residual_is_recorded_on_awkward_buys() {
        let prices = [0.1, 0.3, 1.7, 3.14159, 99.99, 123.456789, 4_321.0987];
        let rates = [0.0, 0.001, 0.0015, 0.003, 0.007];
        let capitals = [0.3, 777.77, 10_000.0, 12_345.67];

        for &price in &prices {
            for &rate in &rates {
                for &capital in &capitals {
                    let mut state = PortfolioState::new(capital);
                    let (trade, diagnostic) = match execute_buy(&mut state, day(2), price, rate) {
                        Fill::Executed { trade, diagnostic } => (trade, diagnostic),
                        Fill::Skipped(d) => panic!("expected a trade, got {}", d),
                    };

                    let residual = capital - trade.notional - trade.commission;
                    assert_eq!(trade.cash_residual, residual);
                    assert!(residual.abs() <= 1e-9 * capital);
                    assert!(trade.cash_after >= 0.0);
                    assert_eq!(trade.cash_after, residual.max(0.0));
                    assert_eq!(state.cash, trade.cash_after);
                    match diagnostic {
                        Some(Diagnostic::RoundingAbsorbed { date, amount }) => {
                            assert!(residual < 0.0);
                            assert_eq!(date, day(2));
                            assert_eq!(amount, -residual);
                        }
                        Some(other) => panic!("unexpected diagnostic {}", other),
                        None => assert!(residual >= 0.0),
                    }
                }
            }
        }
    }

    #[test]
    fn buy_while_long_is_skipped() {
        let mut state = PortfolioState::new(10_000.0);
        execute_buy(&mut state, day(2), 100.0, 0.0);
        let before = state.clone();
        let fill = execute_buy(&mut state, day(3), 90.0, 0.0);
        assert_eq!(fill, Fill::Skipped(Diagnostic::BuyWhileLong { date: day(3) }));
        assert_eq!(state, before);
    }

    #[test]
    fn buy_without_cash_is_skipped() {
        let mut state = PortfolioState::new(0.0);
        let fill = execute_buy(&mut state, day(2), 100.0, 0.0);
        assert!(matches!(fill, Fill::Skipped(Diagnostic::NoCashToBuy { .. })));
    }

    #[test]
    fn sell_while_flat_is_skipped() {
        let mut state = PortfolioState::new(10_000.0);
        let fill = execute_sell(&mut state, day(2), 100.0, 0.0, PnlMode::RoundTrip);
        assert_eq!(fill, Fill::Skipped(Diagnostic::SellWhileFlat { date: day(2) }));
        assert_eq!(state.cash, 10_000.0);
    }

    #[test]
    fn round_trip_pnl_against_cost_basis() {
        let mut state = PortfolioState::new(10_000.0);
        execute_buy(&mut state, day(2), 100.0, 0.0);
        let trade = executed(execute_sell(&mut state, day(5), 110.0, 0.0, PnlMode::RoundTrip));
        assert_relative_eq!(trade.pnl, 1_000.0, max_relative = 1e-12);
        assert_relative_eq!(state.cash, 11_000.0, max_relative = 1e-12);
        assert!(!state.is_long());
        assert_eq!(state.cost_basis, 0.0);
    }

    #[test]
    fn round_trip_pnl_includes_both_commissions() {
        let mut state = PortfolioState::new(10_000.0);
        execute_buy(&mut state, day(2), 100.0, 0.01);
        let trade = executed(execute_sell(&mut state, day(3), 100.0, 0.01, PnlMode::RoundTrip));
        // flat price: lose both commissions
        assert!(trade.pnl < 0.0);
        assert_relative_eq!(trade.pnl, state.cash - 10_000.0, max_relative = 1e-9);
    }

    #[test]
    fn same_bar_mark_pnl_is_minus_commission() {
        let mut state = PortfolioState::new(10_000.0);
        execute_buy(&mut state, day(2), 100.0, 0.001);
        let trade = executed(execute_sell(&mut state, day(5), 120.0, 0.001, PnlMode::SameBarMark));
        assert_relative_eq!(trade.pnl, -trade.commission, max_relative = 1e-12);
    }

    #[test]
    fn pnl_mode_parses() {
        assert_eq!("round_trip".parse::<PnlMode>(), Ok(PnlMode::RoundTrip));
        assert_eq!("Same_Bar_Mark".parse::<PnlMode>(), Ok(PnlMode::SameBarMark));
        assert!("fifo".parse::<PnlMode>().is_err());
        assert_eq!(PnlMode::default(), PnlMode::RoundTrip);
    }
}
