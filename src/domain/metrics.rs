//! Performance metrics over a completed simulation.
//!
//! Every function here is total: degenerate inputs (no trades, zero variance,
//! no losers) map to 0 or +infinity, never to an error or NaN.

use std::collections::BTreeMap;

use super::execution::{Trade, TradeDirection};
use super::portfolio::EquitySnapshot;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const CALENDAR_DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return: f64,
    pub annualized_return: f64,
    pub volatility: f64,
    pub daily_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Fraction below the running peak, always <= 0.
    pub max_drawdown: f64,
    /// Longest run of bars spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub calmar_ratio: f64,
    /// BUYs and SELLs.
    pub total_trades: usize,
    pub sell_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_pnl: f64,
    pub avg_trade_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub max_consecutive_wins: usize,
    pub max_consecutive_losses: usize,
    pub commission_paid: f64,
    pub avg_trade_duration_days: f64,
}

impl Metrics {
    pub fn compute(equity: &[EquitySnapshot], trades: &[Trade], initial_capital: f64) -> Self {
        let final_value = equity
            .last()
            .map(|s| s.total_value)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            final_value / initial_capital - 1.0
        } else {
            0.0
        };

        let calendar_days = match (equity.first(), equity.last()) {
            (Some(first), Some(last)) => (last.date - first.date).num_days(),
            _ => 0,
        };
        let annualized_return = annualize(total_return, calendar_days);

        let returns = daily_returns(equity);
        let daily_volatility = sample_std(&returns);
        let volatility = daily_volatility * TRADING_DAYS_PER_YEAR.sqrt();
        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&returns);

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(equity);
        let calmar_ratio = if max_drawdown < 0.0 {
            annualized_return / max_drawdown.abs()
        } else {
            0.0
        };

        let stats = TradeStats::from_trades(trades);

        Metrics {
            initial_capital,
            final_value,
            total_return,
            annualized_return,
            volatility,
            daily_volatility,
            sharpe_ratio,
            sortino_ratio,
            max_drawdown,
            max_drawdown_duration,
            calmar_ratio,
            total_trades: trades.len(),
            sell_trades: stats.sells,
            winning_trades: stats.won,
            losing_trades: stats.lost,
            breakeven_trades: stats.sells - stats.won - stats.lost,
            win_rate: ratio_or_zero(stats.won as f64, stats.sells as f64),
            profit_factor: stats.profit_factor(),
            total_pnl: stats.total_wins - stats.total_losses,
            avg_trade_pnl: ratio_or_zero(stats.total_wins - stats.total_losses, stats.sells as f64),
            avg_win: ratio_or_zero(stats.total_wins, stats.won as f64),
            avg_loss: ratio_or_zero(stats.total_losses, stats.lost as f64),
            largest_win: stats.largest_win,
            largest_loss: stats.largest_loss,
            max_consecutive_wins: stats.max_win_streak,
            max_consecutive_losses: stats.max_loss_streak,
            commission_paid: trades.iter().map(|t| t.commission).sum(),
            avg_trade_duration_days: ratio_or_zero(
                stats.total_duration_days as f64,
                stats.closed_round_trips as f64,
            ),
        }
    }

    /// Flat name → value view. Every name is always present.
    pub fn to_map(&self) -> BTreeMap<&'static str, f64> {
        BTreeMap::from([
            ("initial_capital", self.initial_capital),
            ("final_value", self.final_value),
            ("total_return", self.total_return),
            ("annualized_return", self.annualized_return),
            ("volatility", self.volatility),
            ("daily_volatility", self.daily_volatility),
            ("sharpe_ratio", self.sharpe_ratio),
            ("sortino_ratio", self.sortino_ratio),
            ("max_drawdown", self.max_drawdown),
            ("max_drawdown_duration", self.max_drawdown_duration as f64),
            ("calmar_ratio", self.calmar_ratio),
            ("total_trades", self.total_trades as f64),
            ("sell_trades", self.sell_trades as f64),
            ("winning_trades", self.winning_trades as f64),
            ("losing_trades", self.losing_trades as f64),
            ("breakeven_trades", self.breakeven_trades as f64),
            ("win_rate", self.win_rate),
            ("profit_factor", self.profit_factor),
            ("total_pnl", self.total_pnl),
            ("avg_trade_pnl", self.avg_trade_pnl),
            ("avg_win", self.avg_win),
            ("avg_loss", self.avg_loss),
            ("largest_win", self.largest_win),
            ("largest_loss", self.largest_loss),
            ("max_consecutive_wins", self.max_consecutive_wins as f64),
            ("max_consecutive_losses", self.max_consecutive_losses as f64),
            ("commission_paid", self.commission_paid),
            ("avg_trade_duration_days", self.avg_trade_duration_days),
        ])
    }
}

fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator != 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

fn annualize(total_return: f64, calendar_days: i64) -> f64 {
    if calendar_days <= 0 {
        return 0.0;
    }
    (1.0 + total_return).powf(CALENDAR_DAYS_PER_YEAR / calendar_days as f64) - 1.0
}

/// Simple returns from the second bar on.
pub fn daily_returns(equity: &[EquitySnapshot]) -> Vec<f64> {
    equity
        .windows(2)
        .map(|w| ratio_or_zero(w[1].total_value - w[0].total_value, w[0].total_value))
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    ratio_or_zero(values.iter().sum(), values.len() as f64)
}

/// Sample standard deviation (n - 1); zero below two observations.
pub fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

fn compute_risk_adjusted(returns: &[f64]) -> (f64, f64) {
    let mean_return = mean(returns);
    let annualizer = TRADING_DAYS_PER_YEAR.sqrt();

    let stddev = sample_std(returns);
    let sharpe = if stddev > 0.0 {
        mean_return / stddev * annualizer
    } else {
        0.0
    };

    let downside: Vec<f64> = returns.iter().copied().filter(|r| *r < 0.0).collect();
    let sortino = if downside.is_empty() {
        f64::INFINITY
    } else {
        let downside_stddev = sample_std(&downside);
        if downside_stddev > 0.0 {
            mean_return / downside_stddev * annualizer
        } else {
            0.0
        }
    };

    (sharpe, sortino)
}

fn compute_drawdown(equity: &[EquitySnapshot]) -> (f64, usize) {
    let Some(first) = equity.first() else {
        return (0.0, 0);
    };

    let mut peak = first.total_value;
    let mut max_dd = 0.0_f64;
    let mut current_duration = 0usize;
    let mut max_duration = 0usize;

    for snapshot in equity {
        let value = snapshot.total_value;
        if value >= peak {
            peak = value;
            current_duration = 0;
        } else if peak > 0.0 {
            max_dd = max_dd.min((value - peak) / peak);
            current_duration += 1;
            max_duration = max_duration.max(current_duration);
        }
    }

    (max_dd, max_duration)
}

#[derive(Debug, Default)]
struct TradeStats {
    sells: usize,
    won: usize,
    lost: usize,
    total_wins: f64,
    total_losses: f64,
    largest_win: f64,
    largest_loss: f64,
    max_win_streak: usize,
    max_loss_streak: usize,
    total_duration_days: i64,
    closed_round_trips: usize,
}

impl TradeStats {
    fn from_trades(trades: &[Trade]) -> Self {
        let mut stats = TradeStats::default();
        let mut win_streak = 0usize;
        let mut loss_streak = 0usize;
        let mut open_date = None;

        for trade in trades {
            if trade.direction == TradeDirection::Buy {
                open_date = Some(trade.date);
                continue;
            }

            stats.sells += 1;
            if let Some(entry) = open_date.take() {
                stats.total_duration_days += (trade.date - entry).num_days();
                stats.closed_round_trips += 1;
            }

            let pnl = trade.pnl;
            if pnl > 0.0 {
                stats.won += 1;
                stats.total_wins += pnl;
                stats.largest_win = stats.largest_win.max(pnl);
                win_streak += 1;
                loss_streak = 0;
            } else if pnl < 0.0 {
                stats.lost += 1;
                stats.total_losses += pnl.abs();
                stats.largest_loss = stats.largest_loss.max(pnl.abs());
                loss_streak += 1;
                win_streak = 0;
            } else {
                win_streak = 0;
                loss_streak = 0;
            }
            stats.max_win_streak = stats.max_win_streak.max(win_streak);
            stats.max_loss_streak = stats.max_loss_streak.max(loss_streak);
        }

        stats
    }

    /// Infinite whenever nothing was lost, open BUYs and empty ledgers included.
    fn profit_factor(&self) -> f64 {
        if self.total_losses > 0.0 {
            self.total_wins / self.total_losses
        } else {
            f64::INFINITY
        }
    }
}
