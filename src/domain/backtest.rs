//! The backtest pipeline: signals → per-bar portfolio fold → metrics.

use chrono::NaiveDate;
use serde::Serialize;

use super::diagnostic::Diagnostic;
use super::error::SigtraderError;
use super::execution::{execute_buy, execute_sell, Fill, PnlMode, Trade};
use super::indicator::IndicatorSet;
use super::metrics::Metrics;
use super::ohlcv::PriceBar;
use super::portfolio::{EquitySnapshot, PortfolioState};
use super::signal::{Signal, SignalSeries};
use super::strategy::{ParamMap, Strategy};

pub const DEFAULT_INITIAL_CAPITAL: f64 = 100_000.0;
pub const DEFAULT_COMMISSION_RATE: f64 = 0.001;

/// Simulation-level settings shared by every strategy run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationConfig {
    pub initial_capital: f64,
    /// Fraction of notional charged per trade.
    pub commission_rate: f64,
    pub pnl_mode: PnlMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            initial_capital: DEFAULT_INITIAL_CAPITAL,
            commission_rate: DEFAULT_COMMISSION_RATE,
            pnl_mode: PnlMode::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new(initial_capital: f64, commission_rate: f64) -> Self {
        SimulationConfig {
            initial_capital,
            commission_rate,
            pnl_mode: PnlMode::default(),
        }
    }

    pub fn with_pnl_mode(mut self, pnl_mode: PnlMode) -> Self {
        self.pnl_mode = pnl_mode;
        self
    }

    pub fn validate(&self) -> Result<(), SigtraderError> {
        if !(self.initial_capital.is_finite() && self.initial_capital > 0.0) {
            return Err(SigtraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "initial_capital".into(),
                reason: format!("must be positive, got {}", self.initial_capital),
            });
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(SigtraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "commission".into(),
                reason: format!("must be in [0, 1), got {}", self.commission_rate),
            });
        }
        Ok(())
    }
}

/// Ledger, equity curve and notes from one simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub trades: Vec<Trade>,
    pub equity: Vec<EquitySnapshot>,
    pub diagnostics: Vec<Diagnostic>,
    pub final_state: PortfolioState,
}

fn check_alignment(bars: &[PriceBar], signals: &SignalSeries) -> Result<(), SigtraderError> {
    if bars.len() != signals.len() {
        return Err(SigtraderError::alignment(format!(
            "{} signals for {} bars",
            signals.len(),
            bars.len()
        )));
    }
    let misdated = bars
        .iter()
        .zip(&signals.points)
        .position(|(bar, point)| bar.date != point.date);
    if let Some(index) = misdated {
        return Err(SigtraderError::alignment(format!(
            "signal dated {} at index {} but bar is {}",
            signals.points[index].date, index, bars[index].date
        )));
    }
    Ok(())
}

/// Fold the signals over the bars in order, one snapshot per bar.
///
/// Trades execute at the bar's close and the snapshot is taken after the trade.
pub fn simulate(
    bars: &[PriceBar],
    signals: &SignalSeries,
    config: &SimulationConfig,
) -> Result<SimulationResult, SigtraderError> {
    config.validate()?;
    check_alignment(bars, signals)?;

    let mut state = PortfolioState::new(config.initial_capital);
    let mut trades = Vec::new();
    let mut equity = Vec::with_capacity(bars.len());
    let mut diagnostics = Vec::new();

    for (index, (bar, point)) in bars.iter().zip(&signals.points).enumerate() {
        if !(bar.close.is_finite() && bar.close > 0.0) {
            return Err(SigtraderError::InvalidBar {
                index,
                reason: format!("close must be positive, got {}", bar.close),
            });
        }

        let fill = match point.signal {
            Signal::Buy => Some(execute_buy(
                &mut state,
                bar.date,
                bar.close,
                config.commission_rate,
            )),
            Signal::Sell => Some(execute_sell(
                &mut state,
                bar.date,
                bar.close,
                config.commission_rate,
                config.pnl_mode,
            )),
            Signal::Hold => None,
        };

        match fill {
            Some(Fill::Executed { trade, diagnostic }) => {
                tracing::debug!(
                    date = %trade.date,
                    direction = %trade.direction,
                    price = trade.price,
                    shares = trade.shares,
                    pnl = trade.pnl,
                    "trade executed"
                );
                trades.push(trade);
                diagnostics.extend(diagnostic);
            }
            Some(Fill::Skipped(diagnostic)) => diagnostics.push(diagnostic),
            None => {}
        }

        equity.push(state.mark(bar.date, bar.close));
    }

    Ok(SimulationResult {
        trades,
        equity,
        diagnostics,
        final_state: state,
    })
}

/// Everything one strategy run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    pub strategy: String,
    pub parameters: ParamMap,
    pub config: SimulationConfig,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub signals: SignalSeries,
    pub trades: Vec<Trade>,
    pub equity: Vec<EquitySnapshot>,
    pub diagnostics: Vec<Diagnostic>,
    pub final_state: PortfolioState,
    pub metrics: Metrics,
}

/// Generate signals, simulate and measure.
///
/// Series already in `indicators` are reused; the rest are computed here.
pub fn run_backtest(
    strategy: &dyn Strategy,
    bars: &[PriceBar],
    indicators: &IndicatorSet,
    config: &SimulationConfig,
) -> Result<BacktestResult, SigtraderError> {
    strategy.validate_parameters()?;
    config.validate()?;

    let mut diagnostics = Vec::new();
    let mut resolved = IndicatorSet::new();
    for indicator_type in strategy.required_indicators() {
        let series = indicators.resolve(&indicator_type, bars)?.into_owned();
        let warmup = series.warmup_len();
        if warmup > 0 {
            diagnostics.push(Diagnostic::Warmup {
                indicator: indicator_type.to_string(),
                bars: warmup,
            });
        }
        resolved.insert(series);
    }

    let signals = strategy.generate_signals(bars, &resolved)?;
    if signals.active_count() == 0 {
        diagnostics.push(Diagnostic::NoSignals);
    }

    let simulation = simulate(bars, &signals, config)?;
    diagnostics.extend(simulation.diagnostics);
    let metrics = Metrics::compute(&simulation.equity, &simulation.trades, config.initial_capital);

    tracing::info!(
        strategy = strategy.name(),
        bars = bars.len(),
        trades = simulation.trades.len(),
        total_return = metrics.total_return,
        "backtest complete"
    );

    Ok(BacktestResult {
        strategy: strategy.name().to_string(),
        parameters: strategy.parameters(),
        config: config.clone(),
        start_date: bars.first().map(|b| b.date),
        end_date: bars.last().map(|b| b.date),
        signals,
        trades: simulation.trades,
        equity: simulation.equity,
        diagnostics,
        final_state: simulation.final_state,
        metrics,
    })
}
