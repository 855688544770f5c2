//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::{run_backtest, BacktestResult};
use crate::domain::batch::{compare, RunOutcome, StrategyRun};
use crate::domain::config_validation::{
    strategy_run_from_config, validate_backtest_config, validate_strategy_config,
    BacktestSettings, BACKTEST_SECTION, STRATEGY_SECTION,
};
use crate::domain::diagnostic::{Diagnostic, Severity};
use crate::domain::error::SigtraderError;
use crate::domain::execution::PnlMode;
use crate::domain::indicator::IndicatorSet;
use crate::domain::ohlcv::PriceBar;
use crate::domain::strategy::{ParamMap, StrategyRegistry};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Signal-driven strategy backtester")]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

/// Flags that override `[backtest]` values.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct SimulationArgs {
    /// Price CSV file
    #[arg(long)]
    pub data: Option<PathBuf>,
    #[arg(long)]
    pub capital: Option<f64>,
    /// Commission as a fraction of notional
    #[arg(long)]
    pub commission: Option<f64>,
    #[arg(long)]
    pub start: Option<NaiveDate>,
    #[arg(long)]
    pub end: Option<NaiveDate>,
    /// round_trip or same_bar_mark
    #[arg(long)]
    pub pnl_mode: Option<PnlMode>,
    /// Write the result as JSON
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Single-line JSON instead of indented
    #[arg(long)]
    pub compact: bool,
}

impl SimulationArgs {
    fn report_adapter(&self) -> JsonReportAdapter {
        if self.compact {
            JsonReportAdapter::compact()
        } else {
            JsonReportAdapter::new()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy over a price series
    Backtest {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Registered strategy name
        #[arg(short, long)]
        strategy: Option<String>,
        /// Strategy parameter, key=value (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,
        #[command(flatten)]
        sim: SimulationArgs,
    },
    /// Run several strategies over the same price series
    Compare {
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// name or name:key=value,key=value (repeatable)
        #[arg(short, long = "run", required = true)]
        runs: Vec<String>,
        #[command(flatten)]
        sim: SimulationArgs,
    },
    /// List registered strategies and their defaults
    ListStrategies,
    /// List price CSV files in a directory
    ListSources {
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match execute(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            (&e).into()
        }
    }
}

pub fn execute(command: Command) -> Result<(), SigtraderError> {
    let registry = StrategyRegistry::with_defaults();
    match command {
        Command::Backtest {
            config,
            strategy,
            params,
            sim,
        } => {
            run_backtest_command(
                &registry,
                config.as_deref(),
                strategy.as_deref(),
                &params,
                &sim,
            )
            .map(|_| ())
        }
        Command::Compare { config, runs, sim } => {
            run_compare_command(&registry, config.as_deref(), &runs, &sim).map(|_| ())
        }
        Command::ListStrategies => {
            print!("{}", render_strategy_list(&registry)?);
            Ok(())
        }
        Command::ListSources { dir } => {
            print!("{}", render_source_list(&CsvAdapter::new(dir))?);
            Ok(())
        }
        Command::Validate { config } => run_validate(&registry, &config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, SigtraderError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// `[backtest]` from the optional config file, then command-line overrides.
pub fn resolve_settings(
    config: Option<&dyn ConfigPort>,
    sim: &SimulationArgs,
) -> Result<BacktestSettings, SigtraderError> {
    let mut settings = match config {
        Some(config) => validate_backtest_config(config)?,
        None => BacktestSettings::default(),
    };

    if let Some(data) = &sim.data {
        settings.data = Some(data.display().to_string());
    }
    if let Some(capital) = sim.capital {
        settings.simulation.initial_capital = capital;
    }
    if let Some(commission) = sim.commission {
        settings.simulation.commission_rate = commission;
    }
    if let Some(pnl_mode) = sim.pnl_mode {
        settings.simulation.pnl_mode = pnl_mode;
    }
    if sim.start.is_some() {
        settings.start_date = sim.start;
    }
    if sim.end.is_some() {
        settings.end_date = sim.end;
    }

    settings.validate()?;
    Ok(settings)
}

/// Strategy from `--strategy`/`--param`, falling back to `[strategy]`.
///
/// File parameters only apply when the file names the same strategy.
pub fn resolve_strategy_run(
    config: Option<&dyn ConfigPort>,
    strategy: Option<&str>,
    params: &[String],
) -> Result<StrategyRun, SigtraderError> {
    let from_file = match config {
        Some(config) if config.get_string(STRATEGY_SECTION, "name").is_some() => {
            Some(strategy_run_from_config(config)?)
        }
        _ => None,
    };

    let mut run = match (strategy, from_file) {
        (Some(name), Some(file_run)) if file_run.name == name => file_run,
        (Some(name), _) => StrategyRun::new(name, ParamMap::new()),
        (None, Some(file_run)) => file_run,
        (None, None) => {
            return Err(SigtraderError::ConfigMissing {
                section: STRATEGY_SECTION.to_string(),
                key: "name".to_string(),
            })
        }
    };

    for assignment in params {
        for (key, value) in ParamMap::parse_assignments(&run.name, assignment)?.iter() {
            run.params.insert(key, value.clone());
        }
    }
    Ok(run)
}

fn load_bars(settings: &BacktestSettings) -> Result<Vec<PriceBar>, SigtraderError> {
    let data = settings
        .data
        .as_deref()
        .ok_or_else(|| SigtraderError::ConfigMissing {
            section: BACKTEST_SECTION.to_string(),
            key: "data".to_string(),
        })?;
    let bars =
        CsvAdapter::current_dir().fetch_bars(data, settings.start_date, settings.end_date)?;
    if bars.is_empty() {
        tracing::warn!(data, "no price bars in range");
    }
    Ok(bars)
}

fn load_optional_config(
    path: Option<&Path>,
) -> Result<Option<FileConfigAdapter>, SigtraderError> {
    path.map(load_config).transpose()
}

pub fn run_backtest_command(
    registry: &StrategyRegistry,
    config_path: Option<&Path>,
    strategy: Option<&str>,
    params: &[String],
    sim: &SimulationArgs,
) -> Result<BacktestResult, SigtraderError> {
    let adapter = load_optional_config(config_path)?;
    let config = adapter.as_ref().map(|a| a as &dyn ConfigPort);

    let settings = resolve_settings(config, sim)?;
    let run = resolve_strategy_run(config, strategy, params)?;
    let strategy = registry.create(&run.name, &run.params)?;
    let bars = load_bars(&settings)?;

    tracing::info!(strategy = %run, bars = bars.len(), "running backtest");
    let result = run_backtest(
        strategy.as_ref(),
        &bars,
        &IndicatorSet::new(),
        &settings.simulation,
    )?;
    forward_diagnostics(&result.diagnostics);

    print!("{}", render_summary(&result));

    if let Some(output) = &sim.output {
        sim.report_adapter()
            .write(&result, &output.display().to_string())?;
    }
    Ok(result)
}

pub fn run_compare_command(
    registry: &StrategyRegistry,
    config_path: Option<&Path>,
    runs: &[String],
    sim: &SimulationArgs,
) -> Result<Vec<RunOutcome>, SigtraderError> {
    let adapter = load_optional_config(config_path)?;
    let config = adapter.as_ref().map(|a| a as &dyn ConfigPort);

    let settings = resolve_settings(config, sim)?;
    let runs = runs
        .iter()
        .map(|text| StrategyRun::parse(text))
        .collect::<Result<Vec<_>, _>>()?;
    let bars = load_bars(&settings)?;

    let mut outcomes = compare(registry, &bars, &runs, &settings.simulation);
    for outcome in &outcomes {
        if let Ok(result) = &outcome.result {
            forward_diagnostics(&result.diagnostics);
        }
    }

    print!("{}", render_comparison(&outcomes));

    if let Some(output) = &sim.output {
        sim.report_adapter()
            .write_comparison(&outcomes, &output.display().to_string())?;
    }

    if !outcomes.is_empty() && outcomes.iter().all(|o| o.result.is_err()) {
        if let Some(RunOutcome { result: Err(e), .. }) = outcomes.drain(..).next() {
            return Err(e);
        }
    }
    Ok(outcomes)
}

fn run_validate(registry: &StrategyRegistry, config_path: &Path) -> Result<(), SigtraderError> {
    let adapter = load_config(config_path)?;
    let settings = validate_backtest_config(&adapter)?;
    let run = validate_strategy_config(&adapter, registry)?;

    println!("Strategy:    {}", run);
    println!("Capital:     {}", settings.simulation.initial_capital);
    println!("Commission:  {}", settings.simulation.commission_rate);
    println!("P&L mode:    {}", settings.simulation.pnl_mode);
    if let Some(data) = &settings.data {
        println!("Data:        {}", data);
    }
    println!("Configuration is valid.");
    Ok(())
}

fn forward_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        match diagnostic.severity() {
            Severity::Warning => tracing::warn!("{diagnostic}"),
            Severity::Info => tracing::debug!("{diagnostic}"),
        }
    }
}

/// Human rendering of a metric value; infinities print as `∞`.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "∞".to_string()
    } else if value == f64::NEG_INFINITY {
        "-∞".to_string()
    } else {
        format!("{:.4}", value)
    }
}

fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}%", value * 100.0)
    } else {
        format_value(value)
    }
}

pub fn render_summary(result: &BacktestResult) -> String {
    let m = &result.metrics;
    let mut out = String::new();
    let range = match (result.start_date, result.end_date) {
        (Some(start), Some(end)) => format!("{} to {}", start, end),
        _ => "no bars".to_string(),
    };

    let _ = writeln!(out, "=== {} ({}) ===", result.strategy, result.parameters);
    let _ = writeln!(out, "Period:           {}", range);
    let _ = writeln!(out, "Final Value:      {:.2}", m.final_value);
    let _ = writeln!(out, "Total Return:     {}", format_percent(m.total_return));
    let _ = writeln!(out, "Annualized:       {}", format_percent(m.annualized_return));
    let _ = writeln!(out, "Volatility:       {}", format_percent(m.volatility));
    let _ = writeln!(out, "Sharpe Ratio:     {}", format_value(m.sharpe_ratio));
    let _ = writeln!(out, "Sortino Ratio:    {}", format_value(m.sortino_ratio));
    let _ = writeln!(out, "Max Drawdown:     {}", format_percent(m.max_drawdown));
    let _ = writeln!(out, "Calmar Ratio:     {}", format_value(m.calmar_ratio));
    let _ = writeln!(out, "Total Trades:     {}", m.total_trades);
    let _ = writeln!(out, "Win Rate:         {}", format_percent(m.win_rate));
    let _ = writeln!(out, "Profit Factor:    {}", format_value(m.profit_factor));
    let _ = writeln!(out, "Commission Paid:  {:.2}", m.commission_paid);
    out
}

pub fn render_comparison(outcomes: &[RunOutcome]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<40} {:>10} {:>10} {:>10} {:>8}",
        "run", "return", "sharpe", "max_dd", "trades"
    );
    for outcome in outcomes {
        match &outcome.result {
            Ok(result) => {
                let m = &result.metrics;
                let _ = writeln!(
                    out,
                    "{:<40} {:>10} {:>10} {:>10} {:>8}",
                    outcome.run.to_string(),
                    format_percent(m.total_return),
                    format_value(m.sharpe_ratio),
                    format_percent(m.max_drawdown),
                    m.total_trades
                );
            }
            Err(e) => {
                let _ = writeln!(out, "{:<40} error: {}", outcome.run.to_string(), e);
            }
        }
    }
    out
}

pub fn render_source_list(data: &dyn DataPort) -> Result<String, SigtraderError> {
    let sources = data.list_sources()?;
    if sources.is_empty() {
        return Ok("no CSV files found\n".to_string());
    }
    let mut out = String::new();
    for source in sources {
        let _ = writeln!(out, "{}", source);
    }
    Ok(out)
}

pub fn render_strategy_list(registry: &StrategyRegistry) -> Result<String, SigtraderError> {
    let mut out = String::new();
    for name in registry.list() {
        let info = registry.describe(name)?;
        let _ = writeln!(out, "{:<16} {}", info.name, info.description);
        let _ = writeln!(out, "{:<16} defaults: {}", "", info.defaults);
    }
    Ok(out)
}
