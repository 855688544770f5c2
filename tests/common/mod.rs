#![allow(dead_code)]

use chrono::NaiveDate;
pub use sigtrader::domain::ohlcv::PriceBar;
use sigtrader::domain::backtest::SimulationConfig;
use sigtrader::domain::error::SigtraderError;
use sigtrader::ports::data_port::DataPort;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::Path;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, source: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(source.to_string(), bars);
        self
    }

    pub fn with_error(mut self, source: &str, reason: &str) -> Self {
        self.errors.insert(source.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(
        &self,
        source: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, SigtraderError> {
        if let Some(reason) = self.errors.get(source) {
            return Err(SigtraderError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(source)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|b| start_date.is_none_or(|s| b.date >= s))
            .filter(|b| end_date.is_none_or(|e| b.date <= e))
            .collect())
    }

    fn list_sources(&self) -> Result<Vec<String>, SigtraderError> {
        let mut sources: Vec<String> = self.data.keys().cloned().collect();
        sources.sort();
        Ok(sources)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(date_str: &str, close: f64) -> PriceBar {
    PriceBar {
        date: NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap(),
        open: close,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 10_000,
    }
}

/// One bar per consecutive day starting 2024-01-01.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    let start = date(2024, 1, 1);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            date: start + chrono::Duration::days(i as i64),
            open: close,
            high: close,
            low: close,
            close,
            volume: 10_000,
        })
        .collect()
}

pub fn rising_closes(count: usize, start: f64) -> Vec<f64> {
    (0..count).map(|i| start + i as f64).collect()
}

/// Slow sine wave, enough swings for every strategy to trade.
pub fn wave_closes(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 100.0 + 15.0 * (i as f64 / 8.0).sin() + i as f64 * 0.05)
        .collect()
}

/// Falls from 115 to 101 then climbs back to 126.
pub fn dip_and_recover_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..15).map(|i| 115.0 - i as f64).collect();
    closes.extend((0..25).map(|i| 102.0 + i as f64));
    closes
}

pub fn no_commission(capital: f64) -> SimulationConfig {
    SimulationConfig::new(capital, 0.0)
}

pub fn write_csv(dir: &Path, name: &str, bars: &[PriceBar]) -> String {
    let mut content = String::from("Date,Open,High,Low,Close,Volume\n");
    for bar in bars {
        let _ = writeln!(
            content,
            "{},{},{},{},{},{}",
            bar.date, bar.open, bar.high, bar.low, bar.close, bar.volume
        );
    }
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path.display().to_string()
}

pub fn write_ini(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
