//! CSV file data adapter.
//!
//! Expects a header row with `Date,Open,High,Low,Close,Volume` in any order
//! and any letter case; other columns are ignored. Rows with an empty price
//! or volume field are dropped.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::{validate_bars, PriceBar};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

const COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Adapter resolving sources against the working directory.
    pub fn current_dir() -> Self {
        Self::new(PathBuf::new())
    }

    fn csv_path(&self, source: &str) -> PathBuf {
        self.base_path.join(source)
    }
}

fn data_error(path: &Path, reason: impl std::fmt::Display) -> SigtraderError {
    SigtraderError::Data {
        reason: format!("{}: {}", path.display(), reason),
    }
}

fn column_indexes(
    path: &Path,
    headers: &csv::StringRecord,
) -> Result<[usize; 6], SigtraderError> {
    let mut indexes = [0usize; 6];
    for (slot, name) in indexes.iter_mut().zip(COLUMNS) {
        *slot = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| data_error(path, format!("missing required column '{}'", name)))?;
    }
    Ok(indexes)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    // tolerate a trailing time component
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn parse_price(path: &Path, line: u64, name: &str, raw: &str) -> Result<f64, SigtraderError> {
    raw.trim().parse::<f64>().map_err(|_| {
        data_error(
            path,
            format!("line {}: invalid {} value '{}'", line, name, raw),
        )
    })
}

fn parse_volume(path: &Path, line: u64, raw: &str) -> Result<u64, SigtraderError> {
    let raw = raw.trim();
    if let Ok(volume) = raw.parse::<u64>() {
        return Ok(volume);
    }
    match raw.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.is_finite() => Ok(v.round() as u64),
        _ => Err(data_error(
            path,
            format!("line {}: invalid volume value '{}'", line, raw),
        )),
    }
}

impl DataPort for CsvAdapter {
    fn fetch_bars(
        &self,
        source: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<PriceBar>, SigtraderError> {
        let path = self.csv_path(source);
        let content = fs::read_to_string(&path).map_err(|e| data_error(&path, e))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| data_error(&path, e))?.clone();
        let [date_col, open_col, high_col, low_col, close_col, volume_col] =
            column_indexes(&path, &headers)?;

        let mut bars = Vec::new();
        let mut dropped = 0usize;

        for (row, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| data_error(&path, e))?;
            let line = row as u64 + 2;
            let field = |i: usize| record.get(i).unwrap_or("");

            let date = parse_date(field(date_col)).ok_or_else(|| {
                data_error(
                    &path,
                    format!("line {}: invalid date '{}'", line, field(date_col)),
                )
            })?;
            if start_date.is_some_and(|start| date < start)
                || end_date.is_some_and(|end| date > end)
            {
                continue;
            }

            let numeric = [open_col, high_col, low_col, close_col, volume_col];
            if numeric.iter().any(|&i| field(i).trim().is_empty()) {
                dropped += 1;
                continue;
            }

            bars.push(PriceBar {
                date,
                open: parse_price(&path, line, "open", field(open_col))?,
                high: parse_price(&path, line, "high", field(high_col))?,
                low: parse_price(&path, line, "low", field(low_col))?,
                close: parse_price(&path, line, "close", field(close_col))?,
                volume: parse_volume(&path, line, field(volume_col))?,
            });
        }

        if dropped > 0 {
            tracing::warn!(
                file = %path.display(),
                rows = dropped,
                "dropped rows with missing values"
            );
        }

        bars.sort_by_key(|b| b.date);
        validate_bars(&bars)?;
        tracing::info!(file = %path.display(), bars = bars.len(), "loaded price data");
        Ok(bars)
    }

    fn list_sources(&self) -> Result<Vec<String>, SigtraderError> {
        let dir = if self.base_path.as_os_str().is_empty() {
            Path::new(".")
        } else {
            self.base_path.as_path()
        };
        let entries = fs::read_dir(dir).map_err(|e| data_error(dir, e))?;

        let mut sources = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| data_error(dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.to_ascii_lowercase().ends_with(".csv") {
                sources.push(name);
            }
        }

        sources.sort();
        Ok(sources)
    }
}
