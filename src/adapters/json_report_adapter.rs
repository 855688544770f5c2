//! JSON report adapter implementing ReportPort.
//!
//! JSON has no infinity, so non-finite metric values are written as the
//! strings `"Infinity"`, `"-Infinity"` and `"NaN"`.

use serde_json::{json, Map, Number, Value};
use std::fs;

use crate::domain::backtest::BacktestResult;
use crate::domain::batch::RunOutcome;
use crate::domain::error::SigtraderError;
use crate::domain::metrics::Metrics;
use crate::domain::signal::Signal;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Default)]
pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self { pretty: true }
    }

    pub fn compact() -> Self {
        Self { pretty: false }
    }

    fn write_value(&self, value: &Value, output_path: &str) -> Result<(), SigtraderError> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .map_err(report_error)?;
        fs::write(output_path, text)?;
        tracing::info!(path = output_path, "report written");
        Ok(())
    }
}

fn report_error(err: serde_json::Error) -> SigtraderError {
    SigtraderError::Report {
        reason: err.to_string(),
    }
}

/// A float as JSON, with non-finite values spelled out as strings.
pub fn float_to_json(value: f64) -> Value {
    match Number::from_f64(value) {
        Some(number) => Value::Number(number),
        None if value.is_nan() => Value::String("NaN".to_string()),
        None if value > 0.0 => Value::String("Infinity".to_string()),
        None => Value::String("-Infinity".to_string()),
    }
}

pub fn metrics_to_json(metrics: &Metrics) -> Value {
    let map: Map<String, Value> = metrics
        .to_map()
        .into_iter()
        .map(|(name, value)| (name.to_string(), float_to_json(value)))
        .collect();
    Value::Object(map)
}

pub fn result_to_json(result: &BacktestResult) -> Result<Value, SigtraderError> {
    let signals: Vec<Value> = result
        .signals
        .points
        .iter()
        .filter(|p| p.signal != Signal::Hold)
        .map(|p| json!({ "date": p.date, "signal": p.signal }))
        .collect();

    Ok(json!({
        "strategy": result.strategy,
        "parameters": serde_json::to_value(&result.parameters).map_err(report_error)?,
        "config": serde_json::to_value(&result.config).map_err(report_error)?,
        "start_date": result.start_date,
        "end_date": result.end_date,
        "metrics": metrics_to_json(&result.metrics),
        "signals": signals,
        "trades": serde_json::to_value(&result.trades).map_err(report_error)?,
        "equity": serde_json::to_value(&result.equity).map_err(report_error)?,
        "diagnostics": serde_json::to_value(&result.diagnostics).map_err(report_error)?,
    }))
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), SigtraderError> {
        self.write_value(&result_to_json(result)?, output_path)
    }

    fn write_comparison(
        &self,
        outcomes: &[RunOutcome],
        output_path: &str,
    ) -> Result<(), SigtraderError> {
        let runs = outcomes
            .iter()
            .map(|outcome| {
                Ok(match &outcome.result {
                    Ok(result) => json!({
                        "run": outcome.run.to_string(),
                        "status": "ok",
                        "parameters": serde_json::to_value(&result.parameters)
                            .map_err(report_error)?,
                        "metrics": metrics_to_json(&result.metrics),
                    }),
                    Err(err) => json!({
                        "run": outcome.run.to_string(),
                        "status": "error",
                        "error": err.to_string(),
                    }),
                })
            })
            .collect::<Result<Vec<Value>, SigtraderError>>()?;
        self.write_value(&json!({ "runs": runs }), output_path)
    }
}
