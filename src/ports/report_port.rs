//! Report generation port trait.

use crate::domain::backtest::BacktestResult;
use crate::domain::batch::RunOutcome;
use crate::domain::error::SigtraderError;

/// Port for persisting backtest results.
pub trait ReportPort {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), SigtraderError>;

    fn write_comparison(
        &self,
        outcomes: &[RunOutcome],
        output_path: &str,
    ) -> Result<(), SigtraderError>;
}
