//! Configuration access port trait.

use crate::domain::error::SigtraderError;
use chrono::NaiveDate;

/// Read access to sectioned key/value configuration.
///
/// Blank values count as absent. Typed getters fail with
/// [`SigtraderError::ConfigInvalid`] when a present value does not parse.
pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, SigtraderError>;
    /// `YYYY-MM-DD`.
    fn get_date(&self, section: &str, key: &str) -> Result<Option<NaiveDate>, SigtraderError>;
    /// Keys present in `section`, sorted. Empty if the section is absent.
    fn section_keys(&self, section: &str) -> Vec<String>;
}
