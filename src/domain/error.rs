//! Domain error types.

/// Top-level error type for sigtrader.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("invalid parameter {parameter} for strategy {strategy}: {reason}")]
    Parameter {
        strategy: String,
        parameter: String,
        reason: String,
    },

    #[error("unknown strategy '{name}' (available: {available})")]
    UnknownStrategy { name: String, available: String },

    #[error("series misaligned: {reason}")]
    Alignment { reason: String },

    #[error("invalid price bar at index {index}: {reason}")]
    InvalidBar { index: usize, reason: String },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SigtraderError {
    pub fn parameter(strategy: &str, parameter: &str, reason: impl Into<String>) -> Self {
        SigtraderError::Parameter {
            strategy: strategy.to_string(),
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }

    pub fn alignment(reason: impl Into<String>) -> Self {
        SigtraderError::Alignment {
            reason: reason.into(),
        }
    }
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::Data { .. } | SigtraderError::InvalidBar { .. } => 3,
            SigtraderError::Parameter { .. } | SigtraderError::UnknownStrategy { .. } => 4,
            SigtraderError::Alignment { .. } => 5,
            SigtraderError::Report { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
