//! Domain error types.

/// Top-level error type for stonkulator.
#[derive(Debug, thiserror::Error)]
pub enum StonkError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

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

    #[error("market data source error for {symbol}: {reason}")]
    Source { symbol: String, reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error("insufficient data for {symbol}: have {bars} bars, need {minimum}")]
    InsufficientData {
        symbol: String,
        bars: usize,
        minimum: usize,
    },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StonkError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        StonkError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl From<r2d2::Error> for StonkError {
    fn from(e: r2d2::Error) -> Self {
        StonkError::Database {
            reason: e.to_string(),
        }
    }
}

impl From<rusqlite::Error> for StonkError {
    fn from(e: rusqlite::Error) -> Self {
        StonkError::DatabaseQuery {
            reason: e.to_string(),
        }
    }
}

impl From<&StonkError> for std::process::ExitCode {
    fn from(err: &StonkError) -> Self {
        let code: u8 = match err {
            StonkError::Io(_) | StonkError::Csv(_) | StonkError::Json(_) => 1,
            StonkError::ConfigParse { .. }
            | StonkError::ConfigMissing { .. }
            | StonkError::ConfigInvalid { .. } => 2,
            StonkError::Database { .. } | StonkError::DatabaseQuery { .. } => 3,
            StonkError::Source { .. } => 4,
            StonkError::NoData { .. } | StonkError::InsufficientData { .. } => 5,
            StonkError::InvalidInput { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
