//! Domain error types.

/// Top-level error type for crosstrader.
#[derive(Debug, thiserror::Error)]
pub enum CrosstraderError {
    #[error("required column '{column}' missing from price data")]
    MissingColumn { column: String },

    #[error("data error for {symbol}: {reason}")]
    Data { symbol: String, reason: String },

    #[error("no data for {symbol} between {start} and {end}")]
    NoData {
        symbol: String,
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

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

    #[error("series length mismatch: {prices} prices vs {signals} signals")]
    LengthMismatch { prices: usize, signals: usize },

    #[error("degenerate engine state at step {step}: long with zero entry price")]
    DegenerateState { step: usize },

    #[error("insufficient data: {rows} usable rows, need at least {minimum}")]
    InsufficientData { rows: usize, minimum: usize },

    #[error("classifier error: {reason}")]
    Classifier { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&CrosstraderError> for std::process::ExitCode {
    fn from(err: &CrosstraderError) -> Self {
        let code: u8 = match err {
            CrosstraderError::Io(_) => 1,
            CrosstraderError::ConfigParse { .. }
            | CrosstraderError::ConfigMissing { .. }
            | CrosstraderError::ConfigInvalid { .. } => 2,
            CrosstraderError::Data { .. } | CrosstraderError::NoData { .. } => 3,
            CrosstraderError::MissingColumn { .. }
            | CrosstraderError::LengthMismatch { .. }
            | CrosstraderError::DegenerateState { .. } => 4,
            CrosstraderError::InsufficientData { .. } | CrosstraderError::Classifier { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
