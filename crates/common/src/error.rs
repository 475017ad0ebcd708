use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The candle series is shorter than the operation's minimum length.
    /// This is the only condition the analysis engine surfaces as an error.
    #[error("Insufficient data for {operation}: need at least {required} candles, got {actual}")]
    InsufficientData {
        operation: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Invalid candle series: {0}")]
    InvalidSeries(String),

    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, Error::InsufficientData { .. })
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
