//! Core error types.
//!
//! Currency conversion never fails, so nothing in [`crate::fx`] returns these;
//! they cover report assembly, serialization and configuration.

use thiserror::Error;

use fundamentals_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for report generation.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Timeout fetching data for {symbol}")]
    Timeout { symbol: String },

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Failed to serialize response: {0}")]
    Serialization(String),

    #[error("Failed to build JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Short, stable name of the variant, emitted as `type` in fatal error
    /// payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MarketData(_) => "MarketDataError",
            Self::Timeout { .. } => "TimeoutError",
            Self::InvalidConfigValue(_) => "ConfigError",
            Self::Serialization(_) | Self::Json(_) => "SerializationError",
        }
    }
}
