use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lookback window for a history request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HistoryRange {
    OneDay,
    FiveDays,
    OneYear,
}

impl HistoryRange {
    /// Range string understood by the Yahoo chart API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneDay => "1d",
            Self::FiveDays => "5d",
            Self::OneYear => "1y",
        }
    }
}

/// A single OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    /// Closing price (the only field the FX path relies on)
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Create a bar where every price equals `close`.
    pub fn flat(timestamp: DateTime<Utc>, close: f64) -> Self {
        Self {
            timestamp,
            open: close,
            high: close,
            low: close,
            close,
            volume: 0,
        }
    }
}
