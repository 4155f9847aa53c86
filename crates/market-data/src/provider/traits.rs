//! Market data provider trait definitions.
//!
//! This module defines the core `MarketDataProvider` trait that the Yahoo
//! provider and test doubles implement.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{Bar, FinancialStatement, Frequency, HistoryRange, InstrumentInfo, StatementKind};

/// Trait for market data providers.
///
/// Only history is mandatory: it is all the FX rate lookup needs, so a
/// rate-only stub can skip the rest.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use fundamentals_market_data::{Bar, HistoryRange, MarketDataError, MarketDataProvider};
///
/// struct FixedRateProvider;
///
/// #[async_trait]
/// impl MarketDataProvider for FixedRateProvider {
///     fn id(&self) -> &'static str {
///         "FIXED"
///     }
///
///     async fn get_history(
///         &self,
///         _symbol: &str,
///         _range: HistoryRange,
///     ) -> Result<Vec<Bar>, MarketDataError> {
///         Ok(vec![Bar::flat(chrono::Utc::now(), 0.14)])
///     }
/// }
/// ```
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "YAHOO".
    /// Used for logging and error attribution.
    fn id(&self) -> &'static str;

    /// Fetch daily bars for `symbol` over `range`.
    ///
    /// Bars are ordered by timestamp ascending, so the last element is the
    /// most recent close. Currency pairs use Yahoo notation (`CNYUSD=X`).
    async fn get_history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<Bar>, MarketDataError>;

    /// Fetch the flat info record for `symbol`.
    ///
    /// Default implementation returns `NotSupported`.
    async fn get_info(&self, symbol: &str) -> Result<InstrumentInfo, MarketDataError> {
        let _ = symbol;
        Err(MarketDataError::NotSupported {
            operation: "info".to_string(),
            provider: self.id().to_string(),
        })
    }

    /// Fetch one financial statement for `symbol`.
    ///
    /// Default implementation returns `NotSupported`.
    async fn get_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<FinancialStatement, MarketDataError> {
        let _ = (symbol, kind, frequency);
        Err(MarketDataError::NotSupported {
            operation: "statement".to_string(),
            provider: self.id().to_string(),
        })
    }
}
