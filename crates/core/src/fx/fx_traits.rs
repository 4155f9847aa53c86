use std::sync::Arc;

use async_trait::async_trait;
use fundamentals_market_data::{HistoryRange, MarketDataError, MarketDataProvider};

use super::currency::CurrencyCode;

/// Source of live `code -> USD` rates.
///
/// Implementations may be slow or hang; the converter applies its own
/// deadline and treats every error as "use the fallback".
#[async_trait]
pub trait LiveRateSource: Send + Sync {
    /// USD per one unit of `code`.
    async fn latest_rate(&self, code: &CurrencyCode) -> Result<f64, MarketDataError>;
}

/// Live rates read from a market data provider.
///
/// Asks for the one-day history of `{CODE}USD=X` and uses the most recent
/// close.
pub struct ProviderRateSource {
    provider: Arc<dyn MarketDataProvider>,
}

impl ProviderRateSource {
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl LiveRateSource for ProviderRateSource {
    async fn latest_rate(&self, code: &CurrencyCode) -> Result<f64, MarketDataError> {
        let pair = code.usd_pair_symbol();
        let bars = self
            .provider
            .get_history(&pair, HistoryRange::OneDay)
            .await?;

        bars.last()
            .map(|bar| bar.close)
            .ok_or(MarketDataError::NoData(pair))
    }
}
