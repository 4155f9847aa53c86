use serde::{Deserialize, Serialize};

use super::currency::CurrencyCode;
use super::rate_converter::{RateConverter, RateSource};

/// How the monetary figures of a response relate to USD.
///
/// A snapshot: later cache changes do not alter a descriptor that was
/// already built.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyInfo {
    /// `"USD"`, or e.g. `"CNY (converted to USD)"`
    pub reporting_currency: String,
    pub conversion_applied: bool,
    pub conversion_rate: f64,
    pub rate_source: RateSource,
}

impl CurrencyInfo {
    /// Describe `code` using the converter's current view of its rate.
    ///
    /// Resolves the rate if it is not cached yet.
    pub async fn for_currency(converter: &RateConverter, code: &str) -> Self {
        let code = CurrencyCode::new(code);
        let resolved = converter.resolve(code.as_str()).await;
        let conversion_applied = converter.needs_conversion(code.as_str());

        let reporting_currency = if conversion_applied {
            format!("{} (converted to USD)", code)
        } else {
            code.to_string()
        };

        Self {
            reporting_currency,
            conversion_applied,
            conversion_rate: resolved.rate,
            rate_source: resolved.source,
        }
    }

    /// Descriptor for figures already in USD.
    pub fn usd() -> Self {
        Self {
            reporting_currency: CurrencyCode::USD_CODE.to_string(),
            conversion_applied: false,
            conversion_rate: 1.0,
            rate_source: RateSource::Identity,
        }
    }
}

impl Default for CurrencyInfo {
    fn default() -> Self {
        Self::usd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::{FallbackTable, LiveRateSource};
    use async_trait::async_trait;
    use fundamentals_market_data::MarketDataError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Fails until `healthy` is set, then serves a fixed rate.
    struct FlakySource {
        healthy: AtomicBool,
    }

    #[async_trait]
    impl LiveRateSource for FlakySource {
        async fn latest_rate(&self, code: &CurrencyCode) -> Result<f64, MarketDataError> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(0.1388)
            } else {
                Err(MarketDataError::NoData(code.usd_pair_symbol()))
            }
        }
    }

    fn setup() -> (Arc<FlakySource>, RateConverter) {
        let source = Arc::new(FlakySource {
            healthy: AtomicBool::new(false),
        });
        let converter = RateConverter::new(source.clone(), FallbackTable::default());
        (source, converter)
    }

    #[tokio::test]
    async fn test_usd_descriptor() {
        let (_, converter) = setup();

        let info = CurrencyInfo::for_currency(&converter, "usd").await;

        assert_eq!(info, CurrencyInfo::usd());
        assert_eq!(info.reporting_currency, "USD");
        assert_eq!(info.rate_source, RateSource::Identity);
    }

    #[tokio::test]
    async fn test_cny_with_failing_source_reports_fallback() {
        let (_, converter) = setup();

        let info = CurrencyInfo::for_currency(&converter, "cny").await;

        assert_eq!(info.reporting_currency, "CNY (converted to USD)");
        assert!(info.conversion_applied);
        assert_eq!(info.conversion_rate, 1.0 / 7.0);
        assert_eq!(info.rate_source, RateSource::Fallback);
    }

    #[tokio::test]
    async fn test_descriptors_are_snapshots() {
        let (source, converter) = setup();

        let before = CurrencyInfo::for_currency(&converter, "CNY").await;

        source.healthy.store(true, Ordering::SeqCst);
        converter.clear_cache();
        let after = CurrencyInfo::for_currency(&converter, "CNY").await;

        assert_eq!(before.rate_source, RateSource::Fallback);
        assert_eq!(after.rate_source, RateSource::Live);
        assert_eq!(after.conversion_rate, 0.1388);
        assert_eq!(before.conversion_rate, 1.0 / 7.0);
    }

    #[test]
    fn test_serialized_shape() {
        let info = CurrencyInfo {
            reporting_currency: "JPY (converted to USD)".to_string(),
            conversion_applied: true,
            conversion_rate: 0.0067,
            rate_source: RateSource::Live,
        };

        let json = serde_json::to_value(&info).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "reportingCurrency": "JPY (converted to USD)",
                "conversionApplied": true,
                "conversionRate": 0.0067,
                "rateSource": "live"
            })
        );
    }
}
