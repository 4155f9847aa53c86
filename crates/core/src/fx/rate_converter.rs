use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;

use super::currency::CurrencyCode;
use super::fallback::FallbackTable;
use super::fx_traits::LiveRateSource;

/// Where a resolved rate came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateSource {
    /// Fetched from the live source.
    Live,
    /// Taken from the fallback table (or the 1.0 default).
    Fallback,
    /// No conversion needed; the code is USD.
    #[serde(rename = "none")]
    Identity,
}

impl RateSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Fallback => "fallback",
            Self::Identity => "none",
        }
    }
}

/// A USD rate together with its provenance.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    /// USD per one unit of the source currency
    pub rate: f64,
    pub source: RateSource,
}

impl ResolvedRate {
    pub fn identity() -> Self {
        Self {
            rate: 1.0,
            source: RateSource::Identity,
        }
    }

    /// `value` expressed in USD. Non-finite values pass through.
    pub fn apply(&self, value: f64) -> f64 {
        if self.source == RateSource::Identity {
            value
        } else {
            value * self.rate
        }
    }
}

type RateCell = Arc<OnceCell<ResolvedRate>>;

/// Resolves and applies `code -> USD` rates.
///
/// Rates are looked up live with a deadline, fall back to a static table on
/// any failure, and are cached for the lifetime of the converter (or until
/// [`clear_cache`](Self::clear_cache)). Fallback results are cached too, so
/// a failing live source is not retried for every value in a report.
///
/// Each code owns a `OnceCell`, so concurrent callers resolving the same
/// code share one live fetch.
pub struct RateConverter {
    source: Arc<dyn LiveRateSource>,
    fallback: FallbackTable,
    live_timeout: Duration,
    cache: Mutex<HashMap<CurrencyCode, RateCell>>,
}

impl RateConverter {
    pub const DEFAULT_LIVE_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(source: Arc<dyn LiveRateSource>, fallback: FallbackTable) -> Self {
        Self {
            source,
            fallback,
            live_timeout: Self::DEFAULT_LIVE_TIMEOUT,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Override the deadline for a single live lookup.
    pub fn with_live_timeout(mut self, live_timeout: Duration) -> Self {
        self.live_timeout = live_timeout;
        self
    }

    pub fn fallback_table(&self) -> &FallbackTable {
        &self.fallback
    }

    /// True iff `code` is not USD (case-insensitive).
    pub fn needs_conversion(&self, code: &str) -> bool {
        super::needs_conversion(code)
    }

    /// USD per one unit of `code`. Never fails.
    pub async fn resolve_rate(&self, code: &str) -> f64 {
        self.resolve(code).await.rate
    }

    /// Rate and provenance for `code`.
    ///
    /// USD short-circuits to the identity rate without touching the cache or
    /// the live source.
    pub async fn resolve(&self, code: &str) -> ResolvedRate {
        let code = CurrencyCode::new(code);
        if code.is_usd() {
            return ResolvedRate::identity();
        }

        let cell = self
            .lock_cache()
            .entry(code.clone())
            .or_default()
            .clone();

        *cell.get_or_init(|| self.fetch_or_fallback(&code)).await
    }

    /// `value` converted from `code` to USD.
    ///
    /// Returned unchanged for USD; otherwise multiplied by the resolved
    /// rate. Zero, negative and non-finite values are all accepted.
    pub async fn convert(&self, value: f64, code: &str) -> f64 {
        if !self.needs_conversion(code) {
            return value;
        }
        self.resolve(code).await.apply(value)
    }

    /// The cached resolution for `code`, if one has completed.
    pub fn cached(&self, code: &str) -> Option<ResolvedRate> {
        let code = CurrencyCode::new(code);
        self.lock_cache()
            .get(&code)
            .and_then(|cell| cell.get().copied())
    }

    /// Number of codes with a completed resolution.
    pub fn cached_len(&self) -> usize {
        self.lock_cache()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    /// Forget every cached rate so the next resolution goes live again.
    pub fn clear_cache(&self) {
        self.lock_cache().clear();
        log::info!("Exchange rate cache cleared");
    }

    fn lock_cache(&self) -> MutexGuard<'_, HashMap<CurrencyCode, RateCell>> {
        // The map holds no invariants a panicking holder could break.
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_or_fallback(&self, code: &CurrencyCode) -> ResolvedRate {
        let pair = code.usd_pair_symbol();

        match tokio::time::timeout(self.live_timeout, self.source.latest_rate(code)).await {
            Ok(Ok(rate)) if rate.is_finite() && rate > 0.0 => {
                log::info!("Live exchange rate for {}: {:.6}", code, rate);
                return ResolvedRate {
                    rate,
                    source: RateSource::Live,
                };
            }
            Ok(Ok(rate)) => {
                log::warn!("Unusable live rate {} for {}, using fallback", rate, pair);
            }
            Ok(Err(e)) => {
                log::warn!(
                    "Failed to fetch live exchange rate for {}: {}, using fallback",
                    code,
                    e
                );
            }
            Err(_) => {
                log::warn!(
                    "Live exchange rate for {} timed out after {:?}, using fallback",
                    code,
                    self.live_timeout
                );
            }
        }

        let rate = self.fallback.rate_for(code);
        if self.fallback.get(code).is_none() {
            log::warn!("No fallback rate for {}, treating as USD", code);
        }
        ResolvedRate {
            rate,
            source: RateSource::Fallback,
        }
    }
}
