//! Yahoo Finance market data provider.
//!
//! This provider uses the Yahoo Finance API to fetch:
//! - Daily history for equities and FX pairs (e.g., RLX, CNYUSD=X)
//! - The quoteSummary info record (profile, valuation and financial data)
//! - Income, balance sheet and cash flow statements from the
//!   fundamentals-timeseries endpoint

mod models;

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::{header, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use urlencoding::encode;
use yahoo_finance_api as yahoo;

use crate::errors::MarketDataError;
use crate::models::{
    Bar, FinancialStatement, Frequency, HistoryRange, InstrumentInfo, StatementKind,
    StatementPeriod,
};
use crate::provider::MarketDataProvider;

use models::{
    YahooQuoteSummaryResponse, YahooTimeseriesPoint, YahooTimeseriesResponse,
};

const PROVIDER_ID: &str = "YAHOO";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// quoteSummary modules merged into one info record, in precedence order.
const INFO_MODULES: &[&str] = &[
    "price",
    "summaryProfile",
    "summaryDetail",
    "financialData",
    "defaultKeyStatistics",
];

/// Income statement line items requested from the timeseries endpoint.
pub const INCOME_ITEMS: &[&str] = &[
    "TotalRevenue",
    "GrossProfit",
    "OperatingIncome",
    "NetIncome",
    "EBIT",
    "InterestExpense",
    "DilutedEPS",
];

/// Balance sheet line items, including the alternative names Yahoo uses
/// for the same concept across filers.
pub const BALANCE_SHEET_ITEMS: &[&str] = &[
    "TotalAssets",
    "TotalLiabilitiesNetMinorityInterest",
    "StockholdersEquity",
    "TotalEquityGrossMinorityInterest",
    "TangibleBookValue",
    "CurrentDebt",
    "CurrentDebtAndCapitalLeaseObligation",
    "LongTermDebt",
    "LongTermDebtAndCapitalLeaseObligation",
    "TotalDebt",
    "CashCashEquivalentsAndShortTermInvestments",
    "CashAndCashEquivalents",
    "OrdinarySharesNumber",
];

/// Cash flow statement line items.
pub const CASH_FLOW_ITEMS: &[&str] = &["OperatingCashFlow", "CapitalExpenditure", "FreeCashFlow"];

/// Earliest period requested from the timeseries endpoint (1985-08-23).
const TIMESERIES_START: i64 = 493_590_046;

// ============================================================================
// Crumb/Cookie Authentication
// ============================================================================

/// Cached Yahoo authentication data
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

// ============================================================================
// Yahoo Provider
// ============================================================================

/// Yahoo Finance market data provider.
pub struct YahooProvider {
    connector: yahoo::YahooConnector,
    client: reqwest::Client,
    crumb: RwLock<Option<CrumbData>>,
}

impl YahooProvider {
    /// Default timeout applied to every quoteSummary/timeseries request.
    pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

    /// Create a new Yahoo Finance provider.
    pub async fn new() -> Result<Self, MarketDataError> {
        Self::with_timeout(Self::DEFAULT_HTTP_TIMEOUT).await
    }

    /// Create a provider whose HTTP requests give up after `timeout`.
    pub async fn with_timeout(timeout: Duration) -> Result<Self, MarketDataError> {
        let connector =
            yahoo::YahooConnector::new().map_err(|e| MarketDataError::ProviderError {
                provider: PROVIDER_ID.to_string(),
                message: format!("Failed to initialize Yahoo connector: {}", e),
            })?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            connector,
            client,
            crumb: RwLock::new(None),
        })
    }

    // ========================================================================
    // Crumb/Cookie Authentication
    // ========================================================================

    /// Ensure we have a valid Yahoo authentication crumb.
    async fn ensure_crumb(&self) -> Result<CrumbData, MarketDataError> {
        {
            let guard = self.crumb.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(crumb) = guard.as_ref() {
                return Ok(crumb.clone());
            }
        }

        self.fetch_crumb().await
    }

    /// Fetch a new Yahoo authentication crumb.
    async fn fetch_crumb(&self) -> Result<CrumbData, MarketDataError> {
        // Step 1: Get cookie from fc.yahoo.com
        let response = self
            .client
            .get("https://fc.yahoo.com")
            .send()
            .await
            .map_err(|e| request_error("Failed to get cookie", e))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| provider_error("Failed to parse Yahoo cookie"))?;

        // Step 2: Get crumb using cookie
        let crumb = self
            .client
            .get("https://query1.finance.yahoo.com/v1/test/getcrumb")
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| request_error("Failed to get crumb", e))?
            .text()
            .await
            .map_err(|e| request_error("Failed to read crumb", e))?;

        let crumb_data = CrumbData { cookie, crumb };

        let mut guard = self.crumb.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some(crumb_data.clone());

        Ok(crumb_data)
    }

    /// Clear the cached crumb (used when authentication fails)
    fn clear_crumb(&self) {
        let mut guard = self.crumb.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }

    /// GET an authenticated Yahoo endpoint and decode its JSON body.
    async fn get_authenticated<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        what: &str,
    ) -> Result<T, MarketDataError> {
        let crumb = self.ensure_crumb().await?;
        let separator = if url.contains('?') { '&' } else { '?' };
        let url = format!("{}{}crumb={}", url, separator, encode(&crumb.crumb));

        let response = self
            .client
            .get(&url)
            .header(header::COOKIE, &crumb.cookie)
            .send()
            .await
            .map_err(|e| request_error(&format!("{} request failed", what), e))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                self.clear_crumb();
                return Err(provider_error("Yahoo authentication expired"));
            }
            StatusCode::TOO_MANY_REQUESTS => {
                return Err(MarketDataError::RateLimited {
                    provider: PROVIDER_ID.to_string(),
                });
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| provider_error(&format!("Failed to parse {} response: {}", what, e)))
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Convert a Yahoo quote to a daily bar.
    fn yahoo_quote_to_bar(yahoo_quote: &yahoo::Quote) -> Result<Bar, MarketDataError> {
        let timestamp = Utc
            .timestamp_opt(yahoo_quote.timestamp as i64, 0)
            .single()
            .ok_or_else(|| MarketDataError::ValidationFailed {
                message: format!("Invalid timestamp: {}", yahoo_quote.timestamp),
            })?;

        Ok(Bar {
            timestamp,
            open: yahoo_quote.open,
            high: yahoo_quote.high,
            low: yahoo_quote.low,
            close: yahoo_quote.close,
            volume: yahoo_quote.volume,
        })
    }
}

// ============================================================================
// MarketDataProvider Implementation
// ============================================================================

#[async_trait]
impl MarketDataProvider for YahooProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn get_history(
        &self,
        symbol: &str,
        range: HistoryRange,
    ) -> Result<Vec<Bar>, MarketDataError> {
        debug!("Fetching {} history for {} from Yahoo", range.as_str(), symbol);

        let response = self
            .connector
            .get_quote_range(symbol, "1d", range.as_str())
            .await
            .map_err(|e| map_connector_error(symbol, e))?;

        match response.quotes() {
            Ok(yahoo_quotes) => {
                let bars: Vec<Bar> = yahoo_quotes
                    .iter()
                    .filter_map(|q| match Self::yahoo_quote_to_bar(q) {
                        Ok(bar) => Some(bar),
                        Err(e) => {
                            warn!("Skipping bar due to conversion error: {:?}", e);
                            None
                        }
                    })
                    .collect();

                if bars.is_empty() {
                    return Err(MarketDataError::NoData(symbol.to_string()));
                }

                Ok(bars)
            }
            Err(yahoo::YahooError::NoQuotes) => {
                warn!("No {} history returned for '{}'", range.as_str(), symbol);
                Err(MarketDataError::NoData(symbol.to_string()))
            }
            Err(e) => Err(provider_error(&e.to_string())),
        }
    }

    async fn get_info(&self, symbol: &str) -> Result<InstrumentInfo, MarketDataError> {
        debug!("Fetching info for {} from Yahoo", symbol);

        let url = format!(
            "https://query1.finance.yahoo.com/v10/finance/quoteSummary/{}?modules={}",
            encode(symbol),
            INFO_MODULES.join(",")
        );
        let data: YahooQuoteSummaryResponse = self.get_authenticated(&url, "quoteSummary").await?;

        if let Some(error) = data.quote_summary.error {
            debug!(
                "quoteSummary error for {}: {:?} {:?}",
                symbol, error.code, error.description
            );
        }

        let result = data
            .quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| MarketDataError::SymbolNotFound(symbol.to_string()))?;

        Ok(flatten_quote_summary(&result))
    }

    async fn get_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> Result<FinancialStatement, MarketDataError> {
        debug!("Fetching {:?} {:?} statement for {} from Yahoo", frequency, kind, symbol);

        let items = match kind {
            StatementKind::Income => INCOME_ITEMS,
            StatementKind::BalanceSheet => BALANCE_SHEET_ITEMS,
            StatementKind::CashFlow => CASH_FLOW_ITEMS,
        };
        let types = items
            .iter()
            .map(|item| format!("{}{}", frequency.yahoo_prefix(), item))
            .collect::<Vec<_>>()
            .join(",");

        let url = format!(
            "https://query2.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries/{symbol}?symbol={symbol}&type={types}&period1={start}&period2={end}",
            symbol = encode(symbol),
            types = types,
            start = TIMESERIES_START,
            end = Utc::now().timestamp(),
        );
        let data: YahooTimeseriesResponse = self.get_authenticated(&url, "timeseries").await?;

        Ok(timeseries_to_statement(data, frequency))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn provider_error(message: &str) -> MarketDataError {
    MarketDataError::ProviderError {
        provider: PROVIDER_ID.to_string(),
        message: message.to_string(),
    }
}

fn request_error(context: &str, e: reqwest::Error) -> MarketDataError {
    if e.is_timeout() {
        MarketDataError::Timeout {
            provider: PROVIDER_ID.to_string(),
        }
    } else {
        provider_error(&format!("{}: {}", context, e))
    }
}

fn map_connector_error(symbol: &str, e: yahoo::YahooError) -> MarketDataError {
    if matches!(e, yahoo::YahooError::NoQuotes | yahoo::YahooError::NoResult) {
        MarketDataError::SymbolNotFound(symbol.to_string())
    } else {
        provider_error(&e.to_string())
    }
}

/// Merge quoteSummary modules into one flat record.
///
/// `{"raw": x, "fmt": ".."}` objects collapse to `x`, empty objects and
/// nested structures are dropped, and the first module to supply a key wins.
fn flatten_quote_summary(result: &Map<String, Value>) -> InstrumentInfo {
    let mut fields: BTreeMap<String, Value> = BTreeMap::new();

    for module in INFO_MODULES {
        let Some(Value::Object(entries)) = result.get(*module) else {
            continue;
        };

        for (key, value) in entries {
            if key == "maxAge" || fields.contains_key(key) {
                continue;
            }
            let flat = match value {
                Value::Object(obj) => match obj.get("raw") {
                    Some(raw) if !raw.is_null() => raw.clone(),
                    _ => continue,
                },
                Value::Array(_) | Value::Null => continue,
                scalar => scalar.clone(),
            };
            fields.insert(key.clone(), flat);
        }
    }

    fields.into_iter().collect()
}

/// Pivot per-line-item timeseries into per-period statements.
fn timeseries_to_statement(
    response: YahooTimeseriesResponse,
    frequency: Frequency,
) -> FinancialStatement {
    let prefix = frequency.yahoo_prefix();
    let mut periods: BTreeMap<NaiveDate, StatementPeriod> = BTreeMap::new();

    for result in response.timeseries.result.unwrap_or_default() {
        let Some(key) = result.meta.kind.first() else {
            continue;
        };
        let Some(series) = result.series.get(key) else {
            continue;
        };
        let item = key.strip_prefix(prefix).unwrap_or(key);

        let points: Vec<Option<YahooTimeseriesPoint>> =
            match serde_json::from_value(series.clone()) {
                Ok(points) => points,
                Err(e) => {
                    warn!("Skipping malformed timeseries '{}': {}", key, e);
                    continue;
                }
            };

        for point in points.into_iter().flatten() {
            let Some(raw) = point.reported_value.and_then(|v| v.raw) else {
                continue;
            };
            let Ok(as_of) = NaiveDate::parse_from_str(&point.as_of_date, "%Y-%m-%d") else {
                continue;
            };
            periods
                .entry(as_of)
                .or_insert_with(|| StatementPeriod::new(as_of))
                .items
                .insert(item.to_string(), raw);
        }
    }

    FinancialStatement::from_periods(periods.into_values().collect())
}

// ============================================================================
// Tests
// ============================================================================
