use std::collections::BTreeMap;
use std::sync::Arc;

use fundamentals_core::{
    to_clean_json, FallbackTable, NonFinitePolicy, ProviderRateSource, RateConverter, ReportMode,
    ReportService, SymbolOutcome,
};
use fundamentals_market_data::{MarketDataError, MarketDataProvider, YahooProvider};
use serde_json::{json, Value};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

/// Logs go to stderr; stdout is reserved for the JSON payload.
pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

pub async fn build_service(config: &Config) -> anyhow::Result<ReportService> {
    let provider: Arc<dyn MarketDataProvider> =
        Arc::new(YahooProvider::with_timeout(config.http_timeout).await?);
    tracing::info!("Market data provider: {}", provider.id());

    let converter = RateConverter::new(
        Arc::new(ProviderRateSource::new(provider.clone())),
        FallbackTable::default(),
    )
    .with_live_timeout(config.rate_timeout);

    Ok(ReportService::new(provider, Arc::new(converter)).with_options(config.report_options()))
}

/// What the positional argument asks for.
#[derive(Debug, PartialEq, Eq)]
pub enum SymbolRequest {
    Single(String),
    Batch(Vec<String>),
}

impl SymbolRequest {
    /// A comma anywhere means batch mode. Symbols are trimmed and uppercased;
    /// `None` when nothing usable is left.
    pub fn parse(arg: &str) -> Option<Self> {
        if arg.contains(',') {
            let symbols: Vec<String> = arg
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            (!symbols.is_empty()).then_some(Self::Batch(symbols))
        } else {
            let symbol = arg.trim().to_uppercase();
            (!symbol.is_empty()).then_some(Self::Single(symbol))
        }
    }
}

/// Fetch what `request` asks for and render it as sanitized JSON.
pub async fn run_request(
    service: &ReportService,
    request: &SymbolRequest,
    mode: ReportMode,
    policy: NonFinitePolicy,
) -> anyhow::Result<Value> {
    let json = match request {
        SymbolRequest::Single(symbol) => {
            tracing::debug!("Processing single: {}", symbol);
            let outcome = service.fetch_outcome(symbol, mode).await;
            single_payload(symbol, outcome, mode, policy)?
        }
        SymbolRequest::Batch(symbols) => {
            tracing::debug!("Processing batch: {:?}", symbols);
            to_clean_json(&service.fetch_batch(symbols, mode).await, policy)?
        }
    };
    Ok(json)
}

/// A full report prints bare; a basic summary is keyed by its symbol, the
/// same shape as a one-symbol batch.
pub fn single_payload(
    symbol: &str,
    outcome: SymbolOutcome,
    mode: ReportMode,
    policy: NonFinitePolicy,
) -> fundamentals_core::Result<Value> {
    match mode {
        ReportMode::Full => to_clean_json(&outcome, policy),
        ReportMode::Basic => to_clean_json(&BTreeMap::from([(symbol, outcome)]), policy),
    }
}

pub fn symbol_required() -> Value {
    json!({ "error": "Symbol required" })
}

/// Payload printed for errors that abort the whole run.
pub fn fatal_payload(err: &anyhow::Error) -> Value {
    let kind = if let Some(core) = err.downcast_ref::<fundamentals_core::Error>() {
        core.kind()
    } else if err.downcast_ref::<MarketDataError>().is_some() {
        "MarketDataError"
    } else if err.downcast_ref::<serde_json::Error>().is_some() {
        "SerializationError"
    } else {
        "Error"
    };
    json!({ "error": err.to_string(), "type": kind })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fundamentals_core::report::{StockSummary, SummaryPrice, SummaryProfile, SummaryRatios};

    #[test]
    fn test_single_symbol_is_uppercased() {
        assert_eq!(
            SymbolRequest::parse(" aapl "),
            Some(SymbolRequest::Single("AAPL".to_string()))
        );
    }

    #[test]
    fn test_comma_means_batch() {
        assert_eq!(
            SymbolRequest::parse("aapl, msft,,baba"),
            Some(SymbolRequest::Batch(vec![
                "AAPL".to_string(),
                "MSFT".to_string(),
                "BABA".to_string()
            ]))
        );
        assert_eq!(
            SymbolRequest::parse("tsla,"),
            Some(SymbolRequest::Batch(vec!["TSLA".to_string()]))
        );
    }

    #[test]
    fn test_blank_requests() {
        assert_eq!(SymbolRequest::parse(""), None);
        assert_eq!(SymbolRequest::parse("  "), None);
        assert_eq!(SymbolRequest::parse(" , "), None);
    }

    fn summary(symbol: &str) -> SymbolOutcome {
        SymbolOutcome::Summary(Box::new(StockSummary {
            symbol: symbol.to_string(),
            price: SummaryPrice {
                current: 42.0,
                timestamp: Utc::now(),
            },
            profile: SummaryProfile {
                company_name: "Relax Corp".to_string(),
                sector: "Technology".to_string(),
                market_cap: f64::NAN,
            },
            ratios: SummaryRatios::default(),
        }))
    }

    #[test]
    fn test_basic_single_payload_is_keyed_by_symbol() {
        let payload = single_payload(
            "RLX",
            summary("RLX"),
            ReportMode::Basic,
            NonFinitePolicy::Zero,
        )
        .unwrap();

        let object = payload.as_object().unwrap();
        assert_eq!(object.keys().collect::<Vec<_>>(), vec!["RLX"]);
        assert_eq!(payload["RLX"]["symbol"], "RLX");
        assert_eq!(payload["RLX"]["price"]["current"], json!(42.0));
        assert_eq!(payload["RLX"]["profile"]["marketCap"], json!(0));
    }

    #[test]
    fn test_basic_single_failure_is_keyed_by_symbol() {
        let outcome = SymbolOutcome::failed("NOPE", "Timeout fetching data");

        let payload =
            single_payload("NOPE", outcome, ReportMode::Basic, NonFinitePolicy::Null).unwrap();

        assert_eq!(
            payload,
            json!({"NOPE": {"error": "Timeout fetching data", "symbol": "NOPE"}})
        );
    }

    #[test]
    fn test_full_single_payload_is_bare() {
        let outcome = SymbolOutcome::failed("NOPE", "Timeout fetching data");

        let payload =
            single_payload("NOPE", outcome, ReportMode::Full, NonFinitePolicy::Zero).unwrap();

        assert_eq!(
            payload,
            json!({"error": "Timeout fetching data", "symbol": "NOPE"})
        );
    }

    #[test]
    fn test_fatal_payload_type() {
        let err = anyhow::Error::new(MarketDataError::RateLimited {
            provider: "YAHOO".to_string(),
        });
        assert_eq!(fatal_payload(&err)["type"], "MarketDataError");

        let err = anyhow::anyhow!("boom");
        assert_eq!(fatal_payload(&err), json!({"error": "boom", "type": "Error"}));
    }
}
