use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, Utc};
use fundamentals_market_data::{
    with_retry, Bar, FinancialStatement, Frequency, HistoryRange, InstrumentInfo,
    MarketDataProvider, RetryPolicy, StatementKind,
};
use log::{debug, info, warn};

use super::model::{
    CompanyProfile, PriceSnapshot, ReportMode, StockReport, StockSummary, SummaryPrice,
    SummaryProfile, SymbolOutcome,
};
use super::{ratios, statements};
use crate::errors::{Error, Result};
use crate::fx::{detect_financial_currency, CurrencyInfo, RateConverter, ResolvedRate};

const BILLION: f64 = 1e9;

/// Tunables for report generation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    /// Upper bound on fetching and assembling one symbol
    pub symbol_timeout: Duration,
    /// Retry policy for the info request
    pub retry: RetryPolicy,
}

impl ReportOptions {
    pub const DEFAULT_SYMBOL_TIMEOUT: Duration = Duration::from_secs(20);
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            symbol_timeout: Self::DEFAULT_SYMBOL_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// Raw provider data for one symbol. Only `info` is mandatory.
struct FetchedData {
    info: InstrumentInfo,
    bars: Vec<Bar>,
    income: FinancialStatement,
    quarterly_income: FinancialStatement,
    cash_flow: FinancialStatement,
    quarterly_cash_flow: FinancialStatement,
    balance_sheet: FinancialStatement,
}

/// Builds fundamentals reports from a market data provider.
///
/// Statement figures are converted to USD with the shared [`RateConverter`],
/// so every report produced by one service sees the same cached rates.
pub struct ReportService {
    provider: Arc<dyn MarketDataProvider>,
    converter: Arc<RateConverter>,
    options: ReportOptions,
}

impl ReportService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, converter: Arc<RateConverter>) -> Self {
        Self {
            provider,
            converter,
            options: ReportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReportOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ReportOptions {
        &self.options
    }

    pub fn converter(&self) -> &RateConverter {
        &self.converter
    }

    /// Full report for `symbol`.
    ///
    /// Fails only when the info record cannot be fetched; history and
    /// statements degrade to empty with a warning.
    pub async fn fetch_report(&self, symbol: &str) -> Result<StockReport> {
        let data = self.fetch_all(symbol).await?;

        let currency = detect_financial_currency(&data.info);
        let currency_info = CurrencyInfo::for_currency(&self.converter, currency.as_str()).await;
        let rate = ResolvedRate {
            rate: currency_info.conversion_rate,
            source: currency_info.rate_source,
        };
        debug!(
            "Reporting {} in {} (rate {} from {})",
            symbol,
            currency,
            rate.rate,
            rate.source.as_str()
        );

        let interest_coverage = ratios::interest_coverage(&data.income);
        let stock_ratios = ratios::compute_ratios(&data.info, interest_coverage);
        let data_quality_flags = ratios::quality_flags(&data.info, &stock_ratios);

        let mut financials: Vec<_> = statements::ttm_row(
            &data.quarterly_income,
            &data.quarterly_cash_flow,
            data.info.f64_or_zero("trailingEps"),
            Utc::now().year(),
            &rate,
        )
        .into_iter()
        .collect();
        financials.extend(statements::annual_rows(&data.income, &data.cash_flow, &rate));

        Ok(StockReport {
            symbol: symbol.to_string(),
            price: price_snapshot(&data.bars, &data.info),
            profile: company_profile(symbol, &data.info),
            ratios: stock_ratios,
            data_quality_flags,
            financials,
            quarterly_financials: statements::quarterly_rows(
                &data.quarterly_income,
                &data.quarterly_cash_flow,
                &rate,
            ),
            balance_sheet: statements::balance_sheet_summary(&data.balance_sheet, &rate),
            currency_info,
        })
    }

    /// Price, profile and headline ratios only. No statements, no FX.
    pub async fn fetch_summary(&self, symbol: &str) -> Result<StockSummary> {
        let (info, bars) = tokio::join!(
            self.fetch_info(symbol),
            self.optional_history(symbol, HistoryRange::FiveDays)
        );
        let info = info?;

        let current = bars
            .last()
            .map(|bar| bar.close)
            .or_else(|| info.get_f64("currentPrice"))
            .unwrap_or(0.0);

        Ok(StockSummary {
            symbol: symbol.to_string(),
            price: SummaryPrice {
                current,
                timestamp: Utc::now(),
            },
            profile: SummaryProfile {
                company_name: company_name(symbol, &info),
                sector: text_or(&info, "sector", "Unknown"),
                market_cap: info.f64_or_zero("marketCap"),
            },
            ratios: ratios::summary_ratios(&info),
        })
    }

    /// Report for `symbol` in the requested mode, bounded by the symbol
    /// timeout.
    pub async fn fetch(&self, symbol: &str, mode: ReportMode) -> Result<SymbolOutcome> {
        let work = async {
            Ok::<_, Error>(match mode {
                ReportMode::Full => {
                    SymbolOutcome::Report(Box::new(self.fetch_report(symbol).await?))
                }
                ReportMode::Basic => {
                    SymbolOutcome::Summary(Box::new(self.fetch_summary(symbol).await?))
                }
            })
        };

        tokio::time::timeout(self.options.symbol_timeout, work)
            .await
            .map_err(|_| Error::Timeout {
                symbol: symbol.to_string(),
            })?
    }

    /// Like [`fetch`](Self::fetch), with failures folded into the outcome.
    pub async fn fetch_outcome(&self, symbol: &str, mode: ReportMode) -> SymbolOutcome {
        match self.fetch(symbol, mode).await {
            Ok(outcome) => outcome,
            Err(Error::Timeout { .. }) => {
                warn!("Timeout fetching data for {}", symbol);
                SymbolOutcome::failed(symbol, "Timeout fetching data")
            }
            Err(e) => {
                warn!("Error fetching data for {}: {}", symbol, e);
                SymbolOutcome::failed(symbol, e.to_string())
            }
        }
    }

    /// Fetch each symbol in turn. A failing symbol yields an error entry and
    /// does not affect the others.
    pub async fn fetch_batch(
        &self,
        symbols: &[String],
        mode: ReportMode,
    ) -> BTreeMap<String, SymbolOutcome> {
        info!("Processing batch of {} symbol(s)", symbols.len());
        let mut results = BTreeMap::new();
        for symbol in symbols {
            let outcome = self.fetch_outcome(symbol, mode).await;
            results.insert(symbol.clone(), outcome);
        }
        results
    }

    async fn fetch_all(&self, symbol: &str) -> Result<FetchedData> {
        let (
            info,
            bars,
            income,
            quarterly_income,
            cash_flow,
            quarterly_cash_flow,
            balance_sheet,
        ) = tokio::join!(
            self.fetch_info(symbol),
            self.optional_history(symbol, HistoryRange::OneYear),
            self.optional_statement(symbol, StatementKind::Income, Frequency::Annual),
            self.optional_statement(symbol, StatementKind::Income, Frequency::Quarterly),
            self.optional_statement(symbol, StatementKind::CashFlow, Frequency::Annual),
            self.optional_statement(symbol, StatementKind::CashFlow, Frequency::Quarterly),
            self.optional_statement(symbol, StatementKind::BalanceSheet, Frequency::Annual),
        );

        Ok(FetchedData {
            info: info?,
            bars,
            income,
            quarterly_income,
            cash_flow,
            quarterly_cash_flow,
            balance_sheet,
        })
    }

    async fn fetch_info(&self, symbol: &str) -> Result<InstrumentInfo> {
        let info = with_retry(&self.options.retry, || self.provider.get_info(symbol)).await?;
        Ok(info)
    }

    async fn optional_history(&self, symbol: &str, range: HistoryRange) -> Vec<Bar> {
        match self.provider.get_history(symbol, range).await {
            Ok(bars) => bars,
            Err(e) => {
                warn!("No price history for {}: {}", symbol, e);
                Vec::new()
            }
        }
    }

    async fn optional_statement(
        &self,
        symbol: &str,
        kind: StatementKind,
        frequency: Frequency,
    ) -> FinancialStatement {
        match self.provider.get_statement(symbol, kind, frequency).await {
            Ok(statement) => statement,
            Err(e) => {
                warn!(
                    "No {:?} {:?} statement for {}: {}",
                    frequency, kind, symbol, e
                );
                FinancialStatement::default()
            }
        }
    }
}

fn text_or(info: &InstrumentInfo, key: &str, default: &str) -> String {
    info.get_str(key).unwrap_or(default).to_string()
}

fn company_name(symbol: &str, info: &InstrumentInfo) -> String {
    info.get_str("longName")
        .or_else(|| info.get_str("shortName"))
        .unwrap_or(symbol)
        .to_string()
}

/// Latest price from daily bars, falling back to the info record.
fn price_snapshot(bars: &[Bar], info: &InstrumentInfo) -> PriceSnapshot {
    let latest = bars.last();
    let current = latest
        .map(|bar| bar.close)
        .or_else(|| info.get_f64("currentPrice"))
        .unwrap_or(0.0);
    let previous_close = match bars {
        [.., previous, _] => previous.close,
        _ => info.f64_or_zero("previousClose"),
    };

    let (change, change_percent) = if previous_close > 0.0 {
        let change = current - previous_close;
        (change, change / previous_close * 100.0)
    } else {
        (0.0, 0.0)
    };

    PriceSnapshot {
        current,
        open: latest.map_or(current, |bar| bar.open),
        high: latest.map_or(current, |bar| bar.high),
        low: latest.map_or(current, |bar| bar.low),
        close: current,
        volume: latest.map_or(0, |bar| bar.volume),
        previous_close,
        change,
        change_percent,
        timestamp: Utc::now(),
    }
}

fn company_profile(symbol: &str, info: &InstrumentInfo) -> CompanyProfile {
    CompanyProfile {
        company_name: company_name(symbol, info),
        sector: text_or(info, "sector", "Unknown"),
        industry: text_or(info, "industry", "Unknown"),
        description: text_or(info, "longBusinessSummary", ""),
        employees: info.get_u64("fullTimeEmployees").unwrap_or(0),
        website: text_or(info, "website", ""),
        market_cap: info.f64_or_zero("marketCap"),
        diluted_shares_outstanding: info.f64_or_zero("sharesOutstanding") / BILLION,
    }
}
