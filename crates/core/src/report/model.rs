use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fx::CurrencyInfo;

/// Full fundamentals report for one symbol.
///
/// Statement figures (`financials`, `quarterlyFinancials`, `balanceSheet`)
/// are in billions of USD; see `currencyInfo` for how they were converted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockReport {
    pub symbol: String,
    pub price: PriceSnapshot,
    pub profile: CompanyProfile,
    pub ratios: Ratios,
    pub data_quality_flags: DataQualityFlags,
    pub financials: Vec<PeriodFinancials>,
    pub quarterly_financials: Vec<PeriodFinancials>,
    pub balance_sheet: BalanceSheetSummary,
    pub currency_info: CurrencyInfo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSnapshot {
    pub current: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyProfile {
    pub company_name: String,
    pub sector: String,
    pub industry: String,
    pub description: String,
    pub employees: u64,
    pub website: String,
    pub market_cap: f64,
    /// Shares outstanding, in billions
    pub diluted_shares_outstanding: f64,
}

/// Valuation and profitability ratios.
///
/// Return and margin fields are percentages; growth fields are fractions as
/// reported.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ratios {
    pub pe: f64,
    pub pb: f64,
    pub ps: f64,
    pub current_ratio: f64,
    pub debt_to_equity: f64,
    pub interest_coverage: f64,
    pub roe: f64,
    pub roic: f64,
    pub roa: f64,
    pub gross_margin: f64,
    pub operating_margin: f64,
    pub net_margin: f64,
    pub dividend_yield: f64,
    pub revenue_growth: f64,
    pub earnings_growth: f64,
}

/// Heuristics marking ratios that are likely wrong or missing upstream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQualityFlags {
    pub debt_to_equity_anomalous: bool,
    pub roic_zero: bool,
    pub interest_coverage_zero: bool,
    pub pe_negative: bool,
    pub market_cap_zero: bool,
    pub pb_anomalous: bool,
    pub pe_anomalous: bool,
    pub roe_negative: bool,
    pub current_ratio_anomalous: bool,
}

/// One row of the income/cash flow summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodFinancials {
    /// `TTM` or the period end date (`YYYY-MM-DD`)
    pub period: String,
    /// `Q1`..`Q4`, quarterly rows only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quarter: Option<String>,
    pub fiscal_year: i32,
    pub revenue: f64,
    pub net_income: f64,
    pub eps: f64,
    pub operating_income: f64,
    pub free_cash_flow: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetSummary {
    pub total_assets: f64,
    pub total_liabilities: f64,
    pub total_equity: f64,
    pub book_value_per_share: f64,
    pub tangible_book_value_per_share: f64,
    pub total_debt: f64,
    pub cash: f64,
}

/// Price, profile and ratio subset returned in basic mode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockSummary {
    pub symbol: String,
    pub price: SummaryPrice,
    pub profile: SummaryProfile,
    pub ratios: SummaryRatios,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryPrice {
    pub current: f64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryProfile {
    pub company_name: String,
    pub sector: String,
    pub market_cap: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRatios {
    pub pe: f64,
    pub pb: f64,
    pub ps: f64,
    pub roe: f64,
    pub roa: f64,
    pub dividend_yield: f64,
}

/// Which report to build per symbol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    #[default]
    Full,
    Basic,
}

/// Result for one symbol of a batch. Failures are data, not errors, so one
/// bad ticker does not sink the batch.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SymbolOutcome {
    Report(Box<StockReport>),
    Summary(Box<StockSummary>),
    Failed { error: String, symbol: String },
}

impl SymbolOutcome {
    pub fn failed(symbol: &str, error: impl Into<String>) -> Self {
        Self::Failed {
            error: error.into(),
            symbol: symbol.to_string(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
