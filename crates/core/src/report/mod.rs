//! Fundamentals report assembly.
//!
//! [`ReportService`] pulls the info record, price history and statements for
//! a symbol from a [`MarketDataProvider`](fundamentals_market_data::MarketDataProvider)
//! and turns them into a [`StockReport`] with figures converted to USD.

mod model;
mod ratios;
mod service;
mod statements;

pub use model::{
    BalanceSheetSummary, CompanyProfile, DataQualityFlags, PeriodFinancials, PriceSnapshot,
    Ratios, ReportMode, StockReport, StockSummary, SummaryPrice, SummaryProfile,
    SummaryRatios, SymbolOutcome,
};
pub use service::{ReportOptions, ReportService};
