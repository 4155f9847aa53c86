//! Fundamentals Core - currency normalization and report assembly.
//!
//! Builds company fundamentals reports on top of the
//! `fundamentals-market-data` provider crate. Monetary statement figures are
//! converted from the company's reporting currency to USD through a shared
//! [`RateConverter`], which prefers live rates and falls back to a static
//! table so a conversion never fails.
//!
//! # Modules
//!
//! - [`fx`] - Currency detection, USD rate resolution and `CurrencyInfo`
//! - [`report`] - Full and basic reports, batch fetching
//! - [`sanitize`] - NaN/Inf replacement before JSON output
//! - [`errors`] - Error types

pub mod errors;
pub mod fx;
pub mod report;
pub mod sanitize;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

pub use fx::{
    detect_financial_currency, needs_conversion, CurrencyCode, CurrencyInfo, FallbackTable,
    LiveRateSource, ProviderRateSource, RateConverter, RateSource, ResolvedRate,
};
pub use report::{ReportMode, ReportOptions, ReportService, StockReport, StockSummary, SymbolOutcome};
pub use sanitize::{sanitize, to_clean_json, NonFinitePolicy};
