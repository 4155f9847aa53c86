//! Fundamentals Market Data Crate
//!
//! This crate wraps the external market-data provider used to build
//! company fundamentals reports.
//!
//! # Overview
//!
//! - Daily price history for equities and FX pairs
//! - Instrument info records (profile, valuation ratios, reporting currency)
//! - Income, balance sheet and cash flow statements
//! - Retry with backoff for transient provider failures
//!
//! # Core Types
//!
//! - [`MarketDataProvider`] - The provider seam; [`YahooProvider`] implements it
//! - [`Bar`] / [`HistoryRange`] - Daily OHLCV history
//! - [`InstrumentInfo`] - Flat, leniently typed field record
//! - [`FinancialStatement`] - Statement periods, newest first
//! - [`MarketDataError`] - Errors with a [`RetryClass`](errors::RetryClass)

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};

// Re-export all public types from models
pub use models::{
    Bar, FinancialStatement, Frequency, HistoryRange, InstrumentInfo, StatementKind,
    StatementPeriod,
};

// Re-export provider types
pub use provider::yahoo::YahooProvider;
pub use provider::{with_retry, MarketDataProvider, RetryPolicy};
