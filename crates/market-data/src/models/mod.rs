//! Market data models
//!
//! This module contains the core data types for market data operations:
//! - `bar` - Daily OHLCV bars and the history ranges they are requested over
//! - `info` - Flat instrument info records (InstrumentInfo)
//! - `statement` - Financial statement periods and line items

mod bar;
mod info;
mod statement;

pub use bar::{Bar, HistoryRange};
pub use info::InstrumentInfo;
pub use statement::{FinancialStatement, Frequency, StatementKind, StatementPeriod};
