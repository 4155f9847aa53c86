//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - A retry helper with exponential backoff for provider calls
//! - The Yahoo Finance provider

mod retry;
mod traits;

pub mod yahoo;

// Re-exports
pub use retry::{with_retry, RetryPolicy};
pub use traits::MarketDataProvider;
