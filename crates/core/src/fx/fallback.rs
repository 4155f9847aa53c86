use std::collections::HashMap;

use super::currency::CurrencyCode;

/// Approximate USD value of one unit of each currency, used only when a
/// live rate cannot be fetched.
const DEFAULT_RATES: &[(&str, f64)] = &[
    ("CNY", 1.0 / 7.0),
    ("HKD", 1.0 / 7.8),
    ("JPY", 1.0 / 150.0),
    ("EUR", 1.1),
    ("GBP", 1.27),
    ("INR", 1.0 / 83.0),
    ("SGD", 1.0 / 1.35),
    ("AUD", 1.0 / 1.55),
    ("CAD", 1.0 / 1.38),
    ("CHF", 1.1),
    ("SEK", 1.0 / 10.5),
    ("NZD", 1.0 / 1.75),
    ("MXN", 1.0 / 17.0),
    ("BRL", 1.0 / 5.0),
    ("ZAR", 1.0 / 18.0),
];

/// Static rates consulted when the live source fails.
///
/// Codes missing from the table resolve to 1.0, i.e. they are treated as
/// if already in USD.
#[derive(Clone, Debug, PartialEq)]
pub struct FallbackTable {
    rates: HashMap<CurrencyCode, f64>,
}

impl FallbackTable {
    pub const UNKNOWN_RATE: f64 = 1.0;

    /// An empty table: every code falls back to 1.0.
    pub fn empty() -> Self {
        Self {
            rates: HashMap::new(),
        }
    }

    pub fn with_rate(mut self, code: &str, rate: f64) -> Self {
        self.rates.insert(CurrencyCode::new(code), rate);
        self
    }

    pub fn get(&self, code: &CurrencyCode) -> Option<f64> {
        self.rates.get(code).copied()
    }

    /// Table rate for `code`, or 1.0 if the table does not know it.
    pub fn rate_for(&self, code: &CurrencyCode) -> f64 {
        self.get(code).unwrap_or(Self::UNKNOWN_RATE)
    }

    /// Every code in the table with its rate, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&CurrencyCode, f64)> + '_ {
        self.rates.iter().map(|(code, rate)| (code, *rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}

impl Default for FallbackTable {
    fn default() -> Self {
        DEFAULT_RATES
            .iter()
            .fold(Self::empty(), |table, (code, rate)| table.with_rate(code, *rate))
    }
}
