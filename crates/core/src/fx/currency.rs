use std::fmt;

use fundamentals_market_data::InstrumentInfo;
use serde::{Deserialize, Serialize};

/// Info field carrying the currency financial statements are reported in.
pub const FINANCIAL_CURRENCY_FIELD: &str = "financialCurrency";

/// ISO 4217 currency code, stored trimmed and uppercase.
///
/// Input is case-insensitive. Blank input normalizes to `USD`, which keeps
/// the "absent means USD" rule in one place.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub const USD_CODE: &'static str = "USD";

    pub fn new(code: &str) -> Self {
        let code = code.trim();
        if code.is_empty() {
            Self::usd()
        } else {
            Self(code.to_ascii_uppercase())
        }
    }

    pub fn usd() -> Self {
        Self(Self::USD_CODE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_usd(&self) -> bool {
        self.0 == Self::USD_CODE
    }

    /// Yahoo ticker quoting this currency in USD, e.g. `CNYUSD=X`.
    pub fn usd_pair_symbol(&self) -> String {
        format!("{}{}=X", self.0, Self::USD_CODE)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for CurrencyCode {
    fn from(code: String) -> Self {
        Self::new(&code)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl AsRef<str> for CurrencyCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reporting currency of an instrument's financial statements.
///
/// Reads `financialCurrency`; a missing, empty or non-string field means
/// the statements are in USD, which is the common case.
pub fn detect_financial_currency(info: &InstrumentInfo) -> CurrencyCode {
    info.get_str(FINANCIAL_CURRENCY_FIELD)
        .map(CurrencyCode::new)
        .unwrap_or_else(CurrencyCode::usd)
}

/// True iff `code` is not USD (case-insensitive).
pub fn needs_conversion(code: &str) -> bool {
    !CurrencyCode::new(code).is_usd()
}
