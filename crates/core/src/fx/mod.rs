//! FX module - reporting currency detection and conversion to USD.

mod currency;
mod currency_info;
mod fallback;
mod fx_traits;
mod rate_converter;

pub use currency::{
    detect_financial_currency, needs_conversion, CurrencyCode, FINANCIAL_CURRENCY_FIELD,
};
pub use currency_info::CurrencyInfo;
pub use fallback::FallbackTable;
pub use fx_traits::{LiveRateSource, ProviderRateSource};
pub use rate_converter::{RateConverter, RateSource, ResolvedRate};
