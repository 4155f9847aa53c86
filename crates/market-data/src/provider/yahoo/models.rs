//! Yahoo Finance API response models.
//!
//! quoteSummary modules are kept as raw JSON maps and flattened by the
//! provider; the timeseries endpoint gets typed models for the parts we read.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// Main response wrapper for quoteSummary API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteSummaryResponse {
    pub quote_summary: YahooQuoteSummary,
}

/// Quote summary container. `result` is null when Yahoo reports an error.
#[derive(Debug, Deserialize)]
pub struct YahooQuoteSummary {
    #[serde(default)]
    pub result: Option<Vec<Map<String, Value>>>,
    #[serde(default)]
    pub error: Option<YahooApiError>,
}

#[derive(Debug, Deserialize)]
pub struct YahooApiError {
    pub code: Option<String>,
    pub description: Option<String>,
}

/// Wrapper for the fundamentals-timeseries API
#[derive(Debug, Deserialize)]
pub struct YahooTimeseriesResponse {
    pub timeseries: YahooTimeseries,
}

#[derive(Debug, Deserialize)]
pub struct YahooTimeseries {
    #[serde(default)]
    pub result: Option<Vec<YahooTimeseriesResult>>,
}

/// One requested line item. The data array sits under a key equal to
/// `meta.type[0]` (e.g. `annualTotalRevenue`), so it is captured by the
/// flattened map.
#[derive(Debug, Deserialize)]
pub struct YahooTimeseriesResult {
    pub meta: YahooTimeseriesMeta,
    #[serde(flatten)]
    pub series: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct YahooTimeseriesMeta {
    #[serde(rename = "type", default)]
    pub kind: Vec<String>,
}

/// A single reported value. Yahoo pads missing periods with `null`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooTimeseriesPoint {
    pub as_of_date: String,
    pub reported_value: Option<YahooRawValue>,
}

/// Value with raw and formatted forms
#[derive(Debug, Deserialize, Clone)]
pub struct YahooRawValue {
    pub raw: Option<f64>,
}
