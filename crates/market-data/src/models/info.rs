use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat record of named instrument fields as supplied by the provider.
///
/// Keys follow Yahoo's camelCase field names (`longName`, `trailingPE`,
/// `financialCurrency`, ...). Values are kept as JSON so callers decide how
/// strictly to interpret them; the typed getters are lenient and return
/// `None` for anything that does not fit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentInfo {
    fields: BTreeMap<String, Value>,
}

impl InstrumentInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy in tests and stubs.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// String value of a field. Empty strings count as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    /// Numeric value of a field. Numeric strings are accepted.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Numeric value of a field, `0.0` when absent.
    pub fn f64_or_zero(&self, key: &str) -> f64 {
        self.get_f64(key).unwrap_or(0.0)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, Value)> for InstrumentInfo {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}
