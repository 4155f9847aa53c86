//! Replacement of NaN and infinite floats before JSON emission.
//!
//! Provider data routinely contains NaN (missing statement cells) and
//! infinities (ratios over zero). `serde_json` would silently turn them into
//! `null`; callers instead pick a [`NonFinitePolicy`] and run the payload
//! through [`sanitize`] once, at the response boundary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_value::Value;

use crate::errors::{Error, Result};

/// What a non-finite float becomes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonFinitePolicy {
    /// Integer `0`
    #[default]
    Zero,
    /// JSON `null`
    Null,
}

impl NonFinitePolicy {
    fn placeholder(self) -> Value {
        match self {
            Self::Zero => Value::I64(0),
            Self::Null => Value::Unit,
        }
    }
}

impl FromStr for NonFinitePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero" | "0" => Ok(Self::Zero),
            "null" | "none" => Ok(Self::Null),
            other => Err(Error::InvalidConfigValue(format!(
                "unknown NaN policy '{}', expected 'zero' or 'null'",
                other
            ))),
        }
    }
}

/// Replace every NaN/±Inf in `value`, at any depth, with the policy's
/// placeholder. Everything else is returned as is.
pub fn sanitize(value: Value, policy: NonFinitePolicy) -> Value {
    match value {
        Value::F64(f) if !f.is_finite() => policy.placeholder(),
        Value::F32(f) if !f.is_finite() => policy.placeholder(),
        Value::Seq(items) => Value::Seq(
            items
                .into_iter()
                .map(|item| sanitize(item, policy))
                .collect(),
        ),
        Value::Map(entries) => Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, sanitize(v, policy)))
                .collect(),
        ),
        Value::Option(Some(inner)) => Value::Option(Some(Box::new(sanitize(*inner, policy)))),
        Value::Newtype(inner) => Value::Newtype(Box::new(sanitize(*inner, policy))),
        other => other,
    }
}

/// Serialize `data`, sanitize it, and hand back a JSON tree ready to print.
pub fn to_clean_json<T: Serialize + ?Sized>(
    data: &T,
    policy: NonFinitePolicy,
) -> Result<serde_json::Value> {
    let raw = serde_value::to_value(data).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(serde_json::to_value(sanitize(raw, policy))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (Value::String(k.to_string()), v))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    fn example() -> Value {
        map(vec![
            ("a", Value::F64(f64::NAN)),
            (
                "b",
                Value::Seq(vec![
                    Value::F64(f64::INFINITY),
                    Value::F64(f64::NEG_INFINITY),
                    Value::F64(3.0),
                ]),
            ),
            ("c", map(vec![("d", Value::F64(f64::NAN))])),
        ])
    }

    #[test]
    fn test_zero_policy_replaces_at_every_depth() {
        let clean = sanitize(example(), NonFinitePolicy::Zero);
        let json = serde_json::to_value(clean).unwrap();

        assert_eq!(json, json!({"a": 0, "b": [0, 0, 3.0], "c": {"d": 0}}));
    }

    #[test]
    fn test_null_policy() {
        let clean = sanitize(example(), NonFinitePolicy::Null);
        let json = serde_json::to_value(clean).unwrap();

        assert_eq!(
            json,
            json!({"a": null, "b": [null, null, 3.0], "c": {"d": null}})
        );
    }

    #[test]
    fn test_non_float_leaves_are_untouched() {
        let value = map(vec![
            ("name", Value::String("RLX".to_string())),
            ("employees", Value::U64(5000)),
            ("delta", Value::I32(-3)),
            ("flag", Value::Bool(true)),
            ("price", Value::F32(1.5)),
            ("missing", Value::Option(None)),
        ]);

        assert_eq!(sanitize(value.clone(), NonFinitePolicy::Zero), value);
    }

    #[test]
    fn test_deep_nesting() {
        let mut value = Value::F64(f64::NAN);
        for _ in 0..200 {
            value = Value::Seq(vec![Value::Option(Some(Box::new(value)))]);
        }

        let mut clean = sanitize(value, NonFinitePolicy::Zero);
        for _ in 0..200 {
            clean = match clean {
                Value::Seq(mut items) => match items.pop() {
                    Some(Value::Option(Some(inner))) => *inner,
                    other => panic!("unexpected {:?}", other),
                },
                other => panic!("unexpected {:?}", other),
            };
        }
        assert_eq!(clean, Value::I64(0));
    }

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Row {
        period: &'static str,
        revenue: f64,
        net_income: Option<f64>,
        margins: Vec<f64>,
    }

    #[test]
    fn test_to_clean_json_on_structs() {
        let row = Row {
            period: "TTM",
            revenue: f64::NAN,
            net_income: Some(f64::INFINITY),
            margins: vec![0.25, f64::NAN],
        };

        let json = to_clean_json(&row, NonFinitePolicy::Zero).unwrap();

        assert_eq!(
            json,
            json!({"period": "TTM", "revenue": 0, "netIncome": 0, "margins": [0.25, 0]})
        );
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("zero".parse::<NonFinitePolicy>().unwrap(), NonFinitePolicy::Zero);
        assert_eq!(" NULL ".parse::<NonFinitePolicy>().unwrap(), NonFinitePolicy::Null);
        assert!("nan".parse::<NonFinitePolicy>().is_err());
    }
}
