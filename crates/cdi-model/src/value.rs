//! Dynamic values carried by schema-less records.
//!
//! Input data has no fixed schema, so every cell is a [`Value`]: a closed
//! enum over the shapes decoded JSON, parsed delimited text and in-memory
//! callers can produce. Dates are first-class because delimited-text parsing
//! and time-series normalization both produce them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A single record: field name to value.
///
/// Keys are kept in sorted order so that field enumeration and every
/// heuristic built on it is deterministic.
pub type Record = BTreeMap<String, Value>;

/// A dynamically typed cell value.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Missing or explicit null.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Any numeric value (JSON numbers are widened to `f64`).
    Number(f64),
    /// Text.
    String(String),
    /// A point in time.
    Date(DateTime<Utc>),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// Nested object.
    Object(Record),
}

impl Value {
    /// Returns true for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true for null and for strings that are empty after trimming.
    ///
    /// Blank text carries no information for any heuristic, so it is
    /// treated exactly like a missing value.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Returns the number if this is a finite [`Value::Number`].
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Returns the string slice if this is a [`Value::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the boolean if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a [`Value::Date`].
    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Returns the nested record if this is a [`Value::Object`].
    pub fn as_object(&self) -> Option<&Record> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the elements if this is a [`Value::Array`].
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Short type tag used in structural signatures and diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    /// Renders the value as a grouping key fragment.
    ///
    /// Null renders as an empty string, numbers without trailing zeros and
    /// dates as RFC 3339.
    pub fn to_key_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_numeric(*n),
            Self::String(s) => s.clone(),
            Self::Date(d) => d.to_rfc3339_opts(SecondsFormat::Millis, true),
            Self::Array(_) | Self::Object(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            other => write!(f, "{}", other.to_key_string()),
        }
    }
}

/// Formats a floating-point number without trailing zeros after the decimal.
///
/// Integer-valued floats like 40.0 are formatted as "40", not "4".
pub fn format_numeric(v: f64) -> String {
    let s = format!("{v}");
    if s.contains('.') {
        let trimmed = s.trim_end_matches('0').trim_end_matches('.');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    } else {
        s
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Null, Self::Number),
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Self::Object(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(value)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(d) => {
                serializer.serialize_str(&d.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            Self::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

/// Converts a decoded JSON object into a [`Record`].
///
/// Returns `None` when the value is not an object.
pub fn record_from_json(value: serde_json::Value) -> Option<Record> {
    match Value::from(value) {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_from_json_object() {
        let json = serde_json::json!({"a": {"b": 1}, "c": [true, null], "d": "x"});
        let value = Value::from(json);
        let record = value.as_object().unwrap();
        assert_eq!(
            record["a"].as_object().unwrap()["b"],
            Value::Number(1.0)
        );
        assert_eq!(
            record["c"],
            Value::Array(vec![Value::Bool(true), Value::Null])
        );
        assert_eq!(record["d"].as_str(), Some("x"));
    }

    #[test]
    fn test_is_blank() {
        assert!(Value::Null.is_blank());
        assert!(Value::from("   ").is_blank());
        assert!(!Value::from("a").is_blank());
        assert!(!Value::Number(0.0).is_blank());
    }

    #[test]
    fn test_key_string() {
        assert_eq!(Value::Number(40.0).to_key_string(), "40");
        assert_eq!(Value::Number(1.50).to_key_string(), "1.5");
        assert_eq!(Value::Null.to_key_string(), "");
        let date = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(
            Value::Date(date).to_key_string(),
            "2024-01-15T00:00:00.000Z"
        );
    }

    #[test]
    fn test_serialize_date_as_string() {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let json = serde_json::to_value(Value::Date(date)).unwrap();
        assert_eq!(json, serde_json::json!("2024-03-01T12:30:00.000Z"));
    }

    #[test]
    fn test_deserialize_round_trip_shape() {
        let value: Value = serde_json::from_str(r#"{"k": [1, "two", false]}"#).unwrap();
        assert_eq!(value.kind(), "object");
        let items = value.as_object().unwrap()["k"].as_array().unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].kind(), "string");
    }

    #[test]
    fn test_as_f64_rejects_non_finite() {
        assert_eq!(Value::Number(f64::NAN).as_f64(), None);
        assert_eq!(Value::Number(2.5).as_f64(), Some(2.5));
    }
}
