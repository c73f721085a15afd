//! Value cleaning shared by all adapters.

use cdi_detect::{parse_date_str, parse_number_str};
use cdi_model::Value;
use chrono::{DateTime, Utc};

/// Reads a value as a number, failing on anything unparsable.
///
/// Strings are parsed after stripping `,`, `$`, `%` and whitespace. Booleans,
/// dates and containers are not numbers.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() => Some(*n),
        Value::String(s) => parse_number_str(s),
        _ => None,
    }
}

/// Reads a value as a number, with anything unparsable becoming 0.
pub fn clean_number(value: &Value) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

/// Reads a value as a date.
///
/// Dates pass through, strings are parsed in any recognized date form and
/// numbers are epoch milliseconds. Anything else is `None`.
pub fn clean_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(date) => Some(*date),
        Value::String(s) => parse_date_str(s),
        Value::Number(n) if n.is_finite() => DateTime::from_timestamp_millis(n.round() as i64),
        _ => None,
    }
}

/// Normalizes an x value.
///
/// Numeric-looking text becomes a number, date-looking text becomes a date,
/// other text is trimmed. Blank values and containers yield `None`.
pub fn clean_x(value: &Value) -> Option<Value> {
    let s = match value {
        _ if value.is_blank() => return None,
        Value::Array(_) | Value::Object(_) => return None,
        Value::String(s) => s,
        other => return Some(other.clone()),
    };
    let trimmed = s.trim();
    if let Some(n) = parse_number_str(trimmed) {
        return Some(Value::Number(n));
    }
    if let Some(date) = parse_date_str(trimmed) {
        return Some(Value::Date(date));
    }
    Some(Value::from(trimmed))
}
