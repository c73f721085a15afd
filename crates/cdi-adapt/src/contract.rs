//! The capability every adapter offers, plus the behavior they share.
//!
//! Adapters validate a record batch, suggest role mappings for it and turn
//! it into [`ChartDataPoint`]s under a caller-chosen [`MappingConfig`].
//! Validation never fails: structural problems come back as an invalid
//! [`ValidationResult`]. Transformation never fails either: records that
//! cannot produce a point are dropped according to a [`RowErrorPolicy`].

use std::collections::BTreeMap;

use cdi_map::MappingSuggester;
use cdi_model::{ChartDataPoint, FieldSuggestion, MappingConfig, Record, ValidationResult, Value};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::clean::{clean_x, parse_number};
use crate::error::{AdapterError, Result, RowError};

/// Rows inspected by the shared key-consistency check.
pub const VALIDATION_SAMPLE_SIZE: usize = 10;

/// Confidence of a valid but empty batch.
const EMPTY_INPUT_CONFIDENCE: f64 = 0.5;

/// What to do when a record is dropped during transformation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowErrorPolicy {
    /// Log each unparsable row as a warning; rows with missing values are
    /// logged at debug level.
    #[default]
    Warn,
    /// Drop rows without logging.
    Silent,
}

impl RowErrorPolicy {
    /// Reports a dropped row.
    pub fn report(self, adapter: &str, error: &RowError) {
        match self {
            Self::Silent => {}
            Self::Warn if error.is_missing() => {
                debug!(adapter, row = error.row(), error = %error, "dropped row");
            }
            Self::Warn => {
                warn!(adapter, row = error.row(), error = %error, "dropped row");
            }
        }
    }
}

/// Capability shared by all adapters.
pub trait DataAdapter {
    /// Short adapter name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Checks whether a batch can be transformed.
    fn validate(&self, records: &[Record]) -> ValidationResult;

    /// Converts records into chart points, dropping those that cannot
    /// produce a non-null x and a numeric y.
    fn transform(&self, records: &[Record], config: &MappingConfig) -> Vec<ChartDataPoint>;

    /// Ranked role suggestions for the batch.
    fn suggest(&self, records: &[Record]) -> Vec<FieldSuggestion> {
        MappingSuggester::new().suggest_mapping(records)
    }

    /// Validates an arbitrary decoded value.
    ///
    /// Anything other than an array is a structural failure. Array elements
    /// that are not objects are treated as records without fields.
    fn validate_input(&self, input: &Value) -> ValidationResult {
        match input {
            Value::Array(items) => self.validate(&records_from_values(items)),
            other => ValidationResult::structural_failure(
                AdapterError::NotAnArray {
                    found: other.kind(),
                }
                .to_string(),
            ),
        }
    }
}

/// Validation common to every adapter.
///
/// An empty batch is valid with confidence 0.5 and one warning. A first
/// record without fields is a structural failure. Otherwise the first
/// [`VALIDATION_SAMPLE_SIZE`] rows are compared against the first row's key
/// set; each mismatch is a warning and confidence drops by the fraction of
/// mismatched rows.
pub fn base_validate(records: &[Record]) -> ValidationResult {
    let Some(first) = records.first() else {
        let mut result = ValidationResult::valid(EMPTY_INPUT_CONFIDENCE);
        result.warn("no records to validate");
        return result;
    };
    if first.is_empty() {
        return ValidationResult::structural_failure(AdapterError::EmptyFieldSet.to_string());
    }

    let sample = &records[..records.len().min(VALIDATION_SAMPLE_SIZE)];
    let mut result = ValidationResult::valid(1.0);
    let mut inconsistent = 0;
    for (idx, record) in sample.iter().enumerate().skip(1) {
        if !record.keys().eq(first.keys()) {
            inconsistent += 1;
            result.warn(format!("row {idx} has different fields than row 0"));
        }
    }
    result.confidence = 1.0 - inconsistent as f64 / sample.len() as f64;
    result
}

/// Extracts points from records with the shared role handling.
///
/// `x` is normalized by `clean_x` and `y` must read as a number; any other
/// mapped role is copied when it resolves to a non-null value (`size` as a
/// number when it parses as one). `index` is the record's position in
/// `records`.
pub fn extract_points<F>(
    adapter: &str,
    records: &[Record],
    config: &MappingConfig,
    policy: RowErrorPolicy,
    clean_x: F,
) -> Vec<ChartDataPoint>
where
    F: Fn(usize, &Value) -> std::result::Result<Value, RowError>,
{
    if config.get("x").is_none() || config.get("y").is_none() {
        if policy == RowErrorPolicy::Warn {
            warn!(adapter, "mapping must assign both x and y; no points produced");
        }
        return Vec::new();
    }

    let points: Vec<ChartDataPoint> = records
        .iter()
        .enumerate()
        .filter_map(
            |(index, record)| match extract_point(index, record, config, &clean_x) {
                Ok(point) => Some(point),
                Err(err) => {
                    policy.report(adapter, &err);
                    None
                }
            },
        )
        .collect();

    debug!(
        adapter,
        records = records.len(),
        points = points.len(),
        "transformed records"
    );
    points
}

fn extract_point<F>(
    index: usize,
    record: &Record,
    config: &MappingConfig,
    clean_x: &F,
) -> std::result::Result<ChartDataPoint, RowError>
where
    F: Fn(usize, &Value) -> std::result::Result<Value, RowError>,
{
    let required = |role: &'static str| -> std::result::Result<Value, RowError> {
        let value = config
            .get(role)
            .map(|field| field.resolve(record))
            .unwrap_or_default();
        if value.is_blank() {
            Err(RowError::MissingValue { row: index, role })
        } else {
            Ok(value)
        }
    };

    let x = clean_x(index, &required("x")?)?;
    let raw_y = required("y")?;
    let y = parse_number(&raw_y).ok_or_else(|| RowError::NotNumeric {
        row: index,
        role: "y",
        value: raw_y.to_key_string(),
    })?;

    let mut color = None;
    let mut size = None;
    let mut extra = BTreeMap::new();
    for (role, field) in config.optional_roles() {
        let value = field.resolve(record);
        if value.is_blank() {
            continue;
        }
        match role {
            "color" => color = Some(clean_optional(&value)),
            "size" => size = Some(parse_number(&value).map_or(value, Value::Number)),
            other => {
                extra.insert(other.to_string(), clean_optional(&value));
            }
        }
    }

    Ok(ChartDataPoint {
        x,
        y,
        color,
        size,
        extra,
        original_data: record.clone(),
        index,
    })
}

fn clean_optional(value: &Value) -> Value {
    clean_x(value).unwrap_or_else(|| value.clone())
}

/// The default x cleaning used by the delimited, nested and pivot adapters.
pub fn default_x(row: usize, value: &Value) -> std::result::Result<Value, RowError> {
    if matches!(value, Value::Array(_) | Value::Object(_)) {
        return Err(RowError::NotScalar {
            row,
            role: "x",
            value: value.to_key_string(),
        });
    }
    clean_x(value).ok_or(RowError::MissingValue { row, role: "x" })
}

/// Converts decoded array elements into records; non-objects become empty.
pub fn records_from_values(items: &[Value]) -> Vec<Record> {
    items
        .iter()
        .map(|item| item.as_object().cloned().unwrap_or_default())
        .collect()
}

/// Converts a decoded JSON document into records.
///
/// # Errors
///
/// Returns [`AdapterError::NotAnArray`] when the document is not an array.
pub fn records_from_json(document: serde_json::Value) -> Result<Vec<Record>> {
    match Value::from(document) {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| match item {
                Value::Object(record) => record,
                _ => Record::new(),
            })
            .collect()),
        other => Err(AdapterError::NotAnArray {
            found: other.kind(),
        }),
    }
}

/// Parses JSON text into records.
///
/// # Errors
///
/// Returns [`AdapterError::Json`] for malformed text and
/// [`AdapterError::NotAnArray`] when the document is not an array.
pub fn parse_json_records(text: &str) -> Result<Vec<Record>> {
    let document: serde_json::Value = serde_json::from_str(text)?;
    records_from_json(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(json: serde_json::Value) -> Vec<Record> {
        records_from_json(json).unwrap()
    }

    #[test]
    fn test_empty_is_valid_with_warning() {
        let result = base_validate(&[]);
        assert!(result.is_valid);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_empty_field_set_is_structural() {
        let result = base_validate(&rows(serde_json::json!([{}, {"a": 1}])));
        assert!(!result.is_valid);
        assert_eq!(result.confidence, 0.0);
        assert_eq!(result.errors, vec!["records have no fields".to_string()]);
    }

    #[test]
    fn test_inconsistent_keys_reduce_confidence() {
        let result = base_validate(&rows(serde_json::json!([
            {"a": 1, "b": 2},
            {"a": 3, "b": 4},
            {"a": 5},
            {"a": 6, "c": 7}
        ])));
        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
        assert_eq!(result.confidence, 0.5);
    }

    #[test]
    fn test_records_from_json_rejects_non_array() {
        let err = records_from_json(serde_json::json!("not an array")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "input must be an array of records, found string"
        );
        assert!(matches!(
            parse_json_records("{oops"),
            Err(AdapterError::Json(_))
        ));
    }

    #[test]
    fn test_extract_points_drops_bad_rows() {
        let records = rows(serde_json::json!([
            {"k": "a", "v": "10"},
            {"k": "b", "v": "ten"},
            {"k": null, "v": 3},
            {"k": "d", "v": 4, "tone": "red", "weight": "2.5"}
        ]));
        let config = MappingConfig::new()
            .x("k")
            .y("v")
            .color("tone")
            .size("weight");
        let points = extract_points("test", &records, &config, RowErrorPolicy::Silent, default_x);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].y, 10.0);
        assert_eq!(points[1].index, 3);
        assert_eq!(points[1].color, Some(Value::from("red")));
        assert_eq!(points[1].size, Some(Value::Number(2.5)));
    }

    #[test]
    fn test_extract_points_requires_x_and_y() {
        let records = rows(serde_json::json!([{"a": 1}]));
        let config = MappingConfig::new().x("a");
        assert!(extract_points("test", &records, &config, RowErrorPolicy::Warn, default_x).is_empty());
    }

    #[test]
    fn test_default_x_rejects_containers() {
        let tags = Value::Array(vec![Value::from("a")]);
        let error = default_x(4, &tags).unwrap_err();
        assert_eq!(error.to_string(), "row 4: x value '[\"a\"]' is not a single value");
        assert!(!error.is_missing());
        assert_eq!(error.row(), 4);
        assert_eq!(default_x(0, &Value::from(" 7 ")), Ok(Value::Number(7.0)));
    }
}
