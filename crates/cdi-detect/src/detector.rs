//! Column type scoring.

use std::collections::{BTreeMap, BTreeSet};

use cdi_model::{ColumnType, ColumnTypeInfo, Record, Value};
use tracing::debug;

use crate::patterns::{
    BOOLEAN_KEYWORDS, TypeMatch, date_patterns, match_boolean, match_date, match_number,
    number_patterns,
};

/// Number of non-null values copied into [`ColumnTypeInfo::samples`].
pub const DEFAULT_SAMPLE_SIZE: usize = 5;

/// Confidence reported when no typed candidate matched any value.
const STRING_FALLBACK_CONFIDENCE: f64 = 0.9;

/// Confidence reported for a column with no non-null values.
const EMPTY_COLUMN_CONFIDENCE: f64 = 0.5;

static NULL_VALUE: Value = Value::Null;

/// Infers a column's semantic type from its raw values.
///
/// Stateless apart from its sample size; share one instance freely.
#[derive(Debug, Clone, Copy)]
pub struct TypeDetector {
    sample_size: usize,
}

impl Default for TypeDetector {
    fn default() -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }
}

/// Per-candidate match count and the earliest table pattern seen.
#[derive(Debug, Default)]
struct Tally {
    matches: usize,
    first_pattern: Option<usize>,
}

impl Tally {
    fn record<T>(&mut self, found: Option<TypeMatch<T>>) {
        let Some(found) = found else {
            return;
        };
        self.matches += 1;
        if let Some(idx) = found.pattern {
            self.first_pattern = Some(self.first_pattern.map_or(idx, |cur| cur.min(idx)));
        }
    }

    fn confidence(&self, total: usize) -> f64 {
        self.matches as f64 / total as f64
    }
}

impl TypeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how many non-null values are kept as display samples.
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Detects the type of one column.
    ///
    /// Null and blank values are counted and excluded. Date, number and
    /// boolean are each scored as the fraction of remaining values they
    /// match; the strictly highest wins, ties going to the earlier of
    /// date, number, boolean. With no match at all the column is text.
    pub fn detect_column_type<'a, I>(&self, values: I) -> ColumnTypeInfo
    where
        I: IntoIterator<Item = &'a Value>,
    {
        let mut null_count = 0;
        let present: Vec<&Value> = values
            .into_iter()
            .filter(|value| {
                let blank = value.is_blank();
                if blank {
                    null_count += 1;
                }
                !blank
            })
            .collect();
        let samples: Vec<Value> = present
            .iter()
            .take(self.sample_size)
            .map(|value| (*value).clone())
            .collect();

        if present.is_empty() {
            return ColumnTypeInfo {
                column_type: ColumnType::String,
                subtype: None,
                format: None,
                confidence: EMPTY_COLUMN_CONFIDENCE,
                samples,
                null_count,
            };
        }

        let mut date = Tally::default();
        let mut number = Tally::default();
        let mut boolean = Tally::default();
        for value in &present {
            date.record(match_date(value));
            number.record(match_number(value));
            boolean.record(match_boolean(value));
        }

        let total = present.len();
        let mut best: Option<(ColumnType, &Tally, f64)> = None;
        for (column_type, tally) in [
            (ColumnType::Date, &date),
            (ColumnType::Number, &number),
            (ColumnType::Boolean, &boolean),
        ] {
            let confidence = tally.confidence(total);
            if confidence > best.map_or(0.0, |(_, _, c)| c) {
                best = Some((column_type, tally, confidence));
            }
        }

        let info = match best {
            Some((column_type, tally, confidence)) => {
                let (subtype, format) = describe_pattern(column_type, tally.first_pattern);
                ColumnTypeInfo {
                    column_type,
                    subtype,
                    format,
                    confidence,
                    samples,
                    null_count,
                }
            }
            None => ColumnTypeInfo {
                column_type: ColumnType::String,
                subtype: Some("text".to_string()),
                format: None,
                confidence: STRING_FALLBACK_CONFIDENCE,
                samples,
                null_count,
            },
        };

        debug!(
            column_type = %info.column_type,
            confidence = info.confidence,
            values = total,
            nulls = null_count,
            "detected column type"
        );
        info
    }

    /// Detects the type of every top-level field across a record batch.
    ///
    /// Fields missing from a record count as null for that record.
    pub fn detect_record_types(&self, records: &[Record]) -> BTreeMap<String, ColumnTypeInfo> {
        let fields: BTreeSet<&String> = records.iter().flat_map(|r| r.keys()).collect();
        fields
            .into_iter()
            .map(|field| {
                let values = records
                    .iter()
                    .map(|record| record.get(field).unwrap_or(&NULL_VALUE));
                (field.clone(), self.detect_column_type(values))
            })
            .collect()
    }
}

fn describe_pattern(
    column_type: ColumnType,
    pattern: Option<usize>,
) -> (Option<String>, Option<String>) {
    let Some(idx) = pattern else {
        return (None, None);
    };
    match column_type {
        ColumnType::Date => date_patterns()
            .get(idx)
            .map(|p| (Some(p.name.to_string()), Some(p.format.to_string())))
            .unwrap_or_default(),
        ColumnType::Number => number_patterns()
            .get(idx)
            .map(|p| (Some(p.name.to_string()), Some(p.format.to_string())))
            .unwrap_or_default(),
        ColumnType::Boolean => BOOLEAN_KEYWORDS
            .get(idx)
            .map(|k| (Some(k.name.to_string()), Some(k.format())))
            .unwrap_or_default(),
        ColumnType::String => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<Value> {
        values.iter().map(|v| Value::from(*v)).collect()
    }

    #[test]
    fn test_iso_dates() {
        let values = strings(&["2024-01-01", "2024-02-15", "2024-03-31"]);
        let info = TypeDetector::new().detect_column_type(&values);
        assert_eq!(info.column_type, ColumnType::Date);
        assert_eq!(info.confidence, 1.0);
        assert_eq!(info.subtype.as_deref(), Some("iso-date"));
        assert_eq!(info.format.as_deref(), Some("YYYY-MM-DD"));
    }

    #[test]
    fn test_half_numeric() {
        let values = strings(&["10", "20", "apple", "pear"]);
        let info = TypeDetector::new().detect_column_type(&values);
        assert_eq!(info.column_type, ColumnType::Number);
        assert_eq!(info.confidence, 0.5);
    }

    #[test]
    fn test_free_text_fallback() {
        let values = strings(&["alpha", "beta"]);
        let info = TypeDetector::new().detect_column_type(&values);
        assert_eq!(info.column_type, ColumnType::String);
        assert_eq!(info.confidence, 0.9);
        assert_eq!(info.subtype.as_deref(), Some("text"));
    }

    #[test]
    fn test_all_null() {
        let values = vec![Value::Null, Value::from(" ")];
        let info = TypeDetector::new().detect_column_type(&values);
        assert_eq!(info.column_type, ColumnType::String);
        assert_eq!(info.confidence, 0.5);
        assert_eq!(info.null_count, 2);
        assert!(info.samples.is_empty());
    }

    #[test]
    fn test_tie_prefers_number_over_boolean() {
        let values = vec![Value::Number(0.0), Value::Number(1.0), Value::Number(1.0)];
        let info = TypeDetector::new().detect_column_type(&values);
        assert_eq!(info.column_type, ColumnType::Number);
        assert_eq!(info.subtype.as_deref(), Some("integer"));
    }

    #[test]
    fn test_boolean_keywords() {
        let values = strings(&["yes", "no", "Yes"]);
        let info = TypeDetector::new().detect_column_type(&values);
        assert_eq!(info.column_type, ColumnType::Boolean);
        assert_eq!(info.subtype.as_deref(), Some("yes-no"));
        assert_eq!(info.format.as_deref(), Some("yes/no"));
    }

    #[test]
    fn test_subtype_is_earliest_table_pattern() {
        let values = strings(&["1,234", "$5.00", "7"]);
        let info = TypeDetector::new().detect_column_type(&values);
        assert_eq!(info.column_type, ColumnType::Number);
        assert_eq!(info.subtype.as_deref(), Some("currency-usd"));
    }

    #[test]
    fn test_unix_seconds_numbers() {
        let values = vec![Value::Number(1_704_067_200.0), Value::Number(1_704_153_600.0)];
        let info = TypeDetector::new().detect_column_type(&values);
        assert_eq!(info.column_type, ColumnType::Date);
        assert_eq!(info.subtype.as_deref(), Some("unix-seconds"));
    }

    #[test]
    fn test_samples_and_nulls() {
        let values = vec![
            Value::Number(1.0),
            Value::Null,
            Value::Number(2.0),
            Value::Number(3.0),
        ];
        let info = TypeDetector::new()
            .with_sample_size(2)
            .detect_column_type(&values);
        assert_eq!(info.null_count, 1);
        assert_eq!(info.samples, vec![Value::Number(1.0), Value::Number(2.0)]);
    }

    #[test]
    fn test_detect_record_types() {
        let records: Vec<Record> = [
            serde_json::json!({"name": "a", "score": 1}),
            serde_json::json!({"name": "b"}),
        ]
        .into_iter()
        .filter_map(cdi_model::record_from_json)
        .collect();
        let types = TypeDetector::new().detect_record_types(&records);
        assert_eq!(types["name"].column_type, ColumnType::String);
        assert_eq!(types["score"].column_type, ColumnType::Number);
        assert_eq!(types["score"].null_count, 1);
    }
}
