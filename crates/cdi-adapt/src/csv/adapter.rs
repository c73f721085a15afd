use cdi_detect::{TypeDetector, is_number_value};
use cdi_model::{ChartDataPoint, ColumnType, MappingConfig, Record, ValidationResult};

use super::parse::{CsvOptions, CsvTable, parse_csv, read_csv};
use crate::contract::{DataAdapter, RowErrorPolicy, base_validate, default_x, extract_points};

/// Fields detected below this confidence get a warning.
const LOW_TYPE_CONFIDENCE: f64 = 0.7;

/// Confidence multiplier per CSV-specific warning.
const WARNING_PENALTY: f64 = 0.9;

/// Offending values listed per non-numeric field warning.
const MAX_LISTED_VALUES: usize = 3;

/// Adapter for delimited text.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvAdapter {
    options: CsvOptions,
    policy: RowErrorPolicy,
    detector: TypeDetector,
}

impl CsvAdapter {
    pub fn new(options: CsvOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn options(&self) -> &CsvOptions {
        &self.options
    }

    /// Parses text with this adapter's options.
    pub fn parse(&self, text: &str) -> Vec<Record> {
        parse_csv(text, &self.options)
    }

    /// Parses text with this adapter's options, keeping the header line.
    pub fn parse_table(&self, text: &str) -> CsvTable {
        read_csv(text, &self.options)
    }

    /// Validates records parsed from text whose header line was `headers`.
    /// Blank names are counted on the header line, since parsing renames
    /// them.
    pub fn validate_with_headers(&self, records: &[Record], headers: &[String]) -> ValidationResult {
        let blank_headers = headers.iter().filter(|name| name.trim().is_empty()).count();
        self.validate_records(records, blank_headers)
    }

    fn validate_records(&self, records: &[Record], blank_headers: usize) -> ValidationResult {
        let mut result = base_validate(records);
        if records.is_empty() || !result.is_valid {
            return result;
        }

        if blank_headers > 0 {
            result.warn_scaled(
                format!("{blank_headers} column(s) have empty header names"),
                WARNING_PENALTY,
            );
        }

        for (field, info) in self.detector.detect_record_types(records) {
            if info.confidence < LOW_TYPE_CONFIDENCE {
                result.warn_scaled(
                    format!(
                        "field '{field}' has mixed values: {:.0}% look like {}",
                        info.confidence * 100.0,
                        info.column_type
                    ),
                    WARNING_PENALTY,
                );
            }
            if info.column_type != ColumnType::Number {
                continue;
            }
            let invalid: Vec<String> = records
                .iter()
                .filter_map(|record| record.get(&field))
                .filter(|value| !value.is_blank() && !is_number_value(value))
                .map(|value| value.to_key_string())
                .collect();
            if !invalid.is_empty() {
                let listed: Vec<&str> = invalid
                    .iter()
                    .take(MAX_LISTED_VALUES)
                    .map(String::as_str)
                    .collect();
                result.warn_scaled(
                    format!(
                        "numeric field '{field}' has {} unparsable value(s): {}",
                        invalid.len(),
                        listed.join(", ")
                    ),
                    WARNING_PENALTY,
                );
            }
        }
        result
    }
}

impl DataAdapter for CsvAdapter {
    fn name(&self) -> &'static str {
        "csv"
    }

    /// Shared validation plus warnings for blank field names, weakly typed
    /// fields, and numeric fields holding unparsable values.
    fn validate(&self, records: &[Record]) -> ValidationResult {
        let blank_fields = records
            .first()
            .map_or(0, |first| first.keys().filter(|key| key.trim().is_empty()).count());
        self.validate_records(records, blank_fields)
    }

    fn transform(&self, records: &[Record], config: &MappingConfig) -> Vec<ChartDataPoint> {
        extract_points(self.name(), records, config, self.policy, default_x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdi_model::Value;

    #[test]
    fn test_parse_and_transform() {
        let adapter = CsvAdapter::default();
        let records = adapter.parse("name,sales\nAlice,100\nBob,200\nCarol,n/a");
        let config = MappingConfig::new().x("name").y("sales");
        let points = adapter.transform(&records, &config);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].x, Value::from("Alice"));
        assert_eq!(points[1].y, 200.0);
    }

    #[test]
    fn test_validate_flags_unparsable_numbers() {
        let adapter = CsvAdapter::default();
        let records = adapter.parse("id,score\na,1\nb,2\nc,3\nd,oops\ne,bad");
        let result = adapter.validate(&records);
        assert!(result.is_valid);
        let warning = result
            .warnings
            .iter()
            .find(|w| w.contains("unparsable"))
            .unwrap();
        assert!(warning.contains("'score' has 2 unparsable value(s): oops, bad"));
        assert!(result.confidence < 1.0);
    }

    #[test]
    fn test_validate_blank_headers() {
        let adapter = CsvAdapter::default();
        let table = adapter.parse_table("a,,\n1,2,3");
        assert_eq!(table.records[0].len(), 3);
        let result = adapter.validate_with_headers(&table.records, &table.headers);
        assert!(result.is_valid);
        assert_eq!(result.warnings, vec!["2 column(s) have empty header names".to_string()]);
        assert_eq!(result.confidence, 0.9);

        let renamed = adapter.validate(&table.records);
        assert!(renamed.warnings.is_empty());
    }

    #[test]
    fn test_tsv_options() {
        let adapter = CsvAdapter::new(CsvOptions::tsv());
        let records = adapter.parse("city\tpop\nOslo\t700000");
        assert_eq!(records[0]["pop"], Value::Number(700000.0));
    }
}
