//! Adapter selection.

use std::fmt;
use std::str::FromStr;

use cdi_model::{ChartDataPoint, FieldSuggestion, MappingConfig, Record, ValidationResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::contract::{DataAdapter, RowErrorPolicy, VALIDATION_SAMPLE_SIZE};
use crate::csv::{CsvAdapter, CsvOptions};
use crate::error::AdapterError;
use crate::nested::{NestedAdapter, record_depth};
use crate::pivot::{PivotAdapter, analyze_pivotability};
use crate::timeseries::TimeSeriesAdapter;

/// Record depth above which a batch is treated as nested.
const NESTED_DEPTH: usize = 2;

/// Pivotability confidence above which a batch is treated as wide.
const PIVOT_CONFIDENCE: f64 = 0.7;

/// The closed set of adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Csv,
    Nested,
    TimeSeries,
    Pivot,
}

impl AdapterKind {
    pub const ALL: [Self; 4] = [Self::Csv, Self::Nested, Self::TimeSeries, Self::Pivot];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Nested => "nested",
            Self::TimeSeries => "timeseries",
            Self::Pivot => "pivot",
        }
    }

    /// Adapter for a file extension: delimited text for `csv`, `tsv` and
    /// `txt`, nested objects for `json`.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Some(Self::Csv),
            "json" => Some(Self::Nested),
            _ => None,
        }
    }

    /// Picks an adapter from the shape of a decoded batch.
    ///
    /// Deep records go to the nested adapter, batches with a time field to
    /// the time-series adapter and confidently wide batches to the pivot
    /// adapter. Anything else is plain tabular data.
    pub fn detect(records: &[Record]) -> Self {
        let sample = &records[..records.len().min(VALIDATION_SAMPLE_SIZE)];
        let max_depth = sample.iter().map(record_depth).max().unwrap_or(0);
        let kind = if max_depth > NESTED_DEPTH {
            Self::Nested
        } else if !TimeSeriesAdapter::new().find_time_fields(records).is_empty() {
            Self::TimeSeries
        } else {
            let analysis = analyze_pivotability(records);
            if analysis.is_wide_format && analysis.confidence > PIVOT_CONFIDENCE {
                Self::Pivot
            } else {
                Self::Csv
            }
        };
        debug!(adapter = kind.name(), max_depth, "detected adapter");
        kind
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AdapterKind {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "delimited" => Ok(Self::Csv),
            "nested" | "json" => Ok(Self::Nested),
            "timeseries" | "time-series" | "time" => Ok(Self::TimeSeries),
            "pivot" => Ok(Self::Pivot),
            _ => Err(AdapterError::UnknownAdapter(s.to_string())),
        }
    }
}

/// One of the four adapters, dispatching the capability by variant.
#[derive(Debug, Clone, Copy)]
pub enum Adapter {
    Csv(CsvAdapter),
    Nested(NestedAdapter),
    TimeSeries(TimeSeriesAdapter),
    Pivot(PivotAdapter),
}

impl Adapter {
    /// Default-configured adapter of the given kind.
    pub fn new(kind: AdapterKind) -> Self {
        match kind {
            AdapterKind::Csv => Self::Csv(CsvAdapter::default()),
            AdapterKind::Nested => Self::Nested(NestedAdapter::new()),
            AdapterKind::TimeSeries => Self::TimeSeries(TimeSeriesAdapter::new()),
            AdapterKind::Pivot => Self::Pivot(PivotAdapter::new()),
        }
    }

    /// Adapter for a file extension; `tsv` gets a tab delimiter.
    pub fn for_extension(extension: &str) -> Option<Self> {
        let kind = AdapterKind::from_extension(extension)?;
        if extension.trim_start_matches('.').eq_ignore_ascii_case("tsv") {
            return Some(Self::Csv(CsvAdapter::new(CsvOptions::tsv())));
        }
        Some(Self::new(kind))
    }

    /// Adapter picked from the shape of a decoded batch.
    pub fn detect(records: &[Record]) -> Self {
        Self::new(AdapterKind::detect(records))
    }

    #[must_use]
    pub fn with_policy(self, policy: RowErrorPolicy) -> Self {
        match self {
            Self::Csv(adapter) => Self::Csv(adapter.with_policy(policy)),
            Self::Nested(adapter) => Self::Nested(adapter.with_policy(policy)),
            Self::TimeSeries(adapter) => Self::TimeSeries(adapter.with_policy(policy)),
            Self::Pivot(adapter) => Self::Pivot(adapter.with_policy(policy)),
        }
    }

    pub fn kind(&self) -> AdapterKind {
        match self {
            Self::Csv(_) => AdapterKind::Csv,
            Self::Nested(_) => AdapterKind::Nested,
            Self::TimeSeries(_) => AdapterKind::TimeSeries,
            Self::Pivot(_) => AdapterKind::Pivot,
        }
    }

    fn inner(&self) -> &dyn DataAdapter {
        match self {
            Self::Csv(adapter) => adapter,
            Self::Nested(adapter) => adapter,
            Self::TimeSeries(adapter) => adapter,
            Self::Pivot(adapter) => adapter,
        }
    }
}

impl From<AdapterKind> for Adapter {
    fn from(kind: AdapterKind) -> Self {
        Self::new(kind)
    }
}

impl DataAdapter for Adapter {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn validate(&self, records: &[Record]) -> ValidationResult {
        self.inner().validate(records)
    }

    fn transform(&self, records: &[Record], config: &MappingConfig) -> Vec<ChartDataPoint> {
        self.inner().transform(records, config)
    }

    fn suggest(&self, records: &[Record]) -> Vec<FieldSuggestion> {
        self.inner().suggest(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::records_from_json;

    fn rows(json: serde_json::Value) -> Vec<Record> {
        records_from_json(json).unwrap()
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(AdapterKind::from_extension("CSV"), Some(AdapterKind::Csv));
        assert_eq!(AdapterKind::from_extension(".json"), Some(AdapterKind::Nested));
        assert_eq!(AdapterKind::from_extension("xlsx"), None);
        let Some(Adapter::Csv(tsv)) = Adapter::for_extension("tsv") else {
            panic!("expected a delimited-text adapter");
        };
        assert_eq!(tsv.options().delimiter, '\t');
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!("Time-Series".parse::<AdapterKind>().unwrap(), AdapterKind::TimeSeries);
        assert_eq!(
            "xml".parse::<AdapterKind>().unwrap_err().to_string(),
            "unknown adapter 'xml': expected csv, nested, timeseries or pivot"
        );
        for kind in AdapterKind::ALL {
            assert_eq!(kind.name().parse::<AdapterKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_detect_precedence() {
        let nested = rows(serde_json::json!([{"a": {"b": {"c": 1}}, "date": "2024-01-01"}]));
        assert_eq!(AdapterKind::detect(&nested), AdapterKind::Nested);

        let series = rows(serde_json::json!([{"date": "2024-01-01", "v": 1}]));
        assert_eq!(AdapterKind::detect(&series), AdapterKind::TimeSeries);

        let wide = rows(serde_json::json!([
            {"region": "north", "q1": 1, "q2": 2, "q3": 3, "q4": 4}
        ]));
        assert_eq!(AdapterKind::detect(&wide), AdapterKind::Pivot);

        let plain = rows(serde_json::json!([{"name": "a", "score": 1}]));
        assert_eq!(AdapterKind::detect(&plain), AdapterKind::Csv);
        assert_eq!(AdapterKind::detect(&[]), AdapterKind::Csv);
    }

    #[test]
    fn test_adapter_delegates() {
        let adapter = Adapter::new(AdapterKind::TimeSeries).with_policy(RowErrorPolicy::Silent);
        assert_eq!(adapter.name(), "timeseries");
        assert_eq!(adapter.kind(), AdapterKind::TimeSeries);
        let result = adapter.validate(&rows(serde_json::json!([{"a": "x"}])));
        assert!(!result.is_valid);
    }
}
