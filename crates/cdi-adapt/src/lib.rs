//! Chart data adapters.
//!
//! Each adapter validates a batch of schema-less records, suggests role
//! mappings for it and turns it into [`ChartDataPoint`](cdi_model::ChartDataPoint)s
//! under a caller-chosen mapping.
//!
//! # Adapters
//!
//! - **Csv**: delimited text, parsed with typed cell inference
//! - **Nested**: deep object graphs addressed by dotted paths
//! - **TimeSeries**: time-indexed rows, sorted chronologically on transform
//! - **Pivot**: wide tables reshaped to long form (or back) before charting
//!
//! # Example
//!
//! ```ignore
//! use cdi_adapt::{CsvAdapter, DataAdapter};
//! use cdi_map::MappingSuggester;
//!
//! let adapter = CsvAdapter::default();
//! let records = adapter.parse("name,sales\nAlice,100\nBob,200");
//! let report = adapter.validate(&records);
//! let config = MappingSuggester::new().suggest_config(&records).unwrap();
//! let points = adapter.transform(&records, &config);
//! ```

mod clean;
mod contract;
mod csv;
mod error;
mod factory;
mod nested;
mod pivot;
mod timeseries;

// === Error Types ===
pub use error::{AdapterError, Result, RowError};

// === Adapter Contract ===
pub use contract::{
    DataAdapter, RowErrorPolicy, VALIDATION_SAMPLE_SIZE, base_validate, default_x,
    extract_points, parse_json_records, records_from_json, records_from_values,
};

// === Value Cleaning ===
pub use clean::{clean_date, clean_number, clean_x, parse_number};

// === Delimited Text ===
pub use csv::{
    CsvAdapter, CsvOptions, CsvTable, infer_cell, parse_csv, parse_csv_line, read_csv,
};

// === Nested Objects ===
pub use nested::{
    DEFAULT_MAX_FIELD_DEPTH, FlatteningStrategy, NestedAdapter, NestingComplexity,
    get_all_nested_fields, record_depth, structure_signature, value_depth,
};

// === Time Series ===
pub use timeseries::{TimeInterval, TimeSeriesAdapter, is_time_value, parse_time_value};

// === Pivot ===
pub use pivot::{
    ORIGINAL_INDEX_FIELD, PivotAdapter, analyze_pivotability, count_duplicate_keys, group_by,
    has_naming_pattern, identify_id_columns, identify_value_columns, long_to_wide,
    perform_pivot, wide_to_long,
};

// === Adapter Selection ===
pub use factory::{Adapter, AdapterKind};
