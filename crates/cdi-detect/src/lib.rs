//! Column type detection for schema-less records.
//!
//! [`TypeDetector`] scores a column of raw values against three ordered
//! pattern tables (dates, numbers, booleans) and reports the winning type
//! with a confidence score. The tables and the value predicates built on
//! them are public so adapters can reuse the same parsing rules.

pub mod detector;
pub mod patterns;

pub use detector::{DEFAULT_SAMPLE_SIZE, TypeDetector};
pub use patterns::{
    BOOLEAN_KEYWORDS, BooleanKeywords, DatePattern, NumberPattern, TypeMatch, UNIX_MILLIS_RANGE,
    UNIX_SECONDS_RANGE, date_patterns, is_boolean_value, is_date_value, is_number_value,
    match_boolean, match_date, match_number, number_patterns, parse_boolean_str,
    parse_date_str, parse_number_str, unix_number_to_date,
};
