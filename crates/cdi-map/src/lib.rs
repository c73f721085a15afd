//! Mapping and chart type suggestions.
//!
//! [`FieldAnalyzer`] scores which visual role a single field should drive;
//! [`MappingSuggester`] runs it over every (possibly nested) field of a
//! record batch and ranks the results. [`ChartTypeSuggester`] classifies
//! the field set into candidate chart categories.

pub mod analyzer;
pub mod chart;
pub mod fields;
pub mod suggester;

pub use analyzer::{FieldAnalysis, FieldAnalyzer, ScoreComponent};
pub use chart::ChartTypeSuggester;
pub use fields::{DEFAULT_MAX_DEPTH, collect_values, enumerate_fields};
pub use suggester::MappingSuggester;
