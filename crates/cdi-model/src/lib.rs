//! Data model for schema-less chart data inference.
//!
//! Records are dynamic [`Value`] trees keyed by field name. Detection,
//! suggestion and adapter crates all exchange the types defined here.

pub mod mapping;
pub mod path;
pub mod pivot;
pub mod types;
pub mod validation;
pub mod value;

pub use mapping::{Accessor, ChartDataPoint, FieldRef, MappingConfig};
pub use path::{join_path, leaf_name, path_depth, resolve_path};
pub use pivot::{AggregateFunction, PivotAnalysis, PivotConfig};
pub use types::{
    ChartType, ChartTypeSuggestion, ColumnType, ColumnTypeInfo, FieldSuggestion, MappingRole,
};
pub use validation::ValidationResult;
pub use value::{Record, Value, format_numeric, record_from_json};
