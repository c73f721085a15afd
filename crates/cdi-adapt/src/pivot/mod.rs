//! Wide/long reshaping and the adapter built on it.

mod adapter;
mod analysis;
mod reshape;

pub use adapter::PivotAdapter;
pub use analysis::{
    analyze_pivotability, count_duplicate_keys, has_naming_pattern, identify_id_columns,
    identify_value_columns,
};
pub use reshape::{ORIGINAL_INDEX_FIELD, group_by, long_to_wide, perform_pivot, wide_to_long};
