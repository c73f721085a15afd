//! Reshape configuration and wide-format analysis results.

use std::fmt;

use serde::{Deserialize, Serialize};

fn default_variable_name() -> String {
    "variable".to_string()
}

fn default_value_name() -> String {
    "value".to_string()
}

/// A reshape to apply before point extraction.
///
/// Serialized with a `type` tag: `wide-to-long`, `long-to-wide` or `group-by`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum PivotConfig {
    /// One output row per (input row, value column).
    WideToLong {
        id_columns: Vec<String>,
        value_columns: Vec<String>,
        #[serde(default = "default_variable_name")]
        variable_name: String,
        #[serde(default = "default_value_name")]
        value_name: String,
    },
    /// One output row per id tuple, with `key_field` values as columns.
    LongToWide {
        id_columns: Vec<String>,
        key_field: String,
        value_field: String,
    },
    /// One output row per group tuple with aggregated fields.
    GroupBy {
        group_by_fields: Vec<String>,
        aggregate_fields: Vec<String>,
        #[serde(default)]
        aggregate_function: AggregateFunction,
    },
}

impl PivotConfig {
    /// Wide-to-long with the default `variable`/`value` output names.
    pub fn wide_to_long(id_columns: Vec<String>, value_columns: Vec<String>) -> Self {
        Self::WideToLong {
            id_columns,
            value_columns,
            variable_name: default_variable_name(),
            value_name: default_value_name(),
        }
    }

    /// Tag name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WideToLong { .. } => "wide-to-long",
            Self::LongToWide { .. } => "long-to-wide",
            Self::GroupBy { .. } => "group-by",
        }
    }
}

/// Reduction applied per group by [`PivotConfig::GroupBy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    #[default]
    Sum,
    Avg,
    Max,
    Min,
    Count,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Max => "max",
            Self::Min => "min",
            Self::Count => "count",
        }
    }

    /// Parses a function name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "avg" | "mean" | "average" => Some(Self::Avg),
            "max" => Some(Self::Max),
            "min" => Some(Self::Min),
            "count" => Some(Self::Count),
            _ => None,
        }
    }

    /// Reduces finite values; an empty input reduces to 0.
    pub fn apply(&self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        match self {
            Self::Sum => values.iter().sum(),
            Self::Avg => values.iter().sum::<f64>() / values.len() as f64,
            Self::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Self::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Self::Count => values.len() as f64,
        }
    }
}

impl fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How well a record batch fits a wide-to-long reshape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PivotAnalysis {
    pub is_wide_format: bool,
    pub confidence: f64,
    pub value_columns: Vec<String>,
    pub identifier_columns: Vec<String>,
    pub has_multiple_value_columns: bool,
    /// Rows sharing an identifier tuple with an earlier row.
    pub duplicate_key_pairs: usize,
}
