//! Type detection and suggestion result types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Semantic type inferred for a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Number,
    String,
    Date,
    Boolean,
}

impl ColumnType {
    /// Lowercase name as used in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Date => "date",
            Self::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running type detection over one column of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnTypeInfo {
    /// The winning type.
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    /// Finer classification, e.g. `currency-usd`, `iso-date`, `unix-seconds`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// Display format of the matched pattern, e.g. `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Fraction of non-null values supporting the type (0.0 to 1.0).
    pub confidence: f64,
    /// First few non-null values, for display.
    pub samples: Vec<Value>,
    /// Number of null or blank values in the column.
    pub null_count: usize,
}

/// Visual-encoding channel a field can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingRole {
    X,
    Y,
    Color,
    Size,
}

impl MappingRole {
    /// Role key as used in a [`crate::MappingConfig`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Color => "color",
            Self::Size => "size",
        }
    }
}

impl fmt::Display for MappingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ranked suggestion for the role a field should play.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSuggestion {
    /// Field path (dotted for nested fields).
    pub field: String,
    /// Detected type of the field.
    #[serde(rename = "type")]
    pub field_type: ColumnType,
    /// Confidence in the suggestion, clamped to 0.1..=0.95.
    pub confidence: f64,
    /// Suggested encoding role.
    pub suggested_role: MappingRole,
}

/// Chart category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Scatter,
    Pie,
}

impl ChartType {
    /// Lowercase chart name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Scatter => "scatter",
            Self::Pie => "pie",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate chart category with a fixed-weight confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartTypeSuggestion {
    #[serde(rename = "type")]
    pub chart_type: ChartType,
    pub confidence: f64,
    /// Short human-readable justification.
    pub reason: String,
}
