//! Error types for chart data adapters.

use thiserror::Error;

/// Structural and decoding failures for a whole input batch.
#[derive(Debug, Error)]
pub enum AdapterError {
    // === Input Shape Errors ===
    /// Top-level input is not an array of records.
    #[error("input must be an array of records, found {found}")]
    NotAnArray { found: &'static str },

    /// The first record has no fields.
    #[error("records have no fields")]
    EmptyFieldSet,

    /// No field looks like a time axis.
    #[error("no time field found: expected a date-like field name or date values")]
    NoTimeField,

    // === Configuration Errors ===
    /// Adapter name not recognized.
    #[error("unknown adapter '{0}': expected csv, nested, timeseries or pivot")]
    UnknownAdapter(String),

    // === Decoding Errors ===
    /// Input text is not valid JSON.
    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for adapter operations.
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Why a single record produced no point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    /// A required role resolved to null or nothing.
    #[error("row {row}: no value for role '{role}'")]
    MissingValue { row: usize, role: &'static str },

    /// The y value could not be read as a number.
    #[error("row {row}: {role} value '{value}' is not a number")]
    NotNumeric {
        row: usize,
        role: &'static str,
        value: String,
    },

    /// A role resolved to an array or object instead of a single value.
    #[error("row {row}: {role} value '{value}' is not a single value")]
    NotScalar {
        row: usize,
        role: &'static str,
        value: String,
    },

    /// The x value could not be read as a point in time.
    #[error("row {row}: '{value}' is not a valid time")]
    InvalidTime { row: usize, value: String },
}

impl RowError {
    /// Index of the row in the sequence being mapped.
    pub fn row(&self) -> usize {
        match self {
            Self::MissingValue { row, .. }
            | Self::NotNumeric { row, .. }
            | Self::NotScalar { row, .. }
            | Self::InvalidTime { row, .. } => *row,
        }
    }

    /// True when the row was dropped for a missing value rather than a bad one.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingValue { .. })
    }
}
