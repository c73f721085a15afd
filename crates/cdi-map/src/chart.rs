//! Chart category suggestions from the overall field mix.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use cdi_detect::TypeDetector;
use cdi_model::{ChartType, ChartTypeSuggestion, ColumnType, Record};

use crate::fields::{DEFAULT_MAX_DEPTH, collect_values, enumerate_fields};

/// Largest number of slices for which a pie chart is suggested.
const MAX_PIE_SLICES: usize = 8;

/// Classifies a record batch into candidate chart categories.
#[derive(Debug, Clone, Copy)]
pub struct ChartTypeSuggester {
    detector: TypeDetector,
    max_depth: usize,
}

impl Default for ChartTypeSuggester {
    fn default() -> Self {
        Self {
            detector: TypeDetector::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Fields grouped by detected type, in enumeration order.
#[derive(Debug, Default)]
struct FieldGroups {
    numeric: Vec<String>,
    categorical: Vec<String>,
    date: Vec<String>,
}

impl ChartTypeSuggester {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Suggests chart categories, highest confidence first.
    ///
    /// - bar (0.9): a categorical and a numeric field
    /// - line (0.9): a date and a numeric field
    /// - scatter (0.8): two or more numeric fields
    /// - pie (0.7): a categorical field with at most 8 distinct values and a numeric field
    pub fn suggest(&self, records: &[Record]) -> Vec<ChartTypeSuggestion> {
        let Some(first) = records.first() else {
            return Vec::new();
        };
        let groups = self.group_fields(records, first);
        let has_numeric = !groups.numeric.is_empty();
        let mut out = Vec::new();

        if has_numeric && let Some(category) = groups.categorical.first() {
            out.push(suggestion(
                ChartType::Bar,
                0.9,
                format!("compare {} across {category}", groups.numeric[0]),
            ));
        }
        if has_numeric && let Some(date) = groups.date.first() {
            out.push(suggestion(
                ChartType::Line,
                0.9,
                format!("track {} over {date}", groups.numeric[0]),
            ));
        }
        if groups.numeric.len() >= 2 {
            out.push(suggestion(
                ChartType::Scatter,
                0.8,
                format!("correlate {} and {}", groups.numeric[0], groups.numeric[1]),
            ));
        }
        if has_numeric && let Some(category) = groups.categorical.first() {
            let distinct: BTreeSet<String> = collect_values(records, category)
                .into_iter()
                .map(|v| v.to_key_string())
                .collect();
            if distinct.len() <= MAX_PIE_SLICES {
                out.push(suggestion(
                    ChartType::Pie,
                    0.7,
                    format!(
                        "{} share by {category} ({} slices)",
                        groups.numeric[0],
                        distinct.len()
                    ),
                ));
            }
        }

        out.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        out
    }

    fn group_fields(&self, records: &[Record], first: &Record) -> FieldGroups {
        let mut groups = FieldGroups::default();
        for field in enumerate_fields(first, self.max_depth) {
            let values = collect_values(records, &field);
            let info = self.detector.detect_column_type(values.iter().copied());
            match info.column_type {
                ColumnType::Number => groups.numeric.push(field),
                ColumnType::String | ColumnType::Boolean => groups.categorical.push(field),
                ColumnType::Date => groups.date.push(field),
            }
        }
        groups
    }
}

fn suggestion(chart_type: ChartType, confidence: f64, reason: String) -> ChartTypeSuggestion {
    ChartTypeSuggestion {
        chart_type,
        confidence,
        reason,
    }
}
