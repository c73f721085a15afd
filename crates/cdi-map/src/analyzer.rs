//! Role scoring for a single field.
//!
//! A field's suggested role comes from its detected type and name keywords.
//! Its confidence is the role's base weight scaled by the type confidence,
//! by how well the value distribution suits a chart, and by how deeply the
//! field is nested.

use std::collections::BTreeSet;

use cdi_detect::{match_date, match_number};
use cdi_model::{
    ColumnType, ColumnTypeInfo, FieldSuggestion, MappingRole, Value, leaf_name, path_depth,
};
use serde::Serialize;

/// Lowest confidence a suggestion can carry.
pub const MIN_CONFIDENCE: f64 = 0.1;

/// Highest confidence a suggestion can carry.
pub const MAX_CONFIDENCE: f64 = 0.95;

/// Per-level penalty for nested fields.
const DEPTH_DECAY: f64 = 0.9;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

const SIZE_KEYWORDS: &[&str] = &[
    "size", "radius", "width", "height", "length", "area", "volume",
];
const ORDINAL_KEYWORDS: &[&str] = &["index", "id", "key", "position", "rank", "order"];
const CATEGORY_KEYWORDS: &[&str] = &[
    "category", "type", "class", "group", "status", "state", "color",
];

/// A component contributing to a field's final confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    /// Component name, e.g. "Role base".
    pub name: &'static str,
    /// Multiplier applied to the running score.
    pub value: f64,
    /// Human-readable description.
    pub description: String,
}

/// Scored role suggestion for one field, with its explanation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldAnalysis {
    pub field: String,
    pub field_type: ColumnType,
    pub suggested_role: MappingRole,
    pub confidence: f64,
    pub distinct_values: usize,
    pub components: Vec<ScoreComponent>,
}

impl FieldAnalysis {
    /// Human-readable explanation of the confidence.
    pub fn explain(&self) -> String {
        self.components
            .iter()
            .map(|c| format!("{}: {:.2}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn to_suggestion(&self) -> FieldSuggestion {
        FieldSuggestion {
            field: self.field.clone(),
            field_type: self.field_type,
            confidence: self.confidence,
            suggested_role: self.suggested_role,
        }
    }
}

/// Scores the encoding role a field should play.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldAnalyzer;

impl FieldAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Analyzes one field given its detected type and its non-null values.
    pub fn analyze(&self, field: &str, info: &ColumnTypeInfo, values: &[&Value]) -> FieldAnalysis {
        let (role, base) = suggest_role(info.column_type, leaf_name(field));
        let distribution = distribution_score(info.column_type, values);
        let depth = path_depth(field).max(1);
        let depth_factor = DEPTH_DECAY.powi(i32::try_from(depth - 1).unwrap_or(i32::MAX));

        let components = vec![
            ScoreComponent {
                name: "Role base",
                value: base,
                description: format!("{} field as {}", info.column_type, role),
            },
            ScoreComponent {
                name: "Type confidence",
                value: info.confidence,
                description: format!(
                    "{:.0}% of values are {}",
                    info.confidence * 100.0,
                    info.column_type
                ),
            },
            ScoreComponent {
                name: "Distribution",
                value: distribution,
                description: format!("{} values", values.len()),
            },
            ScoreComponent {
                name: "Depth",
                value: depth_factor,
                description: format!("nested {depth} level(s) deep"),
            },
        ];

        let raw = base * info.confidence * distribution * depth_factor;
        FieldAnalysis {
            field: field.to_string(),
            field_type: info.column_type,
            suggested_role: role,
            confidence: raw.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE),
            distinct_values: distinct_count(values),
            components,
        }
    }
}

/// Picks the role for a type and field name, with its base weight.
pub fn suggest_role(column_type: ColumnType, name: &str) -> (MappingRole, f64) {
    let lower = name.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));
    match column_type {
        ColumnType::Number if has_any(SIZE_KEYWORDS) => (MappingRole::Size, 0.7),
        ColumnType::Number if has_any(ORDINAL_KEYWORDS) => (MappingRole::X, 0.6),
        ColumnType::Number => (MappingRole::Y, 0.8),
        ColumnType::Date => (MappingRole::X, 0.9),
        ColumnType::String if has_any(CATEGORY_KEYWORDS) => (MappingRole::Color, 0.8),
        ColumnType::String => (MappingRole::X, 0.6),
        ColumnType::Boolean => (MappingRole::Color, 0.7),
    }
}

/// How well a field's values suit charting, in `0.1..=1.0`.
///
/// Starts at 0.5. Numbers gain for a moderate coefficient of variation and a
/// non-zero range, strings for moderate uniqueness and a small distinct set,
/// dates for spanning more than a day.
pub fn distribution_score(column_type: ColumnType, values: &[&Value]) -> f64 {
    let mut score: f64 = 0.5;
    match column_type {
        ColumnType::Number => {
            let numbers: Vec<f64> = values
                .iter()
                .filter_map(|v| match_number(v).map(|m| m.value))
                .collect();
            if let Some(cv) = coefficient_of_variation(&numbers)
                && cv > 0.05
                && cv < 3.0
            {
                score += 0.3;
            }
            if range(&numbers) > 0.0 {
                score += 0.2;
            }
        }
        ColumnType::String => {
            if !values.is_empty() {
                let distinct = distinct_count(values);
                let uniqueness = distinct as f64 / values.len() as f64;
                if uniqueness > 0.1 && uniqueness < 0.8 {
                    score += 0.3;
                }
                if (2..=20).contains(&distinct) {
                    score += 0.2;
                }
            }
        }
        ColumnType::Date => {
            let millis: Vec<f64> = values
                .iter()
                .filter_map(|v| match_date(v).map(|m| m.value.timestamp_millis() as f64))
                .collect();
            if range(&millis) > MILLIS_PER_DAY {
                score += 0.5;
            }
        }
        ColumnType::Boolean => {}
    }
    score.clamp(MIN_CONFIDENCE, 1.0)
}

fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if mean == 0.0 {
        return None;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt() / mean.abs())
}

fn range(values: &[f64]) -> f64 {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() { 0.0 } else { max - min }
}

fn distinct_count(values: &[&Value]) -> usize {
    values
        .iter()
        .map(|v| v.to_key_string())
        .collect::<BTreeSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cdi_detect::TypeDetector;

    fn analyze(field: &str, values: &[Value]) -> FieldAnalysis {
        let refs: Vec<&Value> = values.iter().collect();
        let info = TypeDetector::new().detect_column_type(refs.iter().copied());
        FieldAnalyzer::new().analyze(field, &info, &refs)
    }

    #[test]
    fn test_role_keywords() {
        assert_eq!(suggest_role(ColumnType::Number, "sales").0, MappingRole::Y);
        assert_eq!(suggest_role(ColumnType::Number, "bubble_size").0, MappingRole::Size);
        assert_eq!(suggest_role(ColumnType::Number, "rank").0, MappingRole::X);
        assert_eq!(suggest_role(ColumnType::Date, "anything").0, MappingRole::X);
        assert_eq!(suggest_role(ColumnType::String, "Status").0, MappingRole::Color);
        assert_eq!(suggest_role(ColumnType::String, "name").0, MappingRole::X);
        assert_eq!(suggest_role(ColumnType::Boolean, "active").0, MappingRole::Color);
    }

    #[test]
    fn test_numeric_field_confidence() {
        let analysis = analyze("sales", &[Value::Number(100.0), Value::Number(200.0)]);
        assert_eq!(analysis.suggested_role, MappingRole::Y);
        assert!((analysis.confidence - 0.8).abs() < 1e-9);
        assert!(analysis.explain().contains("Role base: 0.80"));
    }

    #[test]
    fn test_string_field_confidence() {
        let analysis = analyze("name", &[Value::from("Alice"), Value::from("Bob")]);
        assert_eq!(analysis.suggested_role, MappingRole::X);
        // 0.6 base * 0.9 text confidence * 0.7 distribution
        assert!((analysis.confidence - 0.378).abs() < 1e-9);
        assert_eq!(analysis.distinct_values, 2);
    }

    #[test]
    fn test_depth_penalty() {
        let values = [Value::Number(1.0), Value::Number(3.0)];
        let flat = analyze("score", &values);
        let nested = analyze("stats.score", &values);
        assert!((nested.confidence - flat.confidence * 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_constant_numbers_score_low_distribution() {
        let values = [Value::Number(5.0), Value::Number(5.0)];
        let refs: Vec<&Value> = values.iter().collect();
        assert_eq!(distribution_score(ColumnType::Number, &refs), 0.5);
    }

    #[test]
    fn test_date_span() {
        let values = [Value::from("2024-01-01"), Value::from("2024-01-05")];
        let refs: Vec<&Value> = values.iter().collect();
        assert_eq!(distribution_score(ColumnType::Date, &refs), 1.0);
    }

    #[test]
    fn test_confidence_clamped() {
        let analysis = analyze("flag", &[Value::Bool(true)]);
        assert!(analysis.confidence >= MIN_CONFIDENCE);
        assert!(analysis.confidence <= MAX_CONFIDENCE);
    }
}
