//! Ranked role suggestions over a record batch.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use cdi_detect::TypeDetector;
use cdi_model::{
    ChartTypeSuggestion, ColumnType, FieldSuggestion, MappingConfig, MappingRole, Record,
};
use tracing::debug;

use crate::analyzer::{FieldAnalysis, FieldAnalyzer};
use crate::chart::ChartTypeSuggester;
use crate::fields::{DEFAULT_MAX_DEPTH, collect_values, enumerate_fields};

/// Combines type detection and role scoring over every field of a batch.
///
/// Fields are enumerated from the first record; values are gathered from
/// all records.
#[derive(Debug, Clone, Copy)]
pub struct MappingSuggester {
    detector: TypeDetector,
    analyzer: FieldAnalyzer,
    max_depth: usize,
}

impl Default for MappingSuggester {
    fn default() -> Self {
        Self {
            detector: TypeDetector::default(),
            analyzer: FieldAnalyzer,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl MappingSuggester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how deep nested objects are enumerated.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Scores every field, highest confidence first.
    ///
    /// The sort is stable, so equally confident fields keep enumeration order.
    pub fn analyze_fields(&self, records: &[Record]) -> Vec<FieldAnalysis> {
        let Some(first) = records.first() else {
            return Vec::new();
        };

        let mut analyses: Vec<FieldAnalysis> = enumerate_fields(first, self.max_depth)
            .iter()
            .map(|field| {
                let values = collect_values(records, field);
                let info = self.detector.detect_column_type(values.iter().copied());
                self.analyzer.analyze(field, &info, &values)
            })
            .collect();
        analyses.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });

        debug!(
            records = records.len(),
            fields = analyses.len(),
            "analyzed fields"
        );
        analyses
    }

    /// Ranked role suggestions, sorted by non-increasing confidence.
    pub fn suggest_mapping(&self, records: &[Record]) -> Vec<FieldSuggestion> {
        self.analyze_fields(records)
            .iter()
            .map(FieldAnalysis::to_suggestion)
            .collect()
    }

    /// Picks a complete mapping from the ranked suggestions.
    ///
    /// Greedy by descending confidence: the best numeric `y` field first,
    /// then the best `x` field, falling back to the best remaining field of
    /// any role, then optional `color` and `size`. A field is used at most
    /// once. Returns `None` when no numeric `y` or no `x` can be found.
    pub fn suggest_config(&self, records: &[Record]) -> Option<MappingConfig> {
        let suggestions = self.suggest_mapping(records);
        let mut assigned: BTreeSet<&str> = BTreeSet::new();

        let y = suggestions.iter().find(|s| {
            s.suggested_role == MappingRole::Y && s.field_type == ColumnType::Number
        })?;
        assigned.insert(&y.field);

        let x = pick(&suggestions, &assigned, Some(MappingRole::X))
            .or_else(|| pick(&suggestions, &assigned, None))?;
        assigned.insert(&x.field);

        let mut config = MappingConfig::new()
            .x(x.field.as_str())
            .y(y.field.as_str());
        if let Some(color) = pick(&suggestions, &assigned, Some(MappingRole::Color)) {
            assigned.insert(&color.field);
            config = config.color(color.field.as_str());
        }
        if let Some(size) = pick(&suggestions, &assigned, Some(MappingRole::Size)) {
            config = config.size(size.field.as_str());
        }

        debug!(x = %x.field, y = %y.field, "suggested mapping config");
        Some(config)
    }

    /// Candidate chart categories for the batch.
    pub fn suggest_chart_type(&self, records: &[Record]) -> Vec<ChartTypeSuggestion> {
        ChartTypeSuggester::new()
            .with_max_depth(self.max_depth)
            .suggest(records)
    }
}

fn pick<'s>(
    suggestions: &'s [FieldSuggestion],
    assigned: &BTreeSet<&str>,
    role: Option<MappingRole>,
) -> Option<&'s FieldSuggestion> {
    suggestions.iter().find(|s| {
        !assigned.contains(s.field.as_str()) && role.is_none_or(|role| s.suggested_role == role)
    })
}
