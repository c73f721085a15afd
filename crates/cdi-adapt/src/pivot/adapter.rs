use cdi_model::{
    ChartDataPoint, MappingConfig, PivotAnalysis, PivotConfig, Record, ValidationResult,
};

use super::analysis::analyze_pivotability;
use super::reshape::perform_pivot;
use crate::contract::{DataAdapter, RowErrorPolicy, base_validate, default_x, extract_points};

/// Confidence above which a wide-to-long reshape is suggested.
const SUGGEST_CONFIDENCE: f64 = 0.7;

/// Confidence multiplier per pivot-specific warning.
const WARNING_PENALTY: f64 = 0.9;

/// Adapter for wide tables that need reshaping before charting.
///
/// When the mapping carries a [`PivotConfig`], records are reshaped first and
/// points are extracted from the reshaped rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct PivotAdapter {
    policy: RowErrorPolicy,
}

impl PivotAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn analyze(&self, records: &[Record]) -> PivotAnalysis {
        analyze_pivotability(records)
    }

    /// A wide-to-long reshape over the detected id and value columns, when
    /// the batch is wide with confidence above 0.7.
    pub fn suggest_pivot_config(&self, records: &[Record]) -> Option<PivotConfig> {
        let analysis = analyze_pivotability(records);
        (analysis.is_wide_format && analysis.confidence > SUGGEST_CONFIDENCE).then(|| {
            PivotConfig::wide_to_long(analysis.identifier_columns, analysis.value_columns)
        })
    }
}

impl DataAdapter for PivotAdapter {
    fn name(&self) -> &'static str {
        "pivot"
    }

    fn validate(&self, records: &[Record]) -> ValidationResult {
        let mut result = base_validate(records);
        if !result.is_valid || records.is_empty() {
            return result;
        }

        let analysis = analyze_pivotability(records);
        if analysis.value_columns.is_empty() {
            result.warn_scaled("no numeric value columns found", WARNING_PENALTY);
        }
        if analysis.identifier_columns.is_empty() {
            result.warn_scaled(
                "no identifier columns found; reshaped rows cannot be told apart",
                WARNING_PENALTY,
            );
        }
        if analysis.duplicate_key_pairs > 0 {
            result.warn_scaled(
                format!(
                    "{} row(s) repeat an identifier combination; long-to-wide will merge them",
                    analysis.duplicate_key_pairs
                ),
                WARNING_PENALTY,
            );
        }
        result
    }

    fn transform(&self, records: &[Record], config: &MappingConfig) -> Vec<ChartDataPoint> {
        match &config.pivot {
            Some(pivot) => {
                let reshaped = perform_pivot(records, pivot);
                extract_points(self.name(), &reshaped, config, self.policy, default_x)
            }
            None => extract_points(self.name(), records, config, self.policy, default_x),
        }
    }
}
