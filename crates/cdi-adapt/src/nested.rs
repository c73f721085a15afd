//! Adapter for deeply nested object graphs.
//!
//! Point extraction walks dotted paths to any depth. Validation adds a
//! structural analysis of the sampled rows: how deep they nest, how many
//! distinct shapes they have, and how reliably each field path resolves.

use std::collections::BTreeSet;

use cdi_model::{
    ChartDataPoint, MappingConfig, Record, ValidationResult, Value, join_path, path_depth,
    resolve_path,
};
use serde::Serialize;

use crate::contract::{DataAdapter, RowErrorPolicy, base_validate, default_x, extract_points};

/// Default depth limit for [`get_all_nested_fields`].
pub const DEFAULT_MAX_FIELD_DEPTH: usize = 5;

/// Rows inspected for nesting complexity.
const COMPLEXITY_SAMPLE_SIZE: usize = 10;

/// Rows inspected for field accessibility.
const ACCESSIBILITY_SAMPLE_SIZE: usize = 20;

/// Depth beyond which structural signatures stop descending.
const SIGNATURE_DEPTH: usize = 3;

/// Nesting depth above which validation warns.
const WARN_DEPTH: usize = 5;

/// Confidence multiplier per structural warning.
const WARNING_PENALTY: f64 = 0.9;

/// Nesting statistics over a row sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NestingComplexity {
    pub max_depth: usize,
    pub avg_depth: f64,
    /// Distinct structural signatures minus one.
    pub inconsistent_structures: usize,
    pub sample_size: usize,
}

impl NestingComplexity {
    /// Share of the sample with a structure differing from the first shape.
    pub fn inconsistency_ratio(&self) -> f64 {
        if self.sample_size == 0 {
            0.0
        } else {
            self.inconsistent_structures as f64 / self.sample_size as f64
        }
    }
}

/// How a nested batch should be flattened for tabular use.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", content = "fields", rename_all = "lowercase")]
pub enum FlatteningStrategy {
    /// Shallow enough to use as is.
    None,
    /// Flatten only paths up to three levels deep.
    Partial(Vec<String>),
    /// Flatten every path.
    Full(Vec<String>),
}

impl FlatteningStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Partial(_) => "partial",
            Self::Full(_) => "full",
        }
    }
}

/// Adapter for records with nested objects and arrays.
#[derive(Debug, Clone, Copy)]
pub struct NestedAdapter {
    policy: RowErrorPolicy,
    max_depth: usize,
}

impl Default for NestedAdapter {
    fn default() -> Self {
        Self {
            policy: RowErrorPolicy::default(),
            max_depth: DEFAULT_MAX_FIELD_DEPTH,
        }
    }
}

impl NestedAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the depth limit used when enumerating field paths.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Nesting statistics over the first rows of the batch.
    pub fn complexity(&self, records: &[Record]) -> NestingComplexity {
        let sample = &records[..records.len().min(COMPLEXITY_SAMPLE_SIZE)];
        let depths: Vec<usize> = sample.iter().map(record_depth).collect();
        let signatures: BTreeSet<String> = sample.iter().map(structure_signature).collect();
        NestingComplexity {
            max_depth: depths.iter().copied().max().unwrap_or(0),
            avg_depth: if depths.is_empty() {
                0.0
            } else {
                depths.iter().sum::<usize>() as f64 / depths.len() as f64
            },
            inconsistent_structures: signatures.len().saturating_sub(1),
            sample_size: sample.len(),
        }
    }

    /// Recommends how to flatten the batch.
    ///
    /// Depth up to 2 needs no flattening. Depth above 4, or more than half
    /// the sample deviating in shape, flattens only paths up to 3 levels.
    /// Otherwise every path is flattened.
    pub fn suggest_flattening_strategy(&self, records: &[Record]) -> FlatteningStrategy {
        let complexity = self.complexity(records);
        if complexity.max_depth <= 2 {
            return FlatteningStrategy::None;
        }
        let fields = records
            .first()
            .map(|first| get_all_nested_fields(first, self.max_depth))
            .unwrap_or_default();
        if complexity.max_depth > 4 || complexity.inconsistency_ratio() > 0.5 {
            FlatteningStrategy::Partial(
                fields
                    .into_iter()
                    .filter(|field| path_depth(field) <= 3)
                    .collect(),
            )
        } else {
            FlatteningStrategy::Full(fields)
        }
    }

    /// Fields resolvable in fewer than half of the first rows.
    fn sparse_fields(&self, records: &[Record]) -> Vec<String> {
        let Some(first) = records.first() else {
            return Vec::new();
        };
        let sample = &records[..records.len().min(ACCESSIBILITY_SAMPLE_SIZE)];
        get_all_nested_fields(first, self.max_depth)
            .into_iter()
            .filter(|field| {
                let hits = sample
                    .iter()
                    .filter(|record| resolve_path(record, field).is_some())
                    .count();
                (hits as f64) < sample.len() as f64 * 0.5
            })
            .collect()
    }

    /// Fully flattens nested objects into dotted keys.
    ///
    /// Arrays, dates and scalars are leaves; they are never descended into.
    pub fn flatten(record: &Record) -> Record {
        let mut out = Record::new();
        flatten_into(record, "", &mut out);
        out
    }
}

impl DataAdapter for NestedAdapter {
    fn name(&self) -> &'static str {
        "nested"
    }

    fn validate(&self, records: &[Record]) -> ValidationResult {
        let mut result = base_validate(records);
        if !result.is_valid || records.is_empty() {
            return result;
        }

        let complexity = self.complexity(records);
        if complexity.max_depth > WARN_DEPTH {
            result.warn_scaled(
                format!(
                    "records nest {} levels deep; consider flattening",
                    complexity.max_depth
                ),
                WARNING_PENALTY,
            );
        }
        if complexity.inconsistency_ratio() > 0.3 {
            result.warn_scaled(
                format!(
                    "{} of {} sampled records have a different structure",
                    complexity.inconsistent_structures, complexity.sample_size
                ),
                WARNING_PENALTY,
            );
        }

        let sparse = self.sparse_fields(records);
        if !sparse.is_empty() {
            result.warn_scaled(
                format!(
                    "{} field(s) resolve in fewer than half of sampled records: {}",
                    sparse.len(),
                    sparse.join(", ")
                ),
                WARNING_PENALTY,
            );
        }
        result
    }

    fn transform(&self, records: &[Record], config: &MappingConfig) -> Vec<ChartDataPoint> {
        extract_points(self.name(), records, config, self.policy, default_x)
    }
}

/// Nesting depth of a value: objects add a level over their deepest child,
/// arrays add a level over their first element, scalars are 0.
pub fn value_depth(value: &Value) -> usize {
    match value {
        Value::Object(map) => 1 + map.values().map(value_depth).max().unwrap_or(0),
        Value::Array(items) => 1 + items.first().map_or(0, value_depth),
        _ => 0,
    }
}

/// Nesting depth of a record; a flat record is depth 1.
pub fn record_depth(record: &Record) -> usize {
    1 + record.values().map(value_depth).max().unwrap_or(0)
}

/// Canonical shape string of a record: sorted keys with recursively typed
/// values, cut off below a fixed depth.
pub fn structure_signature(record: &Record) -> String {
    object_signature(record, 0)
}

fn object_signature(record: &Record, depth: usize) -> String {
    if depth >= SIGNATURE_DEPTH {
        return "object".to_string();
    }
    let entries: Vec<String> = record
        .iter()
        .map(|(key, value)| format!("{key}:{}", value_signature(value, depth + 1)))
        .collect();
    format!("{{{}}}", entries.join(","))
}

fn value_signature(value: &Value, depth: usize) -> String {
    match value {
        Value::Object(map) => object_signature(map, depth),
        Value::Array(_) if depth >= SIGNATURE_DEPTH => "array".to_string(),
        Value::Array(items) => match items.first() {
            Some(first) => format!("[{}]", value_signature(first, depth + 1)),
            None => "[]".to_string(),
        },
        other => other.kind().to_string(),
    }
}

/// Every dotted leaf path of a record, up to `max_depth` levels.
///
/// Arrays are listed as themselves; when their first element is an object
/// its keys are also listed one level in as `field[0].key`. Objects at the
/// depth limit are listed as leaves.
pub fn get_all_nested_fields(record: &Record, max_depth: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut fields = Vec::new();
    collect_nested_fields(record, "", 1, max_depth, &mut seen, &mut fields);
    fields
}

fn collect_nested_fields(
    record: &Record,
    prefix: &str,
    depth: usize,
    max_depth: usize,
    seen: &mut BTreeSet<String>,
    out: &mut Vec<String>,
) {
    for (key, value) in record {
        let path = join_path(prefix, key);
        match value {
            Value::Object(child) if depth < max_depth && !child.is_empty() => {
                collect_nested_fields(child, &path, depth + 1, max_depth, seen, out);
            }
            Value::Array(items) => {
                let element_keys: Vec<String> = match items.first() {
                    Some(Value::Object(first)) => {
                        first.keys().map(|sub| format!("{path}[0].{sub}")).collect()
                    }
                    _ => Vec::new(),
                };
                push_unique(path, seen, out);
                for element_path in element_keys {
                    push_unique(element_path, seen, out);
                }
            }
            _ => push_unique(path, seen, out),
        }
    }
}

fn push_unique(path: String, seen: &mut BTreeSet<String>, out: &mut Vec<String>) {
    if seen.insert(path.clone()) {
        out.push(path);
    }
}

fn flatten_into(record: &Record, prefix: &str, out: &mut Record) {
    for (key, value) in record {
        let path = join_path(prefix, key);
        match value {
            Value::Object(child) => flatten_into(child, &path, out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}
