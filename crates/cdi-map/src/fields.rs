//! Field path enumeration for suggestion heuristics.

use cdi_model::{Record, Value, join_path, resolve_path};

/// Deepest object nesting followed when enumerating fields.
pub const DEFAULT_MAX_DEPTH: usize = 4;

/// Lists the field paths of a record.
///
/// Objects are descended up to `max_depth` levels; an object at the limit is
/// reported as a single field. Arrays are only peeked at their first element:
/// a scalar is reported as `field[0]` and an object's keys as `field[0].key`.
/// The array itself is never a field, and empty or nested arrays add nothing.
pub fn enumerate_fields(record: &Record, max_depth: usize) -> Vec<String> {
    let mut fields = Vec::new();
    walk(record, "", 1, max_depth, &mut fields);
    fields
}

fn walk(record: &Record, prefix: &str, depth: usize, max_depth: usize, out: &mut Vec<String>) {
    for (key, value) in record {
        let path = join_path(prefix, key);
        match value {
            Value::Object(child) if depth < max_depth && !child.is_empty() => {
                walk(child, &path, depth + 1, max_depth, out);
            }
            Value::Array(items) => match items.first() {
                Some(Value::Object(first)) => {
                    out.extend(first.keys().map(|sub| format!("{path}[0].{sub}")));
                }
                Some(Value::Array(_)) | None => {}
                Some(_) => out.push(format!("{path}[0]")),
            },
            _ => out.push(path),
        }
    }
}

/// Gathers the non-null values a path resolves to across all records.
pub fn collect_values<'r>(records: &'r [Record], path: &str) -> Vec<&'r Value> {
    records
        .iter()
        .filter_map(|record| resolve_path(record, path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: serde_json::Value) -> Record {
        cdi_model::record_from_json(json).unwrap()
    }

    #[test]
    fn test_nested_and_array_paths() {
        let rec = record(serde_json::json!({
            "id": 1,
            "user": {"name": "a", "geo": {"lat": 1.0}},
            "tags": ["x", "y"],
            "orders": [{"total": 5, "sku": "k"}]
        }));
        let fields = enumerate_fields(&rec, DEFAULT_MAX_DEPTH);
        assert_eq!(
            fields,
            vec![
                "id",
                "orders[0].sku",
                "orders[0].total",
                "tags[0]",
                "user.geo.lat",
                "user.name",
            ]
        );
    }

    #[test]
    fn test_arrays_are_never_fields_themselves() {
        let rec = record(serde_json::json!({
            "empty": [],
            "grid": [[1, 2], [3, 4]],
            "scores": [7, 9]
        }));
        let fields = enumerate_fields(&rec, DEFAULT_MAX_DEPTH);
        assert_eq!(fields, vec!["scores[0]"]);
        assert_eq!(
            collect_values(&[rec], &fields[0]),
            vec![&Value::Number(7.0)]
        );
    }

    #[test]
    fn test_depth_limit_reports_object_as_leaf() {
        let rec = record(serde_json::json!({"a": {"b": {"c": 1}}}));
        assert_eq!(enumerate_fields(&rec, 2), vec!["a.b"]);
        assert_eq!(enumerate_fields(&rec, 3), vec!["a.b.c"]);
    }

    #[test]
    fn test_collect_values_skips_nulls() {
        let records = vec![
            record(serde_json::json!({"a": 1})),
            record(serde_json::json!({"a": null})),
            record(serde_json::json!({"b": 2})),
        ];
        assert_eq!(collect_values(&records, "a"), vec![&Value::Number(1.0)]);
    }
}
