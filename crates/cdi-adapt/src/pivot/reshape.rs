//! Reshape operations over record batches.

use std::collections::BTreeMap;

use cdi_model::{AggregateFunction, PivotConfig, Record, Value, resolve_path};
use tracing::debug;

use super::analysis::group_key;
use crate::clean::{clean_number, parse_number};

/// Output field carrying the source row position after a wide-to-long reshape.
pub const ORIGINAL_INDEX_FIELD: &str = "_originalIndex";

/// Applies a reshape.
pub fn perform_pivot(records: &[Record], config: &PivotConfig) -> Vec<Record> {
    let reshaped = match config {
        PivotConfig::WideToLong {
            id_columns,
            value_columns,
            variable_name,
            value_name,
        } => wide_to_long(records, id_columns, value_columns, variable_name, value_name),
        PivotConfig::LongToWide {
            id_columns,
            key_field,
            value_field,
        } => long_to_wide(records, id_columns, key_field, value_field),
        PivotConfig::GroupBy {
            group_by_fields,
            aggregate_fields,
            aggregate_function,
        } => group_by(records, group_by_fields, aggregate_fields, *aggregate_function),
    };
    debug!(
        kind = config.kind(),
        input = records.len(),
        output = reshaped.len(),
        "pivoted records"
    );
    reshaped
}

/// One output row per input row and value column.
///
/// Each output row carries the id columns, the value column's name under
/// `variable_name`, its cleaned number under `value_name`, and the input row
/// position under [`ORIGINAL_INDEX_FIELD`].
pub fn wide_to_long(
    records: &[Record],
    id_columns: &[String],
    value_columns: &[String],
    variable_name: &str,
    value_name: &str,
) -> Vec<Record> {
    let mut out = Vec::with_capacity(records.len() * value_columns.len());
    for (index, record) in records.iter().enumerate() {
        for column in value_columns {
            let mut row = copy_columns(record, id_columns);
            row.insert(variable_name.to_string(), Value::from(column.as_str()));
            let value = resolve_path(record, column).map_or(0.0, clean_number);
            row.insert(value_name.to_string(), Value::Number(value));
            row.insert(ORIGINAL_INDEX_FIELD.to_string(), Value::Number(index as f64));
            out.push(row);
        }
    }
    out
}

/// One output row per id tuple, in first-seen order.
///
/// Each row's `key_field` value names a new column holding the cleaned
/// number from `value_field`. Rows with a blank key are skipped; later rows
/// overwrite earlier ones for the same key.
pub fn long_to_wide(
    records: &[Record],
    id_columns: &[String],
    key_field: &str,
    value_field: &str,
) -> Vec<Record> {
    let mut groups = Groups::default();
    for record in records {
        let row = groups.entry(record, id_columns);
        let Some(key) = resolve_path(record, key_field).filter(|key| !key.is_blank()) else {
            continue;
        };
        let value = resolve_path(record, value_field).map_or(0.0, clean_number);
        row.insert(key.to_key_string(), Value::Number(value));
    }
    groups.rows
}

/// One output row per group tuple, in first-seen order.
///
/// Each aggregate field is reduced over the group's values that read as
/// numbers; a group with no such value reduces to 0.
pub fn group_by(
    records: &[Record],
    group_by_fields: &[String],
    aggregate_fields: &[String],
    function: AggregateFunction,
) -> Vec<Record> {
    let mut groups = Groups::default();
    let mut values: Vec<BTreeMap<&str, Vec<f64>>> = Vec::new();
    for record in records {
        groups.entry(record, group_by_fields);
        let slot = groups.last_index;
        if slot == values.len() {
            values.push(BTreeMap::new());
        }
        for field in aggregate_fields {
            let bucket = values[slot].entry(field.as_str()).or_default();
            if let Some(n) = resolve_path(record, field).and_then(parse_number) {
                bucket.push(n);
            }
        }
    }

    for (row, buckets) in groups.rows.iter_mut().zip(&values) {
        for field in aggregate_fields {
            let reduced = buckets
                .get(field.as_str())
                .map_or(0.0, |bucket| function.apply(bucket));
            row.insert(field.clone(), Value::Number(reduced));
        }
    }
    groups.rows
}

/// Output rows keyed by group tuple, kept in first-seen order.
#[derive(Default)]
struct Groups {
    index: BTreeMap<String, usize>,
    rows: Vec<Record>,
    last_index: usize,
}

impl Groups {
    /// Returns the output row for the record's group, creating it from the
    /// record's key columns on first sight.
    fn entry(&mut self, record: &Record, columns: &[String]) -> &mut Record {
        let key = group_key(record, columns);
        let slot = match self.index.get(&key) {
            Some(slot) => *slot,
            None => {
                self.rows.push(copy_columns(record, columns));
                self.index.insert(key, self.rows.len() - 1);
                self.rows.len() - 1
            }
        };
        self.last_index = slot;
        &mut self.rows[slot]
    }
}

fn copy_columns(record: &Record, columns: &[String]) -> Record {
    columns
        .iter()
        .map(|column| {
            let value = resolve_path(record, column).cloned().unwrap_or_default();
            (column.clone(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::records_from_json;

    fn rows(json: serde_json::Value) -> Vec<Record> {
        records_from_json(json).unwrap()
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_wide_to_long_rows() {
        let records = rows(serde_json::json!([
            {"region": "north", "q1": 10, "q2": "$1,200"},
            {"region": "south", "q1": null, "q2": 5}
        ]));
        let long = wide_to_long(
            &records,
            &names(&["region"]),
            &names(&["q1", "q2"]),
            "quarter",
            "sales",
        );
        assert_eq!(long.len(), 4);
        assert_eq!(
            serde_json::to_value(&long[1]).unwrap(),
            serde_json::json!({
                "_originalIndex": 0.0,
                "quarter": "q2",
                "region": "north",
                "sales": 1200.0
            })
        );
        assert_eq!(long[2]["sales"], Value::Number(0.0));
        assert_eq!(long[3][ORIGINAL_INDEX_FIELD], Value::Number(1.0));
    }

    #[test]
    fn test_long_to_wide() {
        let records = rows(serde_json::json!([
            {"region": "north", "quarter": "q1", "sales": 10},
            {"region": "south", "quarter": "q1", "sales": 7},
            {"region": "north", "quarter": "q2", "sales": "12"},
            {"region": "north", "quarter": null, "sales": 99}
        ]));
        let wide = long_to_wide(&records, &names(&["region"]), "quarter", "sales");
        assert_eq!(wide.len(), 2);
        assert_eq!(
            serde_json::to_value(&wide[0]).unwrap(),
            serde_json::json!({"q1": 10.0, "q2": 12.0, "region": "north"})
        );
        assert_eq!(
            serde_json::to_value(&wide[1]).unwrap(),
            serde_json::json!({"q1": 7.0, "region": "south"})
        );
    }

    #[test]
    fn test_group_by_functions() {
        let records = rows(serde_json::json!([
            {"team": "a", "points": 3},
            {"team": "b", "points": 4},
            {"team": "a", "points": "n/a"},
            {"team": "a", "points": 5},
            {"team": "c", "points": null}
        ]));
        let fields = names(&["points"]);
        let keys = names(&["team"]);

        let sums = group_by(&records, &keys, &fields, AggregateFunction::Sum);
        let totals: Vec<(String, f64)> = sums
            .iter()
            .map(|row| (row["team"].to_key_string(), row["points"].as_f64().unwrap()))
            .collect();
        assert_eq!(
            totals,
            vec![("a".to_string(), 8.0), ("b".to_string(), 4.0), ("c".to_string(), 0.0)]
        );

        let avg = group_by(&records, &keys, &fields, AggregateFunction::Avg);
        assert_eq!(avg[0]["points"], Value::Number(4.0));
        let count = group_by(&records, &keys, &fields, AggregateFunction::Count);
        assert_eq!(count[0]["points"], Value::Number(2.0));
        assert_eq!(count[2]["points"], Value::Number(0.0));
    }

    #[test]
    fn test_perform_pivot_dispatches() {
        let records = rows(serde_json::json!([
            {"id": 1, "a": 1, "b": 2}
        ]));
        let config = PivotConfig::wide_to_long(names(&["id"]), names(&["a", "b"]));
        let long = perform_pivot(&records, &config);
        assert_eq!(long.len(), 2);
        assert_eq!(long[0]["variable"], Value::from("a"));
        assert_eq!(long[1]["value"], Value::Number(2.0));
    }
}
