//! End-to-end tests across the adapters.

use cdi_adapt::{
    Adapter, AdapterKind, CsvAdapter, CsvOptions, DataAdapter, NestedAdapter, PivotAdapter,
    RowErrorPolicy, TimeSeriesAdapter, analyze_pivotability, identify_value_columns,
    parse_csv, parse_csv_line, parse_json_records, perform_pivot, records_from_json,
};
use cdi_map::MappingSuggester;
use cdi_model::{FieldRef, MappingConfig, MappingRole, PivotConfig, Record, Value};
use proptest::prelude::*;

fn rows(json: serde_json::Value) -> Vec<Record> {
    records_from_json(json).unwrap()
}

#[test]
fn csv_text_to_ranked_suggestions() {
    let records = parse_csv("name,sales\nAlice,100\nBob,200", &CsvOptions::default());
    assert_eq!(
        records,
        rows(serde_json::json!([
            {"name": "Alice", "sales": 100},
            {"name": "Bob", "sales": 200}
        ]))
    );

    let suggestions = CsvAdapter::default().suggest(&records);
    assert_eq!(suggestions[0].field, "sales");
    assert_eq!(suggestions[0].suggested_role, MappingRole::Y);
    assert_eq!(suggestions[1].field, "name");
    assert_eq!(suggestions[1].suggested_role, MappingRole::X);
    assert!(suggestions[0].confidence > suggestions[1].confidence);
}

#[test]
fn quoted_delimiters_stay_in_one_cell() {
    assert_eq!(parse_csv_line("\"x, y\",2", ','), vec!["x, y", "2"]);
}

#[test]
fn csv_pipeline_with_suggested_config() {
    let adapter = CsvAdapter::default();
    let records = adapter.parse("region,sales\neast,12\nwest,n/a\nnorth,7\n");
    let report = adapter.validate(&records);
    assert!(report.is_valid);
    assert!(report.has_warnings());

    let config = MappingSuggester::new().suggest_config(&records).unwrap();
    let points = adapter
        .with_policy(RowErrorPolicy::Silent)
        .transform(&records, &config);
    let pairs: Vec<(String, f64)> = points.iter().map(|p| (p.x.to_key_string(), p.y)).collect();
    assert_eq!(pairs, vec![("east".to_string(), 12.0), ("north".to_string(), 7.0)]);
    assert_eq!(points[1].index, 2);
}

#[test]
fn validate_input_rejects_non_arrays() {
    for kind in AdapterKind::ALL {
        let adapter = Adapter::new(kind);
        let result = adapter.validate_input(&Value::from("not an array"));
        assert!(!result.is_valid, "{kind} accepted a string");
        assert_eq!(result.confidence, 0.0);

        let empty = adapter.validate_input(&Value::Array(Vec::new()));
        assert!(empty.is_valid, "{kind} rejected an empty batch");
        assert_eq!(empty.confidence, 0.5);
        assert_eq!(empty.warnings.len(), 1);
    }
}

#[test]
fn quarterly_wide_table_reshapes_to_long() {
    let records = rows(serde_json::json!([
        {"region": "north", "q1": 1, "q2": 2, "q3": 3, "q4": 4},
        {"region": "south", "q1": 5, "q2": 6, "q3": 7, "q4": 8},
        {"region": "east", "q1": 9, "q2": 10, "q3": 11, "q4": 12},
        {"region": "west", "q1": 13, "q2": 14, "q3": 15, "q4": 16},
        {"region": "central", "q1": 17, "q2": 18, "q3": 19, "q4": 20}
    ]));
    assert_eq!(identify_value_columns(&records), vec!["q1", "q2", "q3", "q4"]);
    let analysis = analyze_pivotability(&records);
    assert!(analysis.is_wide_format);
    assert_eq!(analysis.identifier_columns, vec!["region"]);

    let config = PivotAdapter::new().suggest_pivot_config(&records).unwrap();
    let long = perform_pivot(&records, &config);
    assert_eq!(long.len(), 20);
    for row in &long {
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["_originalIndex", "region", "value", "variable"]);
    }
    assert_eq!(long[19]["region"], Value::from("central"));
    assert_eq!(long[19]["value"], Value::Number(20.0));
}

#[test]
fn nested_json_to_points() {
    let records = parse_json_records(
        r#"[
            {"user": {"name": "ada", "plan": {"tier": "pro"}}, "usage": {"minutes": "1,250"}},
            {"user": {"name": "bob", "plan": {"tier": "free"}}, "usage": {"minutes": 40}},
            {"user": {"name": "cy", "plan": null}, "usage": {"minutes": 90}}
        ]"#,
    )
    .unwrap();
    assert_eq!(AdapterKind::detect(&records), AdapterKind::Nested);

    let config = MappingConfig::new()
        .x("user.name")
        .y("usage.minutes")
        .color("user.plan.tier");
    let points = NestedAdapter::new().transform(&records, &config);
    assert_eq!(points.len(), 3);
    assert_eq!(points[0].y, 1250.0);
    assert_eq!(points[1].color, Some(Value::from("free")));
    assert_eq!(points[2].color, None);
}

#[test]
fn array_fields_map_through_their_first_element() {
    let records = rows(serde_json::json!([
        {"tags": ["a", "b"], "sales": 1},
        {"tags": ["c"], "sales": 2}
    ]));
    let suggestions = MappingSuggester::new().suggest_mapping(&records);
    assert!(suggestions.iter().all(|s| s.field != "tags"));

    let config = MappingSuggester::new().suggest_config(&records).unwrap();
    let points = NestedAdapter::new().transform(&records, &config);
    let xs: Vec<Value> = points.iter().map(|p| p.x.clone()).collect();
    assert_eq!(xs, vec![Value::from("a"), Value::from("c")]);

    let bare = MappingConfig::new().x("tags").y("sales");
    for kind in AdapterKind::ALL {
        let adapter = Adapter::new(kind).with_policy(RowErrorPolicy::Silent);
        assert!(adapter.transform(&records, &bare).is_empty(), "{kind:?}");
    }
}

#[test]
fn accessor_fields_are_resolved() {
    let records = rows(serde_json::json!([
        {"first": "a", "last": "b", "n": 1},
        {"first": "c", "last": "d", "n": 2}
    ]));
    let full_name = FieldRef::accessor(|record: &Record| {
        let first = record.get("first").map(Value::to_key_string).unwrap_or_default();
        let last = record.get("last").map(Value::to_key_string).unwrap_or_default();
        Value::from(format!("{first} {last}"))
    });
    let config = MappingConfig::new().x(full_name).y("n");
    let points = Adapter::new(AdapterKind::Csv).transform(&records, &config);
    assert_eq!(points[1].x, Value::from("c d"));
}

#[test]
fn wide_to_long_then_long_to_wide_restores_columns() {
    let records = rows(serde_json::json!([
        {"id": "a", "x": 1, "y": 2},
        {"id": "b", "x": 3, "y": 4}
    ]));
    let long = perform_pivot(
        &records,
        &PivotConfig::wide_to_long(vec!["id".into()], vec!["x".into(), "y".into()]),
    );
    let wide = perform_pivot(
        &long,
        &PivotConfig::LongToWide {
            id_columns: vec!["id".into()],
            key_field: "variable".into(),
            value_field: "value".into(),
        },
    );
    assert_eq!(wide, records);
}

fn wide_records(rows: usize, columns: usize) -> Vec<Record> {
    (0..rows)
        .map(|i| {
            let mut record = Record::new();
            record.insert("id".to_string(), Value::from(format!("row-{i}")));
            for j in 0..columns {
                record.insert(format!("v{j}"), Value::Number((i * columns + j) as f64));
            }
            record
        })
        .collect()
}

proptest! {
    #[test]
    fn wide_to_long_yields_rows_times_value_columns(n in 1usize..12, m in 1usize..7) {
        let records = wide_records(n, m);
        let value_columns = identify_value_columns(&records);
        prop_assert_eq!(value_columns.len(), m);
        let config = PivotConfig::wide_to_long(vec!["id".to_string()], value_columns);
        prop_assert_eq!(perform_pivot(&records, &config).len(), n * m);
    }

    #[test]
    fn time_series_output_is_chronological(
        days in Just((1..=20).collect::<Vec<u32>>()).prop_shuffle()
    ) {
        let records: Vec<Record> = days
            .iter()
            .map(|day| {
                let mut record = Record::new();
                record.insert("date".to_string(), Value::from(format!("2024-03-{day:02}")));
                record.insert("v".to_string(), Value::Number(f64::from(*day)));
                record
            })
            .collect();
        let config = MappingConfig::new().x("date").y("v");
        let points = TimeSeriesAdapter::new().transform(&records, &config);
        prop_assert_eq!(points.len(), days.len());
        for pair in points.windows(2) {
            prop_assert!(pair[0].x.as_date() <= pair[1].x.as_date());
        }
    }
}
