//! Integration tests for the data model.

use std::collections::BTreeMap;

use cdi_model::{
    ChartDataPoint, MappingConfig, PivotConfig, Record, Value, format_numeric, record_from_json,
    resolve_path,
};
use proptest::prelude::*;

fn order() -> Record {
    record_from_json(serde_json::json!({
        "id": 7,
        "customer": {"name": "Ada", "address": {"city": "Oslo"}},
        "items": [{"sku": "A1", "price": 12.5}]
    }))
    .unwrap()
}

#[test]
fn mapping_resolves_nested_paths() {
    let record = order();
    let config = MappingConfig::new().x("customer.address.city").y("items[0].price");
    let x = config.get("x").unwrap().resolve(&record);
    let y = config.get("y").unwrap().resolve(&record);
    assert_eq!(x, Value::from("Oslo"));
    assert_eq!(y, Value::Number(12.5));
}

#[test]
fn chart_point_serializes_extra_roles_inline() {
    let mut extra = BTreeMap::new();
    extra.insert("label".to_string(), Value::from("first"));
    let point = ChartDataPoint {
        x: Value::from("Oslo"),
        y: 12.5,
        color: None,
        size: Some(Value::Number(3.0)),
        extra,
        original_data: Record::new(),
        index: 0,
    };
    let json = serde_json::to_value(&point).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "x": "Oslo",
            "y": 12.5,
            "size": 3.0,
            "label": "first",
            "originalData": {},
            "index": 0
        })
    );
}

#[test]
fn pivot_config_round_trips_through_mapping() {
    let config = MappingConfig::new()
        .x("variable")
        .y("value")
        .with_pivot(PivotConfig::wide_to_long(
            vec!["region".to_string()],
            vec!["q1".to_string()],
        ));
    assert_eq!(config.pivot.as_ref().map(PivotConfig::kind), Some("wide-to-long"));
}

proptest! {
    #[test]
    fn format_numeric_matches_integer_display(n in -1_000_000i64..1_000_000) {
        prop_assert_eq!(format_numeric(n as f64), n.to_string());
    }

    #[test]
    fn top_level_keys_always_resolve(key in "[a-z]{1,8}", n in -1000.0f64..1000.0) {
        let mut record = Record::new();
        record.insert(key.clone(), Value::Number(n));
        prop_assert_eq!(resolve_path(&record, &key), Some(&Value::Number(n)));
    }
}
