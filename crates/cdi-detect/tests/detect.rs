//! Integration tests for column type detection.

use cdi_detect::{TypeDetector, is_number_value, parse_date_str};
use cdi_model::{ColumnType, Value};
use proptest::prelude::*;

#[test]
fn mixed_date_forms_use_first_table_pattern() {
    let values: Vec<Value> = ["03/15/2024", "2024-03-16T08:00:00Z", "2024-03-17"]
        .into_iter()
        .map(Value::from)
        .collect();
    let info = TypeDetector::new().detect_column_type(&values);
    assert_eq!(info.column_type, ColumnType::Date);
    assert_eq!(info.subtype.as_deref(), Some("iso-datetime"));
}

#[test]
fn currency_column_is_numeric() {
    let values: Vec<Value> = ["$1,200.00", "$950.50", "$12.00"]
        .into_iter()
        .map(Value::from)
        .collect();
    let info = TypeDetector::new().detect_column_type(&values);
    assert_eq!(info.column_type, ColumnType::Number);
    assert_eq!(info.subtype.as_deref(), Some("currency-usd"));
    assert!(values.iter().all(is_number_value));
}

#[test]
fn chinese_dates_parse() {
    let values: Vec<Value> = ["2023年1月5日", "2023年12月31日"]
        .into_iter()
        .map(Value::from)
        .collect();
    let info = TypeDetector::new().detect_column_type(&values);
    assert_eq!(info.column_type, ColumnType::Date);
    assert_eq!(info.subtype.as_deref(), Some("cn-date"));
}

proptest! {
    #[test]
    fn iso_date_columns_are_fully_confident(
        dates in prop::collection::vec((2000i32..2100, 1u32..=12, 1u32..=28), 1..40)
    ) {
        let values: Vec<Value> = dates
            .iter()
            .map(|(y, m, d)| Value::from(format!("{y:04}-{m:02}-{d:02}")))
            .collect();
        let info = TypeDetector::new().detect_column_type(&values);
        prop_assert_eq!(info.column_type, ColumnType::Date);
        prop_assert_eq!(info.confidence, 1.0);
        for (y, m, d) in dates {
            let date = format!("{y:04}-{m:02}-{d:02}");
            prop_assert!(parse_date_str(&date).is_some());
        }
    }

    #[test]
    fn half_numeric_half_text_is_half_confident(
        numbers in prop::collection::vec(1u32..100_000, 1..20),
        words in prop::collection::vec("[a-z]{3,10}", 20)
    ) {
        let n = numbers.len();
        let mut values: Vec<Value> = numbers.iter().map(|v| Value::from(v.to_string())).collect();
        values.extend(
            words
                .iter()
                .take(n)
                .map(|w| Value::from(format!("{w} text"))),
        );
        let info = TypeDetector::new().detect_column_type(&values);
        prop_assert_eq!(info.column_type, ColumnType::Number);
        prop_assert!((info.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn confidence_is_a_fraction(values in prop::collection::vec(".{0,12}", 0..30)) {
        let values: Vec<Value> = values.into_iter().map(Value::from).collect();
        let info = TypeDetector::new().detect_column_type(&values);
        prop_assert!((0.0..=1.0).contains(&info.confidence));
        prop_assert!(info.null_count <= values.len());
    }
}
