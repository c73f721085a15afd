//! Wide-format detection.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use cdi_model::{PivotAnalysis, Record, Value, resolve_path};
use regex::Regex;
use tracing::debug;

use crate::clean::parse_number;

/// Rows inspected when classifying value columns.
const VALUE_SAMPLE_SIZE: usize = 20;

/// Share of sampled rows that must be numeric for a value column, and share
/// of names a naming pattern must cover.
const MAJORITY_RATIO: f64 = 0.7;

/// Value columns needed before a batch counts as wide.
const MIN_WIDE_VALUE_COLUMNS: usize = 3;

/// Column names that read as periods: `2024`, `2024-01`, `2024Q1`, `jan`, `Mar_2023`.
static DATE_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(?:\d{4}(?:[-_/.\s]?(?:\d{1,2}|q[1-4]))?|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*(?:[-_\s]?\d{2,4})?)$",
    )
    .expect("Invalid date column name regex")
});

static NUMERIC_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("Invalid numeric column name regex"));

/// Top-level fields of the first record that are numeric in at least 70% of
/// the first 20 rows. Missing values count against the field.
pub fn identify_value_columns(records: &[Record]) -> Vec<String> {
    let Some(first) = records.first() else {
        return Vec::new();
    };
    let sample = &records[..records.len().min(VALUE_SAMPLE_SIZE)];
    first
        .keys()
        .filter(|field| {
            let numeric = sample
                .iter()
                .filter(|record| resolve_path(record, field).and_then(parse_number).is_some())
                .count();
            numeric as f64 >= sample.len() as f64 * MAJORITY_RATIO
        })
        .cloned()
        .collect()
}

/// Top-level fields of the first record that are not value columns.
pub fn identify_id_columns(records: &[Record], value_columns: &[String]) -> Vec<String> {
    records
        .first()
        .map(|first| {
            first
                .keys()
                .filter(|field| !value_columns.contains(*field))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

/// Whether column names follow a shared pattern.
///
/// True when a common leading or trailing word, a period-like shape or a
/// plain number covers at least 70% of the names. Words end at digits and
/// at `_`, `-`, `.` or whitespace, so `sales_north`, `q1` and `2021_sales`
/// share the affixes `sales`, `q` and `sales` with their siblings.
pub fn has_naming_pattern(names: &[String]) -> bool {
    if names.is_empty() {
        return false;
    }
    let needed = names.len() as f64 * MAJORITY_RATIO;
    let covers = |count: usize| count as f64 >= needed;

    let prefixes = names
        .iter()
        .map(|name| name.trim().split(is_affix_boundary).next());
    let suffixes = names
        .iter()
        .map(|name| name.trim().rsplit(is_affix_boundary).next());
    if covers(most_common(prefixes)) || covers(most_common(suffixes)) {
        return true;
    }

    covers(names.iter().filter(|name| DATE_NAME_REGEX.is_match(name.trim())).count())
        || covers(names.iter().filter(|name| NUMERIC_NAME_REGEX.is_match(name.trim())).count())
}

fn is_affix_boundary(c: char) -> bool {
    c.is_ascii_digit() || c.is_whitespace() || matches!(c, '_' | '-' | '.')
}

/// Size of the largest group of equal non-empty affixes shared by at least
/// two names.
fn most_common<'a>(affixes: impl Iterator<Item = Option<&'a str>>) -> usize {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for affix in affixes.flatten() {
        *counts.entry(affix).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(affix, _)| !affix.is_empty())
        .map(|(_, count)| count)
        .filter(|count| *count > 1)
        .max()
        .unwrap_or(0)
}

/// Joins a record's values for `columns` into a group key.
pub(crate) fn group_key(record: &Record, columns: &[String]) -> String {
    columns
        .iter()
        .map(|column| resolve_path(record, column).map_or_else(String::new, Value::to_key_string))
        .collect::<Vec<_>>()
        .join("|")
}

/// Rows repeating an identifier tuple already seen in an earlier row.
pub fn count_duplicate_keys(records: &[Record], id_columns: &[String]) -> usize {
    if id_columns.is_empty() {
        return 0;
    }
    let mut groups: BTreeMap<String, usize> = BTreeMap::new();
    for record in records {
        *groups.entry(group_key(record, id_columns)).or_default() += 1;
    }
    groups.values().map(|size| size.saturating_sub(1)).sum()
}

/// Scores how well a batch fits a wide-to-long reshape.
///
/// Wide means more than three value columns alongside at least one id
/// column. Confidence is 0.4 for value columns outnumbering half of all
/// fields, 0.3 for having id columns and 0.3 for value columns sharing a
/// naming pattern.
pub fn analyze_pivotability(records: &[Record]) -> PivotAnalysis {
    let value_columns = identify_value_columns(records);
    let identifier_columns = identify_id_columns(records, &value_columns);
    let total_fields = value_columns.len() + identifier_columns.len();

    let mut tenths = 0u8;
    if value_columns.len() * 2 > total_fields {
        tenths += 4;
    }
    if !identifier_columns.is_empty() {
        tenths += 3;
    }
    if has_naming_pattern(&value_columns) {
        tenths += 3;
    }

    let analysis = PivotAnalysis {
        is_wide_format: value_columns.len() > MIN_WIDE_VALUE_COLUMNS
            && !identifier_columns.is_empty(),
        confidence: f64::from(tenths) / 10.0,
        has_multiple_value_columns: value_columns.len() > 1,
        duplicate_key_pairs: count_duplicate_keys(records, &identifier_columns),
        value_columns,
        identifier_columns,
    };
    debug!(
        wide = analysis.is_wide_format,
        confidence = analysis.confidence,
        value_columns = analysis.value_columns.len(),
        "analyzed pivotability"
    );
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::records_from_json;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| (*v).to_string()).collect()
    }

    #[test]
    fn test_naming_patterns() {
        assert!(has_naming_pattern(&names(&["q1", "q2", "q3", "q4"])));
        assert!(has_naming_pattern(&names(&["2021_sales", "2022_sales", "2023_sales"])));
        assert!(has_naming_pattern(&names(&["2021", "2022", "2023"])));
        assert!(has_naming_pattern(&names(&["jan", "feb", "mar", "total"])));
        assert!(!has_naming_pattern(&names(&["height", "weight", "age"])));
        assert!(!has_naming_pattern(&[]));
    }

    #[test]
    fn test_naming_patterns_with_word_affixes() {
        let regions = ["north", "south", "east", "west"];
        let prefixed: Vec<String> = regions.iter().map(|r| format!("sales_{r}")).collect();
        let suffixed: Vec<String> = regions.iter().map(|r| format!("{r}_sales")).collect();
        assert!(has_naming_pattern(&prefixed));
        assert!(has_naming_pattern(&suffixed));
        assert!(has_naming_pattern(&names(&["cost-a", "cost-b", "cost-c", "margin"])));
        assert!(!has_naming_pattern(&names(&["sales_north", "cost_south", "units_east"])));
    }

    #[test]
    fn test_regional_sales_table_is_confidently_wide() {
        let records = records_from_json(serde_json::json!([
            {"product": "a", "sales_north": 1, "sales_south": 2, "sales_east": 3, "sales_west": 4},
            {"product": "b", "sales_north": 5, "sales_south": 6, "sales_east": 7, "sales_west": 8}
        ]))
        .unwrap();
        let analysis = analyze_pivotability(&records);
        assert!(analysis.is_wide_format);
        assert_eq!(analysis.confidence, 1.0);
        assert_eq!(analysis.identifier_columns, names(&["product"]));
    }

    #[test]
    fn test_value_columns_need_numeric_majority() {
        let records = records_from_json(serde_json::json!([
            {"name": "a", "score": "1,200", "note": 1},
            {"name": "b", "score": 3, "note": "x"},
            {"name": "c", "score": null, "note": "y"}
        ]))
        .unwrap();
        assert!(identify_value_columns(&records).is_empty());
        let records = &records[..2];
        assert_eq!(identify_value_columns(records), names(&["score"]));
        assert_eq!(
            identify_id_columns(records, &names(&["score"])),
            names(&["name", "note"])
        );
    }

    #[test]
    fn test_duplicate_keys() {
        let records = records_from_json(serde_json::json!([
            {"k": "a", "v": 1},
            {"k": "a", "v": 2},
            {"k": "a", "v": 3},
            {"k": "b", "v": 4}
        ]))
        .unwrap();
        assert_eq!(count_duplicate_keys(&records, &names(&["k"])), 2);
        assert_eq!(count_duplicate_keys(&records, &[]), 0);
    }

    #[test]
    fn test_narrow_batch_is_not_wide() {
        let records = records_from_json(serde_json::json!([
            {"city": "a", "population": 10},
            {"city": "b", "population": 20}
        ]))
        .unwrap();
        let analysis = analyze_pivotability(&records);
        assert!(!analysis.is_wide_format);
        assert!(!analysis.has_multiple_value_columns);
        assert_eq!(analysis.confidence, 0.3);
    }
}
