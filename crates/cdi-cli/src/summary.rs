use std::collections::{BTreeMap, BTreeSet};

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use cdi_adapt::{FlatteningStrategy, NestingComplexity, TimeInterval};
use cdi_map::FieldAnalysis;
use cdi_model::{
    ChartDataPoint, ChartTypeSuggestion, ColumnTypeInfo, PivotAnalysis, PivotConfig, Record,
    ValidationResult, Value, format_numeric,
};

/// Rows printed before a table is cut short.
const MAX_TABLE_ROWS: usize = 50;

pub fn print_column_types(types: &BTreeMap<String, ColumnTypeInfo>) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Subtype"),
        header_cell("Confidence"),
        header_cell("Nulls"),
        header_cell("Samples"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for (field, info) in types {
        let samples: Vec<String> = info.samples.iter().map(Value::to_key_string).collect();
        table.add_row(vec![
            field_cell(field),
            Cell::new(info.column_type),
            optional_cell(info.subtype.as_deref()),
            confidence_cell(info.confidence),
            count_cell(info.null_count, Color::Yellow),
            Cell::new(samples.join(", ")),
        ]);
    }
    println!("Column types:");
    println!("{table}");
}

pub fn print_field_suggestions(analyses: &[FieldAnalysis], limit: usize) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Type"),
        header_cell("Role"),
        header_cell("Confidence"),
        header_cell("Distinct"),
        header_cell("Score"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Center);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    for analysis in analyses.iter().take(limit) {
        table.add_row(vec![
            field_cell(&analysis.field),
            Cell::new(analysis.field_type),
            Cell::new(analysis.suggested_role).add_attribute(Attribute::Bold),
            confidence_cell(analysis.confidence),
            Cell::new(analysis.distinct_values),
            dim_cell(analysis.explain()),
        ]);
    }
    println!("Field suggestions:");
    println!("{table}");
    if analyses.len() > limit {
        println!("({} more fields not shown)", analyses.len() - limit);
    }
}

pub fn print_chart_types(suggestions: &[ChartTypeSuggestion]) {
    if suggestions.is_empty() {
        println!("Chart types: none suggested");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Chart"),
        header_cell("Confidence"),
        header_cell("Reason"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for suggestion in suggestions {
        table.add_row(vec![
            Cell::new(suggestion.chart_type).add_attribute(Attribute::Bold),
            confidence_cell(suggestion.confidence),
            Cell::new(&suggestion.reason),
        ]);
    }
    println!("Chart types:");
    println!("{table}");
}

pub fn print_mapping(mapping: Option<&BTreeMap<String, String>>) {
    let Some(mapping) = mapping else {
        println!("Mapping: none (no numeric y field found)");
        return;
    };
    let mut table = Table::new();
    table.set_header(vec![header_cell("Role"), header_cell("Field")]);
    apply_table_style(&mut table);
    for (role, field) in mapping {
        table.add_row(vec![Cell::new(role).add_attribute(Attribute::Bold), field_cell(field)]);
    }
    println!("Suggested mapping:");
    println!("{table}");
}

pub fn print_pivot_suggestion(config: Option<&PivotConfig>) {
    match config {
        Some(PivotConfig::WideToLong {
            id_columns,
            value_columns,
            ..
        }) => println!(
            "Suggested reshape: wide-to-long keeping [{}], melting [{}]",
            id_columns.join(", "),
            value_columns.join(", ")
        ),
        Some(other) => println!("Suggested reshape: {}", other.kind()),
        None => {}
    }
}

pub fn print_validation(adapter: &str, result: &ValidationResult) {
    let status = if result.is_valid {
        Cell::new("VALID").fg(Color::Green).add_attribute(Attribute::Bold)
    } else {
        Cell::new("INVALID").fg(Color::Red).add_attribute(Attribute::Bold)
    };
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Adapter"),
        header_cell("Status"),
        header_cell("Confidence"),
        header_cell("Errors"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Right);
    table.add_row(vec![
        Cell::new(adapter).fg(Color::Blue).add_attribute(Attribute::Bold),
        status,
        confidence_cell(result.confidence),
        count_cell(result.errors.len(), Color::Red),
        count_cell(result.warnings.len(), Color::Yellow),
    ]);
    println!("{table}");
    print_messages(result);
}

fn print_messages(result: &ValidationResult) {
    if result.errors.is_empty() && result.warnings.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![header_cell("Severity"), header_cell("Message")]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for error in &result.errors {
        table.add_row(vec![Cell::new("ERROR").fg(Color::Red), Cell::new(error)]);
    }
    for warning in &result.warnings {
        table.add_row(vec![Cell::new("WARN").fg(Color::Yellow), Cell::new(warning)]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

pub fn print_points(points: &[ChartDataPoint]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Index"),
        header_cell("X"),
        header_cell("Y"),
        header_cell("Color"),
        header_cell("Size"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for point in points.iter().take(MAX_TABLE_ROWS) {
        table.add_row(vec![
            dim_cell(point.index),
            Cell::new(point.x.to_key_string()),
            Cell::new(format_numeric(point.y)),
            value_cell(point.color.as_ref()),
            value_cell(point.size.as_ref()),
        ]);
    }
    println!("{table}");
    print_truncation(points.len());
}

pub fn print_records(records: &[Record]) {
    let columns: BTreeSet<&String> = records.iter().flat_map(|record| record.keys()).collect();
    let mut table = Table::new();
    table.set_header(columns.iter().map(|column| header_cell(column)).collect::<Vec<_>>());
    apply_table_style(&mut table);
    for record in records.iter().take(MAX_TABLE_ROWS) {
        table.add_row(
            columns
                .iter()
                .map(|column| value_cell(record.get(*column)))
                .collect::<Vec<_>>(),
        );
    }
    println!("{table}");
    print_truncation(records.len());
}

pub fn print_pivot_analysis(analysis: &PivotAnalysis) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Property"), header_cell("Value")]);
    apply_table_style(&mut table);
    let wide = if analysis.is_wide_format {
        Cell::new("yes").fg(Color::Green)
    } else {
        dim_cell("no")
    };
    table.add_row(vec![Cell::new("Wide format"), wide]);
    table.add_row(vec![Cell::new("Confidence"), confidence_cell(analysis.confidence)]);
    table.add_row(vec![
        Cell::new("Value columns"),
        list_cell(&analysis.value_columns),
    ]);
    table.add_row(vec![
        Cell::new("Identifier columns"),
        list_cell(&analysis.identifier_columns),
    ]);
    table.add_row(vec![
        Cell::new("Duplicate key rows"),
        count_cell(analysis.duplicate_key_pairs, Color::Yellow),
    ]);
    println!("Pivot analysis:");
    println!("{table}");
}

/// Structure report for `inspect`.
pub struct Inspection<'a> {
    pub adapter: &'a str,
    pub records: usize,
    pub fields: &'a [String],
    pub complexity: &'a NestingComplexity,
    pub flattening: &'a FlatteningStrategy,
    pub time_fields: &'a [String],
    pub interval: Option<TimeInterval>,
}

pub fn print_inspection(inspection: &Inspection<'_>) {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Property"), header_cell("Value")]);
    apply_table_style(&mut table);
    table.add_row(vec![
        Cell::new("Adapter"),
        Cell::new(inspection.adapter).fg(Color::Blue).add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("Records"), Cell::new(inspection.records)]);
    table.add_row(vec![Cell::new("Fields"), list_cell(inspection.fields)]);
    table.add_row(vec![
        Cell::new("Max depth"),
        Cell::new(inspection.complexity.max_depth),
    ]);
    table.add_row(vec![
        Cell::new("Average depth"),
        Cell::new(format!("{:.2}", inspection.complexity.avg_depth)),
    ]);
    table.add_row(vec![
        Cell::new("Structure variants"),
        count_cell(inspection.complexity.inconsistent_structures, Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Flattening"),
        Cell::new(inspection.flattening.name()),
    ]);
    table.add_row(vec![Cell::new("Time fields"), list_cell(inspection.time_fields)]);
    table.add_row(vec![
        Cell::new("Time interval"),
        inspection
            .interval
            .map_or_else(|| dim_cell("-"), Cell::new),
    ]);
    println!("{table}");
}

fn print_truncation(total: usize) {
    if total > MAX_TABLE_ROWS {
        println!("({} of {total} rows shown; use --format json for all)", MAX_TABLE_ROWS);
    }
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(100);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn field_cell(field: &str) -> Cell {
    Cell::new(field).fg(Color::Blue)
}

fn confidence_cell(confidence: f64) -> Cell {
    let color = if confidence >= 0.7 {
        Color::Green
    } else if confidence >= 0.4 {
        Color::Yellow
    } else {
        Color::Red
    };
    Cell::new(format!("{confidence:.2}")).fg(color)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    value.map_or_else(|| dim_cell("-"), Cell::new)
}

fn value_cell(value: Option<&Value>) -> Cell {
    match value {
        None | Some(Value::Null) => dim_cell("-"),
        Some(value) => Cell::new(value.to_key_string()),
    }
}

fn list_cell(values: &[String]) -> Cell {
    if values.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(values.join(", "))
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
