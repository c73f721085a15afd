//! Quote-aware delimited text parsing with per-cell type inference.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use cdi_detect::{parse_date_str, parse_number_str};
use cdi_model::{Record, Value};
use regex::Regex;
use tracing::debug;

/// Cell shapes recognized as dates during parsing.
static CELL_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4})$").expect("Invalid cell date regex")
});

/// Options for [`parse_csv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvOptions {
    /// Field separator.
    pub delimiter: char,
    /// Whether the first line names the columns.
    pub has_header: bool,
    /// Whether whitespace-only lines are dropped.
    pub skip_empty_lines: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            has_header: true,
            skip_empty_lines: true,
        }
    }
}

impl CsvOptions {
    /// Tab-separated defaults.
    pub fn tsv() -> Self {
        Self::default().delimiter('\t')
    }

    #[must_use]
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    #[must_use]
    pub fn skip_empty_lines(mut self, skip_empty_lines: bool) -> Self {
        self.skip_empty_lines = skip_empty_lines;
        self
    }
}

/// Splits one line into raw fields.
///
/// A double quote toggles quoting; `""` inside quotes is a literal quote and
/// the delimiter inside quotes is not a split point. Fields are not trimmed.
pub fn parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if !in_quotes => {
                in_quotes = true;
            }
            '"' => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            c if c == delimiter && !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }

    fields.push(current);
    fields
}

/// Infers a typed value for one raw cell.
///
/// Blank cells are null; `true`/`false` are booleans; text that is numeric
/// after stripping `,`, `$` and `%` is a number; `YYYY-MM-DD` and `M/D/YYYY`
/// text that is a real calendar date is a date; anything else is trimmed text.
pub fn infer_cell(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Some(n) = parse_number_str(trimmed) {
        return Value::Number(n);
    }
    if CELL_DATE_REGEX.is_match(trimmed)
        && let Some(date) = parse_date_str(trimmed)
    {
        return Value::Date(date);
    }
    Value::from(trimmed)
}

/// Delimited text decoded into records, with the header line as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    /// Trimmed header cells; empty when the text has no header line.
    pub headers: Vec<String>,
    /// Column names used as record keys, one per header cell.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// Parses delimited text into records.
///
/// Without a header, columns are named `column_1`, `column_2`, and so on.
/// Short rows leave trailing columns null; with a header, cells beyond the
/// last named column are ignored.
pub fn parse_csv(text: &str, options: &CsvOptions) -> Vec<Record> {
    read_csv(text, options).records
}

/// Parses delimited text, keeping the header line.
///
/// Blank header cells are named `column_N` after their 1-based position and
/// repeated names get a `_2`, `_3`, ... suffix, so no column overwrites
/// another.
pub fn read_csv(text: &str, options: &CsvOptions) -> CsvTable {
    let mut lines = text
        .lines()
        .filter(|line| !options.skip_empty_lines || !line.trim().is_empty());

    let headers: Vec<String> = if options.has_header {
        let Some(header_line) = lines.next() else {
            return CsvTable::default();
        };
        parse_csv_line(header_line, options.delimiter)
            .iter()
            .map(|name| name.trim().to_string())
            .collect()
    } else {
        Vec::new()
    };
    let columns = unique_column_names(&headers);

    let records: Vec<Record> = lines
        .map(|line| {
            let cells = parse_csv_line(line, options.delimiter);
            if options.has_header {
                columns
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| {
                        let value = cells.get(idx).map_or(Value::Null, |cell| infer_cell(cell));
                        (name.clone(), value)
                    })
                    .collect()
            } else {
                cells
                    .iter()
                    .enumerate()
                    .map(|(idx, cell)| (format!("column_{}", idx + 1), infer_cell(cell)))
                    .collect()
            }
        })
        .collect();

    debug!(
        rows = records.len(),
        columns = columns.len(),
        delimiter = %options.delimiter.escape_default(),
        "parsed delimited text"
    );
    CsvTable {
        headers,
        columns,
        records,
    }
}

fn unique_column_names(headers: &[String]) -> Vec<String> {
    let mut seen: BTreeSet<String> = BTreeSet::new();
    headers
        .iter()
        .enumerate()
        .map(|(idx, header)| {
            let base = if header.is_empty() {
                format!("column_{}", idx + 1)
            } else {
                header.clone()
            };
            let mut name = base.clone();
            let mut suffix = 2;
            while seen.contains(&name) {
                name = format!("{base}_{suffix}");
                suffix += 1;
            }
            seen.insert(name.clone());
            name
        })
        .collect()
}
