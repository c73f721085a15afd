//! Ordered pattern tables and the value predicates built on them.
//!
//! Table order matters: when several patterns match a column, the earliest
//! one in its table names the column's subtype and format.

use std::ops::Range;
use std::sync::LazyLock;

use cdi_model::{Value, format_numeric};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc, Weekday};
use regex::{Captures, Regex};

/// Numbers in this range are read as unix seconds (years 2000 to 2100).
pub const UNIX_SECONDS_RANGE: Range<f64> = 946_684_800.0..4_102_444_800.0;

/// Numbers in this range are read as unix milliseconds (years 2000 to 2100).
pub const UNIX_MILLIS_RANGE: Range<f64> = 946_684_800_000.0..4_102_444_800_000.0;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// A value that satisfied one of the tables, with the index of the pattern
/// that matched (`None` for values that were already typed).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeMatch<T> {
    pub pattern: Option<usize>,
    pub value: T,
}

// === Dates ===

/// A recognizable date form.
#[derive(Debug)]
pub struct DatePattern {
    /// Subtype name, e.g. `iso-date`.
    pub name: &'static str,
    /// Display format, e.g. `YYYY-MM-DD`.
    pub format: &'static str,
    regex: Regex,
    parser: fn(&Captures<'_>) -> Option<DateTime<Utc>>,
}

impl DatePattern {
    fn new(
        name: &'static str,
        format: &'static str,
        pattern: &str,
        parser: fn(&Captures<'_>) -> Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            name,
            format,
            regex: Regex::new(pattern).expect("Invalid date pattern regex"),
            parser,
        }
    }

    /// Returns true when the text has this pattern's shape.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Parses text of this shape into a valid calendar date.
    pub fn parse(&self, text: &str) -> Option<DateTime<Utc>> {
        let caps = self.regex.captures(text)?;
        (self.parser)(&caps)
    }
}

static DATE_PATTERNS: LazyLock<Vec<DatePattern>> = LazyLock::new(|| {
    vec![
        DatePattern::new(
            "iso-datetime",
            "YYYY-MM-DDTHH:mm:ss",
            r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?$",
            parse_iso_datetime,
        ),
        DatePattern::new(
            "iso-date",
            "YYYY-MM-DD",
            r"^(\d{4})-(\d{1,2})-(\d{1,2})$",
            |caps| ymd(&caps[1], &caps[2], &caps[3]),
        ),
        DatePattern::new(
            "us-date",
            "MM/DD/YYYY",
            r"^(\d{1,2})/(\d{1,2})/(\d{4})$",
            |caps| ymd(&caps[3], &caps[1], &caps[2]),
        ),
        DatePattern::new(
            "eu-date",
            "DD.MM.YYYY",
            r"^(\d{1,2})\.(\d{1,2})\.(\d{4})$",
            |caps| ymd(&caps[3], &caps[2], &caps[1]),
        ),
        DatePattern::new(
            "cn-date",
            "YYYY年MM月DD日",
            r"^(\d{4})年(\d{1,2})月(\d{1,2})日$",
            |caps| ymd(&caps[1], &caps[2], &caps[3]),
        ),
        DatePattern::new("quarter", "YYYY-Q#", r"(?i)^(\d{4})-?Q([1-4])$", |caps| {
            let quarter: u32 = caps[2].parse().ok()?;
            ymd(&caps[1], &((quarter - 1) * 3 + 1).to_string(), "1")
        }),
        DatePattern::new("week", "YYYY-W##", r"(?i)^(\d{4})-?W(\d{2})$", |caps| {
            let year: i32 = caps[1].parse().ok()?;
            let week: u32 = caps[2].parse().ok()?;
            let date = NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)?;
            Some(date.and_hms_opt(0, 0, 0)?.and_utc())
        }),
        DatePattern::new(
            "month-name",
            "MMM DD, YYYY",
            r"(?i)^(?:(\d{1,2})\s+)?(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?(?:\s+(\d{1,2}))?,?\s+(\d{4})$",
            parse_month_name,
        ),
        DatePattern::new("unix-seconds", "X", r"^\d{10}$", |caps| {
            DateTime::from_timestamp(caps[0].parse().ok()?, 0)
        }),
        DatePattern::new("unix-millis", "x", r"^\d{13}$", |caps| {
            DateTime::from_timestamp_millis(caps[0].parse().ok()?)
        }),
    ]
});

/// The date table in priority order.
pub fn date_patterns() -> &'static [DatePattern] {
    &DATE_PATTERNS
}

fn date_pattern_index(name: &str) -> Option<usize> {
    DATE_PATTERNS.iter().position(|p| p.name == name)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn parse_iso_datetime(caps: &Captures<'_>) -> Option<DateTime<Utc>> {
    let text = caps[0].replacen(' ', "T", 1);
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(parsed) = DateTime::parse_from_str(&text, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    let naive = text.strip_suffix('Z').unwrap_or(&text);
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .into_iter()
        .find_map(|format| NaiveDateTime::parse_from_str(naive, format).ok())
        .map(|parsed| parsed.and_utc())
}

fn parse_month_name(caps: &Captures<'_>) -> Option<DateTime<Utc>> {
    let prefix = caps[2].get(..3)?.to_lowercase();
    let month = MONTHS.iter().position(|m| *m == prefix)? + 1;
    let day = caps.get(1).or_else(|| caps.get(3)).map_or("1", |m| m.as_str());
    ymd(&caps[4], &month.to_string(), day)
}

/// Matches trimmed text against the date table, returning the first pattern
/// that both matches and parses.
fn match_date_str(text: &str) -> Option<TypeMatch<DateTime<Utc>>> {
    DATE_PATTERNS.iter().enumerate().find_map(|(idx, pattern)| {
        pattern.parse(text).map(|value| TypeMatch {
            pattern: Some(idx),
            value,
        })
    })
}

/// Parses text in any recognized date form.
pub fn parse_date_str(text: &str) -> Option<DateTime<Utc>> {
    match_date_str(text.trim()).map(|m| m.value)
}

/// Reads a number in the unix seconds or milliseconds range as a date.
pub fn unix_number_to_date(n: f64) -> Option<TypeMatch<DateTime<Utc>>> {
    let (name, millis) = if UNIX_SECONDS_RANGE.contains(&n) {
        ("unix-seconds", n * 1000.0)
    } else if UNIX_MILLIS_RANGE.contains(&n) {
        ("unix-millis", n)
    } else {
        return None;
    };
    let value = DateTime::from_timestamp_millis(millis.round() as i64)?;
    Some(TypeMatch {
        pattern: date_pattern_index(name),
        value,
    })
}

/// Classifies a value as a date.
pub fn match_date(value: &Value) -> Option<TypeMatch<DateTime<Utc>>> {
    match value {
        Value::Date(date) => Some(TypeMatch {
            pattern: None,
            value: *date,
        }),
        Value::Number(n) => unix_number_to_date(*n),
        Value::String(s) => match_date_str(s.trim()),
        _ => None,
    }
}

pub fn is_date_value(value: &Value) -> bool {
    match_date(value).is_some()
}

// === Numbers ===

/// A recognizable numeric text form.
#[derive(Debug)]
pub struct NumberPattern {
    pub name: &'static str,
    pub format: &'static str,
    regex: Regex,
}

impl NumberPattern {
    fn new(name: &'static str, format: &'static str, pattern: &str) -> Self {
        Self {
            name,
            format,
            regex: Regex::new(pattern).expect("Invalid number pattern regex"),
        }
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

static NUMBER_PATTERNS: LazyLock<Vec<NumberPattern>> = LazyLock::new(|| {
    vec![
        NumberPattern::new(
            "currency-usd",
            "$#,##0.00",
            r"^-?\$\s?-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$",
        ),
        NumberPattern::new("percentage", "0.00%", r"^[-+]?\d+(?:\.\d+)?\s?%$"),
        NumberPattern::new(
            "decimal-2",
            "#,##0.00",
            r"^[-+]?(?:\d{1,3}(?:,\d{3})+|\d+)\.\d{2}$",
        ),
        NumberPattern::new("integer-with-commas", "#,##0", r"^[-+]?\d{1,3}(?:,\d{3})+$"),
        NumberPattern::new("integer", "0", r"^[-+]?\d+$"),
        NumberPattern::new("decimal", "0.0", r"^[-+]?(?:\d+\.\d*|\.\d+)$"),
        NumberPattern::new(
            "scientific",
            "0.00E+00",
            r"^[-+]?(?:\d+\.?\d*|\.\d+)[eE][-+]?\d+$",
        ),
    ]
});

/// The number table in priority order.
pub fn number_patterns() -> &'static [NumberPattern] {
    &NUMBER_PATTERNS
}

/// Parses numeric text after stripping thousands separators, currency and
/// percent signs and whitespace. Non-finite results are rejected.
pub fn parse_number_str(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '%') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn number_pattern_index(text: &str) -> Option<usize> {
    NUMBER_PATTERNS.iter().position(|p| p.is_match(text))
}

/// Classifies a value as a number.
pub fn match_number(value: &Value) -> Option<TypeMatch<f64>> {
    match value {
        Value::Number(n) if n.is_finite() => Some(TypeMatch {
            pattern: number_pattern_index(&format_numeric(*n)),
            value: *n,
        }),
        Value::String(s) => {
            let trimmed = s.trim();
            let value = parse_number_str(trimmed)?;
            Some(TypeMatch {
                pattern: number_pattern_index(trimmed),
                value,
            })
        }
        _ => None,
    }
}

pub fn is_number_value(value: &Value) -> bool {
    match_number(value).is_some()
}

// === Booleans ===

/// A pair of boolean keywords, compared case-insensitively.
#[derive(Debug, Clone, Copy)]
pub struct BooleanKeywords {
    pub name: &'static str,
    pub truthy: &'static str,
    pub falsy: &'static str,
}

impl BooleanKeywords {
    const fn new(name: &'static str, truthy: &'static str, falsy: &'static str) -> Self {
        Self {
            name,
            truthy,
            falsy,
        }
    }

    /// Display format, e.g. `yes/no`.
    pub fn format(&self) -> String {
        format!("{}/{}", self.truthy, self.falsy)
    }
}

pub const BOOLEAN_KEYWORDS: &[BooleanKeywords] = &[
    BooleanKeywords::new("true-false", "true", "false"),
    BooleanKeywords::new("one-zero", "1", "0"),
    BooleanKeywords::new("yes-no", "yes", "no"),
    BooleanKeywords::new("y-n", "y", "n"),
    BooleanKeywords::new("cn-yes-no", "是", "否"),
    BooleanKeywords::new("on-off", "on", "off"),
    BooleanKeywords::new("enabled-disabled", "enabled", "disabled"),
];

fn match_boolean_str(text: &str) -> Option<TypeMatch<bool>> {
    let lower = text.trim().to_lowercase();
    BOOLEAN_KEYWORDS
        .iter()
        .enumerate()
        .find_map(|(idx, keywords)| {
            let value = if lower == keywords.truthy {
                true
            } else if lower == keywords.falsy {
                false
            } else {
                return None;
            };
            Some(TypeMatch {
                pattern: Some(idx),
                value,
            })
        })
}

/// Parses a boolean keyword.
pub fn parse_boolean_str(text: &str) -> Option<bool> {
    match_boolean_str(text).map(|m| m.value)
}

/// Classifies a value as a boolean. Numbers qualify only when 0 or 1.
pub fn match_boolean(value: &Value) -> Option<TypeMatch<bool>> {
    match value {
        Value::Bool(b) => Some(TypeMatch {
            pattern: Some(0),
            value: *b,
        }),
        Value::Number(n) if *n == 0.0 || *n == 1.0 => Some(TypeMatch {
            pattern: Some(1),
            value: *n == 1.0,
        }),
        Value::String(s) => match_boolean_str(s),
        _ => None,
    }
}

pub fn is_boolean_value(value: &Value) -> bool {
    match_boolean(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn ymd_utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_date_forms() {
        assert_eq!(parse_date_str("2024-01-15"), Some(ymd_utc(2024, 1, 15)));
        assert_eq!(parse_date_str("1/5/2024"), Some(ymd_utc(2024, 1, 5)));
        assert_eq!(parse_date_str("15.01.2024"), Some(ymd_utc(2024, 1, 15)));
        assert_eq!(parse_date_str("2024年3月8日"), Some(ymd_utc(2024, 3, 8)));
        assert_eq!(parse_date_str("2024-Q3"), Some(ymd_utc(2024, 7, 1)));
        assert_eq!(parse_date_str("2024-W01"), Some(ymd_utc(2024, 1, 1)));
        assert_eq!(parse_date_str("January 15, 2024"), Some(ymd_utc(2024, 1, 15)));
        assert_eq!(parse_date_str("15 Jan 2024"), Some(ymd_utc(2024, 1, 15)));
        assert_eq!(parse_date_str("Sep 2023"), Some(ymd_utc(2023, 9, 1)));
        assert_eq!(parse_date_str("1704067200"), Some(ymd_utc(2024, 1, 1)));
        assert_eq!(parse_date_str("1704067200000"), Some(ymd_utc(2024, 1, 1)));
    }

    #[test]
    fn test_parse_iso_datetime_variants() {
        let dt = parse_date_str("2024-01-15T10:30:00Z").unwrap();
        assert_eq!((dt.day(), dt.hour(), dt.minute()), (15, 10, 30));
        let offset = parse_date_str("2024-01-15T10:30:00+02:00").unwrap();
        assert_eq!(offset.hour(), 8);
        let spaced = parse_date_str("2024-01-15 10:30").unwrap();
        assert_eq!(spaced.minute(), 30);
    }

    #[test]
    fn test_rejects_impossible_dates() {
        assert_eq!(parse_date_str("2024-02-30"), None);
        assert_eq!(parse_date_str("13/45/2024"), None);
        assert_eq!(parse_date_str("hello"), None);
        assert_eq!(parse_date_str("2024"), None);
    }

    #[test]
    fn test_unix_number_ranges() {
        let secs = unix_number_to_date(1_704_067_200.0).unwrap();
        assert_eq!(secs.value, ymd_utc(2024, 1, 1));
        assert_eq!(date_patterns()[secs.pattern.unwrap()].name, "unix-seconds");
        let millis = unix_number_to_date(1_704_067_200_000.0).unwrap();
        assert_eq!(date_patterns()[millis.pattern.unwrap()].name, "unix-millis");
        assert!(unix_number_to_date(42.0).is_none());
    }

    #[test]
    fn test_parse_number_str() {
        assert_eq!(parse_number_str("$1,234.50"), Some(1234.5));
        assert_eq!(parse_number_str("45%"), Some(45.0));
        assert_eq!(parse_number_str(" -3e2 "), Some(-300.0));
        assert_eq!(parse_number_str("abc"), None);
        assert_eq!(parse_number_str("NaN"), None);
        assert_eq!(parse_number_str("inf"), None);
        assert_eq!(parse_number_str(""), None);
    }

    #[test]
    fn test_number_pattern_priority() {
        let name = |text: &str| {
            match_number(&Value::from(text))
                .and_then(|m| m.pattern)
                .map(|idx| number_patterns()[idx].name)
        };
        assert_eq!(name("$1,234.56"), Some("currency-usd"));
        assert_eq!(name("12.5%"), Some("percentage"));
        assert_eq!(name("1,234.56"), Some("decimal-2"));
        assert_eq!(name("1,234"), Some("integer-with-commas"));
        assert_eq!(name("42"), Some("integer"));
        assert_eq!(name("3.14159"), Some("decimal"));
        assert_eq!(name("6.02e23"), Some("scientific"));
    }

    #[test]
    fn test_boolean_keywords() {
        assert_eq!(parse_boolean_str("YES"), Some(true));
        assert_eq!(parse_boolean_str("off"), Some(false));
        assert_eq!(parse_boolean_str("否"), Some(false));
        assert_eq!(parse_boolean_str("Enabled"), Some(true));
        assert_eq!(parse_boolean_str("maybe"), None);
        assert!(is_boolean_value(&Value::Number(0.0)));
        assert!(!is_boolean_value(&Value::Number(2.0)));
    }

    #[test]
    fn test_date_value_kinds() {
        assert!(is_date_value(&Value::Date(ymd_utc(2024, 1, 1))));
        assert!(is_date_value(&Value::Number(1_704_067_200.0)));
        assert!(!is_date_value(&Value::Number(100.0)));
        assert!(!is_date_value(&Value::Bool(true)));
        assert_eq!(ymd_utc(2024, 1, 1).year(), 2024);
    }
}
