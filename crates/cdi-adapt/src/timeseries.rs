//! Adapter for chronologically ordered data.

use std::fmt;
use std::sync::LazyLock;

use cdi_detect::{UNIX_MILLIS_RANGE, UNIX_SECONDS_RANGE, parse_date_str};
use cdi_model::{ChartDataPoint, MappingConfig, Record, ValidationResult, Value, resolve_path};
use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;

use crate::contract::{DataAdapter, RowErrorPolicy, base_validate, extract_points};
use crate::error::{AdapterError, RowError};

/// Text shapes accepted as time values.
static TIME_FORMATS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?$",
        r"^\d{4}-\d{1,2}-\d{1,2}$",
        r"^\d{1,2}/\d{1,2}/\d{4}$",
        r"^\d{1,2}\.\d{1,2}\.\d{4}$",
        r"^\d{4}年\d{1,2}月\d{1,2}日$",
        r"^\d{10}$",
        r"^\d{13}$",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("Invalid time format regex"))
    .collect()
});

/// Chinese date literal anywhere in the text.
static CN_DATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日").expect("Invalid Chinese date regex")
});

/// Field names that suggest a time axis.
static TIME_FIELD_NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)time|date|timestamp|created|updated|year|month|day")
        .expect("Invalid time field name regex")
});

/// Values inspected per field when looking for time fields.
const TIME_FIELD_SAMPLE_SIZE: usize = 20;

/// Share of sampled values that must be times for a field to qualify.
const TIME_FIELD_RATIO: f64 = 0.7;

/// Parse success rate below which validation warns.
const MIN_PARSE_RATE: f64 = 0.8;

/// Consecutive gaps inspected for cadence checks.
const CADENCE_GAPS: usize = 10;

/// Gaps inspected for interval classification.
const INTERVAL_GAPS: usize = 9;

/// Confidence multiplier per time-series warning.
const WARNING_PENALTY: f64 = 0.9;

const MINUTE_MS: f64 = 60_000.0;
const HOUR_MS: f64 = 60.0 * MINUTE_MS;
const DAY_MS: f64 = 24.0 * HOUR_MS;

/// Dominant spacing of a time series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInterval {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl TimeInterval {
    /// Classifies a mean gap in milliseconds.
    pub fn from_mean_gap(mean_ms: f64) -> Self {
        if mean_ms < HOUR_MS {
            Self::Minute
        } else if mean_ms < DAY_MS {
            Self::Hour
        } else if mean_ms < 7.0 * DAY_MS {
            Self::Day
        } else if mean_ms < 28.0 * DAY_MS {
            Self::Week
        } else if mean_ms < 365.0 * DAY_MS {
            Self::Month
        } else {
            Self::Year
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads a value as a point in time.
///
/// Numbers in the unix seconds or milliseconds ranges are read as such,
/// four-digit integers as January 1st of that year, and any other number as
/// epoch milliseconds. Text may hold a Chinese date literal anywhere, a bare
/// four-digit year, or any recognized date form.
pub fn parse_time_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Date(date) => Some(*date),
        Value::Number(n) => parse_time_number(*n),
        Value::String(s) => parse_time_str(s.trim()),
        _ => None,
    }
}

fn parse_time_number(n: f64) -> Option<DateTime<Utc>> {
    if !n.is_finite() {
        return None;
    }
    if UNIX_SECONDS_RANGE.contains(&n) {
        return DateTime::from_timestamp_millis((n * 1000.0).round() as i64);
    }
    if UNIX_MILLIS_RANGE.contains(&n) {
        return DateTime::from_timestamp_millis(n.round() as i64);
    }
    if n.fract() == 0.0 && (1000.0..=9999.0).contains(&n) {
        return year_start(n as i32);
    }
    DateTime::from_timestamp_millis(n.round() as i64)
}

fn parse_time_str(text: &str) -> Option<DateTime<Utc>> {
    if text.is_empty() {
        return None;
    }
    if let Some(caps) = CN_DATE_REGEX.captures(text) {
        let date = NaiveDate::from_ymd_opt(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps[3].parse().ok()?,
        )?;
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc());
    }
    if text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit()) {
        return year_start(text.parse().ok()?);
    }
    parse_date_str(text)
}

fn year_start(year: i32) -> Option<DateTime<Utc>> {
    Some(
        NaiveDate::from_ymd_opt(year, 1, 1)?
            .and_hms_opt(0, 0, 0)?
            .and_utc(),
    )
}

/// Returns true for dates, numbers in the unix timestamp ranges, and text
/// in one of the accepted time formats that parses.
pub fn is_time_value(value: &Value) -> bool {
    match value {
        Value::Date(_) => true,
        Value::Number(n) => UNIX_SECONDS_RANGE.contains(n) || UNIX_MILLIS_RANGE.contains(n),
        Value::String(s) => {
            let text = s.trim();
            TIME_FORMATS.iter().any(|format| format.is_match(text))
                && parse_time_str(text).is_some()
        }
        _ => false,
    }
}

/// Adapter for time-indexed records.
///
/// Records are sorted by their mapped x (time) value before extraction, so
/// output x values never decrease.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSeriesAdapter {
    policy: RowErrorPolicy,
}

impl TimeSeriesAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_policy(mut self, policy: RowErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Top-level fields that look like a time axis, by name or by values.
    ///
    /// Fields are ranked by the share of sampled values that are times, so a
    /// column of real dates comes before a text column matched only by name.
    pub fn find_time_fields(&self, records: &[Record]) -> Vec<String> {
        let Some(first) = records.first() else {
            return Vec::new();
        };
        let mut fields: Vec<(&String, f64)> = first
            .keys()
            .filter_map(|field| {
                let share = time_value_share(records, field);
                (TIME_FIELD_NAME_REGEX.is_match(field) || share >= TIME_FIELD_RATIO)
                    .then_some((field, share))
            })
            .collect();
        fields.sort_by(|a, b| b.1.total_cmp(&a.1));
        fields.into_iter().map(|(field, _)| field.clone()).collect()
    }

    /// Classifies the spacing of a field's times from the mean of the first
    /// consecutive gaps after sorting. `None` with fewer than two times.
    pub fn get_time_interval(&self, records: &[Record], field: &str) -> Option<TimeInterval> {
        let times = sorted_millis(records, field);
        let gaps: Vec<f64> = times
            .windows(2)
            .take(INTERVAL_GAPS)
            .map(|pair| (pair[1] - pair[0]) as f64)
            .collect();
        if gaps.is_empty() {
            return None;
        }
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        Some(TimeInterval::from_mean_gap(mean))
    }
}

/// Share of the first present values of `field` that are times.
fn time_value_share(records: &[Record], field: &str) -> f64 {
    let sample: Vec<&Value> = records
        .iter()
        .filter_map(|record| resolve_path(record, field))
        .take(TIME_FIELD_SAMPLE_SIZE)
        .collect();
    if sample.is_empty() {
        return 0.0;
    }
    sample.iter().filter(|value| is_time_value(value)).count() as f64 / sample.len() as f64
}

fn parsed_millis(records: &[Record], field: &str) -> (usize, Vec<i64>) {
    let mut present = 0;
    let mut millis = Vec::new();
    for value in records.iter().filter_map(|record| resolve_path(record, field)) {
        present += 1;
        if let Some(time) = parse_time_value(value) {
            millis.push(time.timestamp_millis());
        }
    }
    (present, millis)
}

fn sorted_millis(records: &[Record], field: &str) -> Vec<i64> {
    let (_, mut millis) = parsed_millis(records, field);
    millis.sort_unstable();
    millis
}

impl DataAdapter for TimeSeriesAdapter {
    fn name(&self) -> &'static str {
        "timeseries"
    }

    /// Requires at least one time field. Warns on a low parse rate for the
    /// best ranked time field, on rows out of chronological order, and on an
    /// irregular cadence.
    fn validate(&self, records: &[Record]) -> ValidationResult {
        let mut result = base_validate(records);
        if !result.is_valid || records.is_empty() {
            return result;
        }

        let time_fields = self.find_time_fields(records);
        let Some(field) = time_fields.first() else {
            result.fail(AdapterError::NoTimeField.to_string());
            return result;
        };

        let (present, millis) = parsed_millis(records, field);
        if present > 0 {
            let rate = millis.len() as f64 / present as f64;
            if rate < MIN_PARSE_RATE {
                result.warn_scaled(
                    format!(
                        "only {:.0}% of '{field}' values parse as times",
                        rate * 100.0
                    ),
                    WARNING_PENALTY,
                );
            }
        }

        let mut sorted = millis.clone();
        sorted.sort_unstable();
        if sorted != millis {
            result.warn_scaled(
                format!("records are not in chronological order by '{field}'"),
                WARNING_PENALTY,
            );
        }

        let gaps: Vec<f64> = sorted
            .windows(2)
            .take(CADENCE_GAPS)
            .map(|pair| (pair[1] - pair[0]) as f64)
            .collect();
        if !gaps.is_empty() {
            let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
            let irregular = gaps
                .iter()
                .filter(|gap| (*gap - mean).abs() > mean * 0.5)
                .count();
            if mean > 0.0 && irregular as f64 > gaps.len() as f64 * 0.3 {
                result.warn_scaled(
                    format!("'{field}' has an irregular cadence"),
                    WARNING_PENALTY,
                );
            }
        }
        result
    }

    /// Stably sorts records by their x time, then extracts points with x as
    /// a date. Records whose x does not parse sort last and are dropped.
    fn transform(&self, records: &[Record], config: &MappingConfig) -> Vec<ChartDataPoint> {
        let Some(x_field) = config.get("x") else {
            return extract_points(self.name(), records, config, self.policy, time_x);
        };
        let mut keyed: Vec<(Option<i64>, &Record)> = records
            .iter()
            .map(|record| {
                let key = parse_time_value(&x_field.resolve(record)).map(|t| t.timestamp_millis());
                (key, record)
            })
            .collect();
        keyed.sort_by_key(|(key, _)| (key.is_none(), *key));
        let sorted: Vec<Record> = keyed.into_iter().map(|(_, record)| record.clone()).collect();
        extract_points(self.name(), &sorted, config, self.policy, time_x)
    }
}

fn time_x(row: usize, value: &Value) -> Result<Value, RowError> {
    parse_time_value(value)
        .map(Value::Date)
        .ok_or_else(|| RowError::InvalidTime {
            row,
            value: value.to_key_string(),
        })
}
