//! Dotted field paths over nested records.
//!
//! Paths are dot-separated segments, each optionally followed by one or more
//! `[n]` array indices: `customer.address.city`, `items[0].price`.

use crate::value::{Record, Value};

/// One step of a parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step<'a> {
    Key(&'a str),
    Index(usize),
}

/// Resolves a field path against a record.
///
/// A key that literally equals the whole path wins, so records produced by
/// flattening (`{"a.b": 1}`) resolve the same way as their nested form.
/// Returns `None` when any intermediate value is missing or null, or when a
/// segment addresses the wrong kind of value.
pub fn resolve_path<'r>(record: &'r Record, path: &str) -> Option<&'r Value> {
    if let Some(direct) = record.get(path) {
        return (!direct.is_null()).then_some(direct);
    }

    let steps = parse_steps(path)?;
    let (first, rest) = steps.split_first()?;
    let Step::Key(key) = first else {
        return None;
    };
    let mut current = record.get(*key)?;

    for step in rest {
        if current.is_null() {
            return None;
        }
        current = match (step, current) {
            (Step::Key(key), Value::Object(map)) => map.get(*key)?,
            (Step::Index(idx), Value::Array(items)) => items.get(*idx)?,
            _ => return None,
        };
    }

    (!current.is_null()).then_some(current)
}

/// Number of segments in a path; `a` is depth 1, `a.b[0].c` is depth 3.
pub fn path_depth(path: &str) -> usize {
    path.split('.').filter(|segment| !segment.is_empty()).count()
}

/// Joins a parent path and a child key.
pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

/// Returns the last key segment of a path without array indices.
///
/// `orders[0].unit_price` yields `unit_price`. Used where heuristics look at
/// the field's own name rather than its location.
pub fn leaf_name(path: &str) -> &str {
    let last = path.rsplit('.').next().unwrap_or(path);
    last.split('[').next().unwrap_or(last)
}

fn parse_steps(path: &str) -> Option<Vec<Step<'_>>> {
    let mut steps = Vec::new();
    for segment in path.split('.') {
        if segment.is_empty() {
            return None;
        }
        let (key, mut indices) = match segment.find('[') {
            Some(pos) => (&segment[..pos], &segment[pos..]),
            None => (segment, ""),
        };
        if !key.is_empty() {
            steps.push(Step::Key(key));
        }
        while let Some(rest) = indices.strip_prefix('[') {
            let close = rest.find(']')?;
            let idx = rest[..close].trim().parse::<usize>().ok()?;
            steps.push(Step::Index(idx));
            indices = &rest[close + 1..];
        }
        if !indices.is_empty() {
            return None;
        }
    }
    Some(steps)
}
