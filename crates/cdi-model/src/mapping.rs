//! Role mappings and the canonical chart point they produce.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::path::resolve_path;
use crate::pivot::PivotConfig;
use crate::value::{Record, Value};

/// Caller-supplied function computing a field value from a whole record.
pub type Accessor = Arc<dyn Fn(&Record) -> Value + Send + Sync>;

/// How a mapping role locates its value in a record.
#[derive(Clone)]
pub enum FieldRef {
    /// Dotted field path, see [`resolve_path`].
    Path(String),
    /// Arbitrary accessor.
    Accessor(Accessor),
}

impl FieldRef {
    /// Builds an accessor reference from a closure.
    pub fn accessor<F>(f: F) -> Self
    where
        F: Fn(&Record) -> Value + Send + Sync + 'static,
    {
        Self::Accessor(Arc::new(f))
    }

    /// Resolves the reference against a record; missing values are `Null`.
    pub fn resolve(&self, record: &Record) -> Value {
        match self {
            Self::Path(path) => resolve_path(record, path).cloned().unwrap_or_default(),
            Self::Accessor(f) => f(record),
        }
    }

    /// Returns the path if this reference is a path.
    pub fn as_path(&self) -> Option<&str> {
        match self {
            Self::Path(path) => Some(path),
            Self::Accessor(_) => None,
        }
    }
}

impl fmt::Debug for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Accessor(_) => f.write_str("Accessor(..)"),
        }
    }
}

impl From<&str> for FieldRef {
    fn from(value: &str) -> Self {
        Self::Path(value.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(value: String) -> Self {
        Self::Path(value)
    }
}

/// Role to field assignment chosen by the caller.
///
/// `x` and `y` are required for a point to be produced; `color`, `size` and
/// any other role name are optional and copied onto the point when present.
/// An optional [`PivotConfig`] reshapes the records before extraction.
#[derive(Debug, Clone, Default)]
pub struct MappingConfig {
    roles: BTreeMap<String, FieldRef>,
    /// Reshape applied by pivot-capable adapters before point extraction.
    pub pivot: Option<PivotConfig>,
}

impl MappingConfig {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a field to an arbitrary role name.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>, field: impl Into<FieldRef>) -> Self {
        self.roles.insert(role.into(), field.into());
        self
    }

    /// Assigns the x role.
    #[must_use]
    pub fn x(self, field: impl Into<FieldRef>) -> Self {
        self.with_role("x", field)
    }

    /// Assigns the y role.
    #[must_use]
    pub fn y(self, field: impl Into<FieldRef>) -> Self {
        self.with_role("y", field)
    }

    /// Assigns the color role.
    #[must_use]
    pub fn color(self, field: impl Into<FieldRef>) -> Self {
        self.with_role("color", field)
    }

    /// Assigns the size role.
    #[must_use]
    pub fn size(self, field: impl Into<FieldRef>) -> Self {
        self.with_role("size", field)
    }

    /// Attaches a pivot reshape.
    #[must_use]
    pub fn with_pivot(mut self, pivot: PivotConfig) -> Self {
        self.pivot = Some(pivot);
        self
    }

    /// Looks up the field for a role.
    pub fn get(&self, role: &str) -> Option<&FieldRef> {
        self.roles.get(role)
    }

    /// Iterates all assigned roles in name order.
    pub fn roles(&self) -> impl Iterator<Item = (&str, &FieldRef)> {
        self.roles.iter().map(|(role, field)| (role.as_str(), field))
    }

    /// Iterates roles other than `x` and `y`.
    pub fn optional_roles(&self) -> impl Iterator<Item = (&str, &FieldRef)> {
        self.roles().filter(|(role, _)| *role != "x" && *role != "y")
    }

    /// Returns true when no role is assigned.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

/// A canonical, render-ready point.
///
/// `x` is never null and `y` is always a finite number; records that cannot
/// satisfy this are dropped during transformation, never null-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataPoint {
    pub x: Value,
    pub y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Value>,
    /// Values for additional caller-defined roles.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
    /// The record the point was extracted from.
    pub original_data: Record,
    /// Position of the source record in the sequence that was mapped.
    pub index: usize,
}
