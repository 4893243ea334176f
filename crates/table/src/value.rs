//! Cell values and row identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single table cell.
///
/// Raw tables hold whatever the caller loaded; normalized tables hold only
/// `Null`, `Text`, and the typed `Float` / `LatLong` variants produced for
/// Price and LatLong fields.
///
/// Serialized untagged so training files stay readable:
/// `null`, `"text"`, `42`, `4.5`, `[40.7, -73.9]`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    LatLong(f64, f64),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_lat_long(&self) -> Option<(f64, f64)> {
        match self {
            Value::LatLong(lat, lon) => Some((*lat, *lon)),
            _ => None,
        }
    }

    /// Text rendering of the cell, `None` for null.
    ///
    /// LatLong renders as a tuple literal (`(40.7, -73.9)`) so the
    /// normalizer can parse its own output back.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Same cell with typed values replaced by their text rendering.
    pub fn stringified(&self) -> Value {
        match self {
            Value::Null => Value::Null,
            Value::Text(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::LatLong(lat, lon) => write!(f, "({lat}, {lon})"),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Stable identifier of a table row.
///
/// Defaults to the 0-based position of the row in the table it was loaded
/// from. Two-table workflows prefix it with the dataset tag (`dfa0`, `dfb0`)
/// so the two namespaces never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `prefix` followed by this id, e.g. `dfa` + `3` = `dfa3`.
    pub fn prefixed(&self, prefix: &str) -> RecordId {
        RecordId(format!("{prefix}{}", self.0))
    }

    /// Inverse of [`RecordId::prefixed`]; `None` when the prefix is absent.
    pub fn strip_prefix(&self, prefix: &str) -> Option<RecordId> {
        self.0.strip_prefix(prefix).map(|rest| RecordId(rest.to_string()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        RecordId(value.to_string())
    }
}

impl From<String> for RecordId {
    fn from(value: String) -> Self {
        RecordId(value)
    }
}

impl From<usize> for RecordId {
    fn from(value: usize) -> Self {
        RecordId(value.to_string())
    }
}
