use std::fmt;

use table::{Record, RecordId, Value};

/// Which canonical columns to emit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Canonicalize {
    #[default]
    Off,
    /// Every field of the canonical record.
    All,
    /// Only these fields, in this order.
    Fields(Vec<String>),
}

impl Canonicalize {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Canonicalize::Off)
    }

    /// Requested `(field, value)` pairs from a canonical record. Requested
    /// fields the record lacks come back as null.
    pub fn select(&self, canonical: &Record) -> Vec<(String, Value)> {
        match self {
            Canonicalize::Off => Vec::new(),
            Canonicalize::All => canonical
                .iter()
                .map(|(name, value)| (name.to_string(), value.clone()))
                .collect(),
            Canonicalize::Fields(names) => names
                .iter()
                .map(|name| (name.clone(), canonical.get(name).cloned().unwrap_or_default()))
                .collect(),
        }
    }
}

impl From<bool> for Canonicalize {
    fn from(enabled: bool) -> Self {
        if enabled {
            Canonicalize::All
        } else {
            Canonicalize::Off
        }
    }
}

impl From<Vec<String>> for Canonicalize {
    fn from(fields: Vec<String>) -> Self {
        Canonicalize::Fields(fields)
    }
}

impl From<&[&str]> for Canonicalize {
    fn from(fields: &[&str]) -> Self {
        Canonicalize::Fields(fields.iter().map(|f| f.to_string()).collect())
    }
}

/// Cluster identifier in a result row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClusterId {
    /// Position of the cluster in matcher output (self-match, link).
    Seq(usize),
    /// Id of the canonical record a messy record resolved to (gazetteer).
    Canonical(RecordId),
}

impl ClusterId {
    /// Result cell for this id. Canonical ids that parse as integers (the
    /// positional ids of a table read without an explicit index) become
    /// integers, matching self-match and link output.
    pub fn to_value(&self) -> Value {
        match self {
            ClusterId::Seq(n) => Value::Integer(*n as i64),
            ClusterId::Canonical(id) => id
                .as_str()
                .parse::<i64>()
                .map(Value::Integer)
                .unwrap_or_else(|_| Value::Text(id.as_str().to_string())),
        }
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterId::Seq(n) => write!(f, "{n}"),
            ClusterId::Canonical(id) => write!(f, "{id}"),
        }
    }
}

/// One result row: a record, the cluster it joined and how sure the
/// engine was.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub record_id: RecordId,
    pub cluster_id: ClusterId,
    pub confidence: f64,
    /// `(field, value)` pairs, empty when canonicalization is off.
    pub canonical: Vec<(String, Value)>,
}

/// One linked pair across two sets, numbered by its position.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkAssignment {
    pub cluster_id: usize,
    pub left: RecordId,
    pub right: RecordId,
    pub confidence: f64,
    pub canonical: Vec<(String, Value)>,
}

impl LinkAssignment {
    /// The left row then the right row, sharing cluster id and confidence.
    pub fn into_assignments(self) -> [Assignment; 2] {
        let cluster_id = ClusterId::Seq(self.cluster_id);
        [
            Assignment {
                record_id: self.left,
                cluster_id: cluster_id.clone(),
                confidence: self.confidence,
                canonical: self.canonical.clone(),
            },
            Assignment {
                record_id: self.right,
                cluster_id,
                confidence: self.confidence,
                canonical: self.canonical,
            },
        ]
    }
}
