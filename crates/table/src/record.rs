//! Records as handed to the matching engine.

use std::collections::HashMap;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TableError;
use crate::value::{RecordId, Value};

/// Field name → value, in column order.
///
/// Serializes as a JSON object whose key order follows the column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing an existing entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find_map(|(n, v)| (n == name).then_some(v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Copy with every typed value rendered as text. Canonical values are
    /// always produced from stringified records.
    pub fn stringified(&self) -> Record {
        Record {
            fields: self
                .fields
                .iter()
                .map(|(n, v)| (n.clone(), v.stringified()))
                .collect(),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = Record;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field name to value")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Record, A::Error> {
                let mut record = Record::new();
                while let Some((name, value)) = access.next_entry::<String, Value>()? {
                    record.insert(name, value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Ordered collection of records keyed by [`RecordId`].
///
/// Iteration order is insertion order; engines enumerate in this order, which
/// keeps cluster numbering reproducible run to run.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    entries: Vec<(RecordId, Record)>,
    positions: HashMap<RecordId, usize>,
}

impl RecordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: RecordId, record: Record) -> Result<(), TableError> {
        if self.positions.contains_key(&id) {
            return Err(TableError::DuplicateRecord(id));
        }
        self.positions.insert(id.clone(), self.entries.len());
        self.entries.push((id, record));
        Ok(())
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.positions.get(id).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.positions.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordId, &Record)> {
        self.entries.iter().map(|(id, r)| (id, r))
    }

    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.entries.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of the set with every record stringified.
    pub fn stringified(&self) -> RecordSet {
        RecordSet {
            entries: self
                .entries
                .iter()
                .map(|(id, r)| (id.clone(), r.stringified()))
                .collect(),
            positions: self.positions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_in_place() {
        let mut r = Record::new();
        r.insert("name", Value::from("a"));
        r.insert("city", Value::from("b"));
        r.insert("name", Value::from("c"));
        let names: Vec<&str> = r.names().collect();
        assert_eq!(names, vec!["name", "city"]);
        assert_eq!(r.get("name"), Some(&Value::from("c")));
    }

    #[test]
    fn json_keeps_column_order() {
        let r: Record = vec![("zeta", Value::from("1")), ("alpha", Value::Null)]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&r).expect("serialize");
        assert_eq!(json, r#"{"zeta":"1","alpha":null}"#);
        let back: Record = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, r);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut set = RecordSet::new();
        set.insert(RecordId::from("1"), Record::new()).expect("first insert");
        let err = set
            .insert(RecordId::from("1"), Record::new())
            .expect_err("duplicate");
        assert!(matches!(err, TableError::DuplicateRecord(id) if id.as_str() == "1"));
    }

    #[test]
    fn stringified_renders_typed_values() {
        let mut set = RecordSet::new();
        let r: Record = vec![("price", Value::Float(3.5)), ("loc", Value::LatLong(1.0, 2.0))]
            .into_iter()
            .collect();
        set.insert(RecordId::from("0"), r).expect("insert");
        let s = set.stringified();
        let rec = s.get(&RecordId::from("0")).expect("present");
        assert_eq!(rec.get("price"), Some(&Value::from("3.5")));
        assert_eq!(rec.get("loc"), Some(&Value::from("(1, 2)")));
    }
}
