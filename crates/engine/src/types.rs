use serde::{Deserialize, Serialize};
use table::{Record, RecordId, RecordSet};

use crate::error::EngineError;

/// Human answer for one candidate pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Match,
    Distinct,
}

/// Two records offered for labeling.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPair {
    pub left: Record,
    pub right: Record,
}

impl RecordPair {
    pub fn new(left: Record, right: Record) -> Self {
        Self { left, right }
    }
}

/// Labeled examples, persisted as the training blob.
///
/// The JSON form is `{"match": [[r, r], ...], "distinct": [[r, r], ...]}`,
/// with every record written as an object in column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingPairs {
    #[serde(rename = "match", default)]
    pub matches: Vec<(Record, Record)>,
    #[serde(default)]
    pub distinct: Vec<(Record, Record)>,
}

impl TrainingPairs {
    pub fn push(&mut self, pair: RecordPair, label: Label) {
        let entry = (pair.left, pair.right);
        match label {
            Label::Match => self.matches.push(entry),
            Label::Distinct => self.distinct.push(entry),
        }
    }

    /// Append every example from `other`.
    pub fn extend(&mut self, other: TrainingPairs) {
        self.matches.extend(other.matches);
        self.distinct.extend(other.distinct);
    }

    pub fn len(&self) -> usize {
        self.matches.len() + self.distinct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty() && self.distinct.is_empty()
    }

    /// Iterate every example with its label, matches first.
    pub fn labeled(&self) -> impl Iterator<Item = (&Record, &Record, Label)> {
        self.matches
            .iter()
            .map(|(a, b)| (a, b, Label::Match))
            .chain(self.distinct.iter().map(|(a, b)| (a, b, Label::Distinct)))
    }

    pub fn to_json_pretty(&self) -> Result<String, EngineError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self, EngineError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Records a training sample is drawn from, per matching mode.
#[derive(Debug, Clone, Copy)]
pub enum TrainingInput<'a> {
    /// Pairs within one set.
    Dedupe(&'a RecordSet),
    /// Pairs across two sets with disjoint ids.
    Link {
        left: &'a RecordSet,
        right: &'a RecordSet,
    },
    /// Pairs of a messy record and a canonical record.
    Gazetteer {
        messy: &'a RecordSet,
        canonical: &'a RecordSet,
    },
}

impl TrainingInput<'_> {
    /// Number of records the sample fraction applies to.
    pub fn record_count(&self) -> usize {
        match self {
            TrainingInput::Dedupe(records) => records.len(),
            TrainingInput::Link { left, right } => left.len() + right.len(),
            TrainingInput::Gazetteer { messy, .. } => messy.len(),
        }
    }
}

/// One duplicate set from [`crate::MatchingEngine::partition`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCluster {
    /// Member ids with their confidence, in record-set order.
    pub members: Vec<(RecordId, f64)>,
}

impl ScoredCluster {
    pub fn ids(&self) -> impl Iterator<Item = &RecordId> {
        self.members.iter().map(|(id, _)| id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// A cross-set pairing from [`crate::MatchingEngine::join`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinkedPair {
    pub left: RecordId,
    pub right: RecordId,
    pub confidence: f64,
}

/// Candidates for one messy record from [`crate::MatchingEngine::search`],
/// best first.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub messy: RecordId,
    pub candidates: Vec<(RecordId, f64)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use table::Value;

    fn rec(name: &str) -> Record {
        [("name", Value::from(name))].into_iter().collect()
    }

    #[test]
    fn training_json_shape() {
        let mut pairs = TrainingPairs::default();
        pairs.push(RecordPair::new(rec("acme"), rec("acme inc")), Label::Match);
        pairs.push(RecordPair::new(rec("acme"), rec("globex")), Label::Distinct);

        let json: serde_json::Value =
            serde_json::from_str(&pairs.to_json_pretty().expect("json")).expect("parse");
        assert_eq!(json["match"][0][0]["name"], "acme");
        assert_eq!(json["match"][0][1]["name"], "acme inc");
        assert_eq!(json["distinct"][0][1]["name"], "globex");

        let back = TrainingPairs::from_json(pairs.to_json_pretty().expect("json").as_bytes())
            .expect("read back");
        assert_eq!(back, pairs);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let pairs = TrainingPairs::from_json(br#"{"match": []}"#).expect("partial");
        assert!(pairs.is_empty());
    }

    #[test]
    fn record_count_per_mode() {
        let mut a = RecordSet::new();
        a.insert(RecordId::from(0usize), rec("x")).expect("insert");
        let mut b = RecordSet::new();
        b.insert(RecordId::from(0usize), rec("y")).expect("insert");
        b.insert(RecordId::from(1usize), rec("z")).expect("insert");

        assert_eq!(TrainingInput::Dedupe(&b).record_count(), 2);
        assert_eq!(TrainingInput::Link { left: &a, right: &b }.record_count(), 3);
        assert_eq!(
            TrainingInput::Gazetteer {
                messy: &a,
                canonical: &b
            }
            .record_count(),
            1
        );
    }
}
