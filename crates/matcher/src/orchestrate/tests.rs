use super::*;
use std::cell::Cell;

use engine::{
    EngineError, Label, RecordPair, SimilarityEngine, TrainingInput, TrainingPairs,
};
use fields::{FieldSpec, FieldType};
use table::{Record, RecordId, Value};

/// Engine double that reports the thresholds it was handed.
#[derive(Default)]
struct FixedEngine {
    training: TrainingPairs,
    threshold_calls: Cell<usize>,
    last_threshold: Cell<f64>,
    indexed: bool,
}

impl MatchingEngine for FixedEngine {
    fn new(_: &[FieldSpec], _: usize) -> Result<Self, EngineError> {
        Ok(Self::default())
    }
    fn from_settings(_: &[u8], _: usize) -> Result<Self, EngineError> {
        Ok(Self::default())
    }
    fn prepare_training(&mut self, _: TrainingInput<'_>, _: usize) -> Result<(), EngineError> {
        Ok(())
    }
    fn read_training(&mut self, _: TrainingPairs) -> Result<(), EngineError> {
        Ok(())
    }
    fn uncertain_pair(&mut self) -> Option<RecordPair> {
        None
    }
    fn mark_pair(&mut self, _: RecordPair, _: Label) {}
    fn train(&mut self) -> Result<(), EngineError> {
        Ok(())
    }
    fn training(&self) -> &TrainingPairs {
        &self.training
    }
    fn write_settings(&self) -> Result<Vec<u8>, EngineError> {
        Ok(Vec::new())
    }
    fn threshold(&self, _: &RecordSet, recall_weight: f64) -> Result<f64, EngineError> {
        self.threshold_calls.set(self.threshold_calls.get() + 1);
        Ok(0.25 * recall_weight)
    }
    fn partition(&self, records: &RecordSet, threshold: f64) -> Result<Vec<ScoredCluster>, EngineError> {
        self.last_threshold.set(threshold);
        let members = records.ids().take(2).map(|id| (id.clone(), 0.9)).collect();
        Ok(vec![ScoredCluster { members }])
    }
    fn join(&self, left: &RecordSet, right: &RecordSet, threshold: f64) -> Result<Vec<LinkedPair>, EngineError> {
        self.last_threshold.set(threshold);
        Ok(left
            .ids()
            .zip(right.ids())
            .map(|(l, r)| LinkedPair {
                left: l.clone(),
                right: r.clone(),
                confidence: 0.5,
            })
            .collect())
    }
    fn index(&mut self, _: &RecordSet) -> Result<(), EngineError> {
        self.indexed = true;
        Ok(())
    }
    fn search(&self, messy: &RecordSet, threshold: f64) -> Result<Vec<SearchResult>, EngineError> {
        if !self.indexed {
            return Err(EngineError::NotIndexed);
        }
        self.last_threshold.set(threshold);
        Ok(messy
            .ids()
            .map(|id| SearchResult {
                messy: id.clone(),
                candidates: vec![(RecordId::new("c1"), 0.9)],
            })
            .collect())
    }
    fn canonicalize(&self, members: &[&Record]) -> Record {
        members.first().map(|r| (*r).clone()).unwrap_or_default()
    }
}

fn names(prefix: &str, names: &[&str]) -> RecordSet {
    let mut set = RecordSet::new();
    for (i, n) in names.iter().enumerate() {
        let r: Record = [("name", Value::from(*n))].into_iter().collect();
        set.insert(RecordId::new(format!("{prefix}{i}")), r).expect("insert");
    }
    set
}

#[test]
fn recall_weighted_asks_engine_for_threshold() {
    let engine = FixedEngine::default();
    let out = self_match(&engine, &names("", &["a", "b", "c"]), ThresholdPolicy::RecallWeighted(2.0))
        .expect("match");
    assert_eq!(out.mode, MatchMode::SelfMatch);
    assert_eq!(out.threshold, 0.5);
    assert_eq!(engine.threshold_calls.get(), 1);
    assert_eq!(engine.last_threshold.get(), 0.5);
}

#[test]
fn fixed_threshold_skips_engine_threshold() {
    let engine = FixedEngine::default();
    let out = self_match(&engine, &names("", &["a", "b"]), ThresholdPolicy::Fixed(0.7)).expect("match");
    assert_eq!(out.threshold, 0.7);
    assert_eq!(engine.threshold_calls.get(), 0);
    assert_eq!(out.results.len(), 1);
}

#[test]
fn link_rejects_shared_ids_and_recall_policy() {
    let engine = FixedEngine::default();
    let a = names("dfa", &["x"]);
    let b = names("dfb", &["y"]);
    let same = names("dfa", &["z"]);

    assert!(matches!(
        link(&engine, &a, &same, ThresholdPolicy::Fixed(0.0)),
        Err(MatchError::OverlappingIds(ref id)) if id.as_str() == "dfa0"
    ));
    assert!(matches!(
        link(&engine, &a, &b, ThresholdPolicy::RecallWeighted(1.0)),
        Err(MatchError::UnsupportedPolicy(MatchMode::Link))
    ));

    let out = link(&engine, &a, &b, ThresholdPolicy::Fixed(0.0)).expect("link");
    assert_eq!(out.threshold, 0.0);
    assert_eq!(out.results.len(), 1);
    assert_eq!(out.results[0].left.as_str(), "dfa0");
    assert_eq!(out.results[0].right.as_str(), "dfb0");
}

#[test]
fn gazetteer_indexes_before_searching() {
    let mut engine = FixedEngine::default();
    let out = gazetteer_search(
        &mut engine,
        &names("c", &["acme"]),
        &names("m", &["acme corp", "acme co"]),
        ThresholdPolicy::Fixed(0.3),
    )
    .expect("search");
    assert!(engine.indexed);
    assert_eq!(out.mode, MatchMode::Gazetteer);
    assert_eq!(out.results.len(), 2);
    assert_eq!(engine.last_threshold.get(), 0.3);
}

#[test]
fn invalid_policy_fails_before_engine_work() {
    let engine = FixedEngine::default();
    let err = self_match(&engine, &names("", &["a"]), ThresholdPolicy::Fixed(-0.1)).expect_err("bad");
    assert!(matches!(err, MatchError::InvalidThreshold(_)));
    assert_eq!(engine.last_threshold.get(), 0.0);
}

#[test]
fn built_in_engine_end_to_end() {
    let fields = [FieldSpec::new("name", FieldType::String)];
    let engine = SimilarityEngine::new(&fields, 1).expect("engine");
    let records = names("", &["acme corp", "acme corp", "globex"]);
    let out = self_match(&engine, &records, ThresholdPolicy::Fixed(0.95)).expect("match");
    assert_eq!(out.results.len(), 1);
    let ids: Vec<&str> = out.results[0].ids().map(RecordId::as_str).collect();
    assert_eq!(ids, vec!["0", "1"]);
}
