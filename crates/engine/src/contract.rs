use fields::FieldSpec;
use table::{Record, RecordSet};

use crate::error::EngineError;
use crate::types::{
    Label, LinkedPair, RecordPair, ScoredCluster, SearchResult, TrainingInput, TrainingPairs,
};

/// Contract between the orchestration layer and a record-matching engine.
///
/// One engine value serves every mode: `partition` for self-match, `join`
/// for two-set linkage, `index` + `search` for gazetteer matching. A value
/// built with [`MatchingEngine::from_settings`] is static: it can score and
/// cluster but is never asked for training pairs.
pub trait MatchingEngine: Sized {
    /// Fresh, untrained engine over the given fields.
    fn new(fields: &[FieldSpec], num_cores: usize) -> Result<Self, EngineError>;

    /// Rebuild a trained engine from a settings blob.
    fn from_settings(settings: &[u8], num_cores: usize) -> Result<Self, EngineError>;

    /// Draw up to `sample_size` candidate pairs for active learning.
    fn prepare_training(
        &mut self,
        input: TrainingInput<'_>,
        sample_size: usize,
    ) -> Result<(), EngineError>;

    /// Seed with previously labeled examples.
    fn read_training(&mut self, pairs: TrainingPairs) -> Result<(), EngineError>;

    /// Next pair the engine is least sure about, removed from the pool.
    /// `None` once the pool is exhausted.
    fn uncertain_pair(&mut self) -> Option<RecordPair>;

    /// Record a human label for a pair.
    fn mark_pair(&mut self, pair: RecordPair, label: Label);

    /// Fit the classifier and blocking rules on the labeled examples.
    fn train(&mut self) -> Result<(), EngineError>;

    /// Every labeled example seen so far, seeded ones included.
    fn training(&self) -> &TrainingPairs;

    fn write_settings(&self) -> Result<Vec<u8>, EngineError>;

    /// Score cutoff maximizing a recall-weighted F-measure over `records`.
    fn threshold(&self, records: &RecordSet, recall_weight: f64) -> Result<f64, EngineError>;

    fn partition(
        &self,
        records: &RecordSet,
        threshold: f64,
    ) -> Result<Vec<ScoredCluster>, EngineError>;

    /// One-to-one pairings between `left` and `right` scoring at least
    /// `threshold`.
    fn join(
        &self,
        left: &RecordSet,
        right: &RecordSet,
        threshold: f64,
    ) -> Result<Vec<LinkedPair>, EngineError>;

    fn index(&mut self, canonical: &RecordSet) -> Result<(), EngineError>;

    /// Candidates from the indexed set for each messy record. Messy records
    /// with no candidate at or above `threshold` are left out.
    fn search(&self, messy: &RecordSet, threshold: f64) -> Result<Vec<SearchResult>, EngineError>;

    /// One representative record for a cluster.
    fn canonicalize(&self, members: &[&Record]) -> Record;
}
