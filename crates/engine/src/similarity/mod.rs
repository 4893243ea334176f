//! Built-in engine: field similarities, a logistic pair classifier and
//! learned blocking.

mod blocking;
mod classifier;
mod compare;

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use fields::FieldSpec;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use table::{Record, RecordId, RecordSet, Value};
use tracing::{debug, info};

use crate::contract::MatchingEngine;
use crate::error::EngineError;
use crate::types::{
    Label, LinkedPair, RecordPair, ScoredCluster, SearchResult, TrainingInput, TrainingPairs,
};

use self::blocking::{default_predicates, learn_predicates, pairs_across, pairs_within, Predicate};
use self::classifier::Classifier;
use self::compare::FeatureLayout;

/// Bump whenever the persisted [`Settings`] layout changes.
pub const SETTINGS_VERSION: u32 = 1;

const SETTINGS_MAGIC: &[u8; 4] = b"RLSE";

/// Cutoff used when there are no candidate pairs to sweep.
const DEFAULT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Serialize, Deserialize)]
struct Settings {
    layout: FeatureLayout,
    classifier: Classifier,
    predicates: Vec<Predicate>,
}

#[derive(Debug)]
struct Candidate {
    pair: RecordPair,
    features: Vec<f64>,
}

/// Default [`MatchingEngine`].
pub struct SimilarityEngine {
    layout: FeatureLayout,
    classifier: Classifier,
    predicates: Vec<Predicate>,
    training: TrainingPairs,
    candidates: Vec<Candidate>,
    indexed: Option<RecordSet>,
    pool: rayon::ThreadPool,
}

impl fmt::Debug for SimilarityEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityEngine")
            .field("fields", &self.layout.fields())
            .field("classifier", &self.classifier)
            .field("predicates", &self.predicates)
            .field("training", &self.training.len())
            .field("candidates", &self.candidates.len())
            .field("threads", &self.pool.current_num_threads())
            .finish()
    }
}

impl SimilarityEngine {
    fn build(
        layout: FeatureLayout,
        classifier: Classifier,
        predicates: Vec<Predicate>,
        num_cores: usize,
    ) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_cores)
            .build()
            .map_err(|e| EngineError::ThreadPool(e.to_string()))?;
        Ok(Self {
            layout,
            classifier,
            predicates,
            training: TrainingPairs::default(),
            candidates: Vec::new(),
            indexed: None,
            pool,
        })
    }

    pub fn fields(&self) -> &[FieldSpec] {
        self.layout.fields()
    }

    /// Match probability for two records.
    pub fn score(&self, a: &Record, b: &Record) -> f64 {
        self.classifier.score(&self.layout.features(a, b))
    }

    fn refit(&mut self) {
        let examples: Vec<(Vec<f64>, bool)> = self
            .training
            .labeled()
            .map(|(a, b, label)| (self.layout.features(a, b), label == Label::Match))
            .collect();
        self.classifier = Classifier::fit(
            &examples,
            self.layout.dims(),
            self.layout.similarity_dims(),
        );
    }

    fn score_pairs(&self, left: &[&Record], right: &[&Record], pairs: &[(usize, usize)]) -> Vec<f64> {
        let layout = &self.layout;
        let classifier = &self.classifier;
        self.pool.install(|| {
            pairs
                .par_iter()
                .map(|&(i, j)| classifier.score(&layout.features(left[i], right[j])))
                .collect()
        })
    }

    /// Scored candidate pairs within one set, best first.
    fn scored_within(&self, records: &[&Record]) -> Vec<((usize, usize), f64)> {
        let pairs = pairs_within(&self.predicates, self.layout.fields(), records);
        let scores = self.score_pairs(records, records, &pairs);
        pairs.into_iter().zip(scores).collect()
    }
}

fn split(records: &RecordSet) -> (Vec<&RecordId>, Vec<&Record>) {
    records.iter().unzip()
}

/// Indices spread evenly over `0..len`, at most `count` of them.
fn spread(len: usize, count: usize) -> Vec<usize> {
    if count >= len {
        return (0..len).collect();
    }
    (0..count).map(|k| k * len / count).collect()
}

impl MatchingEngine for SimilarityEngine {
    fn new(fields: &[FieldSpec], num_cores: usize) -> Result<Self, EngineError> {
        if fields.is_empty() {
            return Err(EngineError::NoFields);
        }
        let layout = FeatureLayout::new(fields);
        let classifier = Classifier::untrained(layout.similarity_dims());
        let predicates = default_predicates(fields);
        Self::build(layout, classifier, predicates, num_cores)
    }

    fn from_settings(settings: &[u8], num_cores: usize) -> Result<Self, EngineError> {
        let header_len = SETTINGS_MAGIC.len() + 4;
        if settings.len() < header_len || &settings[..4] != SETTINGS_MAGIC {
            return Err(EngineError::Decode("not a recordlink settings blob".into()));
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(&settings[4..header_len]);
        let found = u32::from_le_bytes(version);
        if found != SETTINGS_VERSION {
            return Err(EngineError::SettingsVersion {
                found,
                expected: SETTINGS_VERSION,
            });
        }
        let (decoded, _): (Settings, usize) =
            decode_from_slice(&settings[header_len..], standard())?;
        if decoded.layout.fields().is_empty() {
            return Err(EngineError::NoFields);
        }
        Self::build(
            decoded.layout,
            decoded.classifier,
            decoded.predicates,
            num_cores,
        )
    }

    fn prepare_training(
        &mut self,
        input: TrainingInput<'_>,
        sample_size: usize,
    ) -> Result<(), EngineError> {
        let fields = self.layout.fields();
        let (left, right): (Vec<&Record>, Vec<&Record>) = match input {
            TrainingInput::Dedupe(records) => {
                let (_, recs) = split(records);
                (recs.clone(), recs)
            }
            TrainingInput::Link { left, right } => (split(left).1, split(right).1),
            TrainingInput::Gazetteer { messy, canonical } => (split(messy).1, split(canonical).1),
        };
        let pairs = match input {
            TrainingInput::Dedupe(_) => pairs_within(&self.predicates, fields, &left),
            _ => pairs_across(&self.predicates, fields, &left, &right),
        };

        self.candidates = spread(pairs.len(), sample_size)
            .into_iter()
            .map(|k| {
                let (i, j) = pairs[k];
                Candidate {
                    features: self.layout.features(left[i], right[j]),
                    pair: RecordPair::new(left[i].clone(), right[j].clone()),
                }
            })
            .collect();

        debug!(
            candidate_pairs = pairs.len(),
            sampled = self.candidates.len(),
            "training_sample_prepared"
        );
        Ok(())
    }

    fn read_training(&mut self, pairs: TrainingPairs) -> Result<(), EngineError> {
        self.training.extend(pairs);
        self.refit();
        Ok(())
    }

    fn uncertain_pair(&mut self) -> Option<RecordPair> {
        let classifier = &self.classifier;
        let (pos, _) = self
            .candidates
            .iter()
            .enumerate()
            .map(|(pos, c)| (pos, (classifier.score(&c.features) - 0.5).abs()))
            .fold(None, |best: Option<(usize, f64)>, (pos, dist)| match best {
                Some((_, d)) if d <= dist => best,
                _ => Some((pos, dist)),
            })?;
        Some(self.candidates.remove(pos).pair)
    }

    fn mark_pair(&mut self, pair: RecordPair, label: Label) {
        self.training.push(pair, label);
        self.refit();
    }

    fn train(&mut self) -> Result<(), EngineError> {
        let start = Instant::now();
        self.refit();
        let matches: Vec<(&Record, &Record)> =
            self.training.matches.iter().map(|(a, b)| (a, b)).collect();
        let distinct: Vec<(&Record, &Record)> =
            self.training.distinct.iter().map(|(a, b)| (a, b)).collect();
        self.predicates = learn_predicates(self.layout.fields(), &matches, &distinct);
        self.candidates.clear();

        info!(
            matches = matches.len(),
            distinct = distinct.len(),
            predicates = self.predicates.len(),
            logistic = matches!(self.classifier, Classifier::Logistic { .. }),
            elapsed_micros = start.elapsed().as_micros(),
            "engine_trained"
        );
        Ok(())
    }

    fn training(&self) -> &TrainingPairs {
        &self.training
    }

    fn write_settings(&self) -> Result<Vec<u8>, EngineError> {
        let settings = Settings {
            layout: self.layout.clone(),
            classifier: self.classifier.clone(),
            predicates: self.predicates.clone(),
        };
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(SETTINGS_MAGIC);
        out.extend_from_slice(&SETTINGS_VERSION.to_le_bytes());
        out.extend(encode_to_vec(&settings, standard())?);
        Ok(out)
    }

    fn threshold(&self, records: &RecordSet, recall_weight: f64) -> Result<f64, EngineError> {
        let (_, recs) = split(records);
        let mut scores: Vec<f64> = self
            .scored_within(&recs)
            .into_iter()
            .map(|(_, s)| s)
            .collect();
        if scores.is_empty() {
            return Ok(DEFAULT_THRESHOLD);
        }
        scores.sort_by(|a, b| b.total_cmp(a));

        // Scores are match probabilities, so their running sum is the
        // expected number of true matches above each cutoff.
        let expected_total: f64 = scores.iter().sum();
        if expected_total <= 0.0 {
            return Ok(DEFAULT_THRESHOLD);
        }
        let beta2 = recall_weight.max(f64::EPSILON).powi(2);
        let mut best = (f64::NEG_INFINITY, scores[0]);
        let mut tp = 0.0;
        for (k, s) in scores.iter().enumerate() {
            tp += s;
            let precision = tp / (k + 1) as f64;
            let recall = tp / expected_total;
            let f = (1.0 + beta2) * precision * recall / (beta2 * precision + recall);
            if f > best.0 {
                best = (f, *s);
            }
        }
        debug!(pairs = scores.len(), threshold = best.1, "threshold_selected");
        Ok(best.1)
    }

    fn partition(
        &self,
        records: &RecordSet,
        threshold: f64,
    ) -> Result<Vec<ScoredCluster>, EngineError> {
        let (ids, recs) = split(records);
        let n = recs.len();
        let mut parent: Vec<usize> = (0..n).collect();
        let mut edge_sum = vec![0.0; n];
        let mut edge_count = vec![0usize; n];

        for ((i, j), s) in self.scored_within(&recs) {
            if s < threshold {
                continue;
            }
            let (ri, rj) = (find(&mut parent, i), find(&mut parent, j));
            if ri != rj {
                parent[ri.max(rj)] = ri.min(rj);
            }
            for k in [i, j] {
                edge_sum[k] += s;
                edge_count[k] += 1;
            }
        }

        let mut order: HashMap<usize, usize> = HashMap::new();
        let mut clusters: Vec<ScoredCluster> = Vec::new();
        for pos in 0..n {
            if edge_count[pos] == 0 {
                continue;
            }
            let root = find(&mut parent, pos);
            let slot = *order.entry(root).or_insert_with(|| {
                clusters.push(ScoredCluster {
                    members: Vec::new(),
                });
                clusters.len() - 1
            });
            let confidence = edge_sum[pos] / edge_count[pos] as f64;
            clusters[slot].members.push((ids[pos].clone(), confidence));
        }
        Ok(clusters)
    }

    fn join(
        &self,
        left: &RecordSet,
        right: &RecordSet,
        threshold: f64,
    ) -> Result<Vec<LinkedPair>, EngineError> {
        let (left_ids, left_recs) = split(left);
        let (right_ids, right_recs) = split(right);
        let pairs = pairs_across(&self.predicates, self.layout.fields(), &left_recs, &right_recs);
        let scores = self.score_pairs(&left_recs, &right_recs, &pairs);

        let mut scored: Vec<((usize, usize), f64)> = pairs
            .into_iter()
            .zip(scores)
            .filter(|(_, s)| *s >= threshold)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        let mut left_used = vec![false; left_recs.len()];
        let mut right_used = vec![false; right_recs.len()];
        let mut linked = Vec::new();
        for ((i, j), s) in scored {
            if left_used[i] || right_used[j] {
                continue;
            }
            left_used[i] = true;
            right_used[j] = true;
            linked.push(LinkedPair {
                left: left_ids[i].clone(),
                right: right_ids[j].clone(),
                confidence: s,
            });
        }
        Ok(linked)
    }

    fn index(&mut self, canonical: &RecordSet) -> Result<(), EngineError> {
        self.indexed = Some(canonical.clone());
        Ok(())
    }

    fn search(&self, messy: &RecordSet, threshold: f64) -> Result<Vec<SearchResult>, EngineError> {
        let canonical = self.indexed.as_ref().ok_or(EngineError::NotIndexed)?;
        let (messy_ids, messy_recs) = split(messy);
        let (canon_ids, canon_recs) = split(canonical);
        let pairs = pairs_across(&self.predicates, self.layout.fields(), &messy_recs, &canon_recs);
        let scores = self.score_pairs(&messy_recs, &canon_recs, &pairs);

        let mut per_messy: Vec<Vec<(usize, f64)>> = vec![Vec::new(); messy_recs.len()];
        for ((i, j), s) in pairs.into_iter().zip(scores) {
            if s >= threshold {
                per_messy[i].push((j, s));
            }
        }

        Ok(per_messy
            .into_iter()
            .enumerate()
            .filter(|(_, hits)| !hits.is_empty())
            .map(|(i, mut hits)| {
                hits.sort_by(|a, b| b.1.total_cmp(&a.1));
                SearchResult {
                    messy: messy_ids[i].clone(),
                    candidates: hits
                        .into_iter()
                        .map(|(j, s)| (canon_ids[j].clone(), s))
                        .collect(),
                }
            })
            .collect())
    }

    /// Medoid per field: the non-missing value most similar to the others.
    fn canonicalize(&self, members: &[&Record]) -> Record {
        let mut names: Vec<&str> = Vec::new();
        for record in members {
            for name in record.names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }

        let mut canonical = Record::new();
        for name in names {
            let values: Vec<String> = members
                .iter()
                .filter_map(|r| r.get(name).and_then(Value::render))
                .collect();
            let best = values
                .iter()
                .map(|v| {
                    let total: f64 = values.iter().map(|o| strsim::jaro_winkler(v, o)).sum();
                    (v, total)
                })
                .fold(None, |best: Option<(&String, f64)>, (v, total)| match best {
                    Some((_, t)) if t >= total => best,
                    _ => Some((v, total)),
                });
            let value = best.map(|(v, _)| Value::Text(v.clone())).unwrap_or(Value::Null);
            canonical.insert(name, value);
        }
        canonical
    }
}

fn find(parent: &mut [usize], mut x: usize) -> usize {
    while parent[x] != x {
        parent[x] = parent[parent[x]];
        x = parent[x];
    }
    x
}
