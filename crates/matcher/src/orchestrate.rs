use std::time::Instant;

use engine::{LinkedPair, MatchingEngine, ScoredCluster, SearchResult};
use table::RecordSet;
use tracing::{info, Level};

use crate::types::{MatchError, MatchMode, MatchOutput, ThresholdPolicy};

#[cfg(test)]
mod tests;

fn fixed_only(policy: ThresholdPolicy, mode: MatchMode) -> Result<f64, MatchError> {
    policy.validate()?;
    match policy {
        ThresholdPolicy::Fixed(t) => Ok(t),
        ThresholdPolicy::RecallWeighted(_) => Err(MatchError::UnsupportedPolicy(mode)),
    }
}

/// Partition one record set into duplicate sets.
///
/// Cluster order is the engine's enumeration order; callers number
/// clusters by position.
pub fn self_match<E: MatchingEngine>(
    engine: &E,
    records: &RecordSet,
    policy: ThresholdPolicy,
) -> Result<MatchOutput<Vec<ScoredCluster>>, MatchError> {
    policy.validate()?;
    let span = tracing::span!(Level::INFO, "matcher.self_match", records = records.len());
    let _guard = span.enter();
    let start = Instant::now();

    let threshold = match policy {
        ThresholdPolicy::Fixed(t) => t,
        ThresholdPolicy::RecallWeighted(w) => engine.threshold(records, w)?,
    };
    let clusters = engine.partition(records, threshold)?;

    info!(
        threshold,
        clusters = clusters.len(),
        clustered_records = clusters.iter().map(ScoredCluster::len).sum::<usize>(),
        elapsed_micros = start.elapsed().as_micros(),
        "self_match_complete"
    );
    Ok(MatchOutput {
        mode: MatchMode::SelfMatch,
        threshold,
        results: clusters,
    })
}

/// Pair records across two sets whose ids must not overlap.
///
/// A fixed cutoff of `0.0` accepts every pairing the engine proposes.
pub fn link<E: MatchingEngine>(
    engine: &E,
    left: &RecordSet,
    right: &RecordSet,
    policy: ThresholdPolicy,
) -> Result<MatchOutput<Vec<LinkedPair>>, MatchError> {
    let threshold = fixed_only(policy, MatchMode::Link)?;
    if let Some(shared) = left.ids().find(|id| right.contains(id)) {
        return Err(MatchError::OverlappingIds(shared.clone()));
    }
    let span = tracing::span!(
        Level::INFO,
        "matcher.link",
        left = left.len(),
        right = right.len()
    );
    let _guard = span.enter();
    let start = Instant::now();

    let pairs = engine.join(left, right, threshold)?;

    info!(
        threshold,
        pairs = pairs.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "link_complete"
    );
    Ok(MatchOutput {
        mode: MatchMode::Link,
        threshold,
        results: pairs,
    })
}

/// Index `canonical` once, then search every messy record against it.
///
/// A messy record may come back with several candidates; picking one is
/// left to the caller.
pub fn gazetteer_search<E: MatchingEngine>(
    engine: &mut E,
    canonical: &RecordSet,
    messy: &RecordSet,
    policy: ThresholdPolicy,
) -> Result<MatchOutput<Vec<SearchResult>>, MatchError> {
    let threshold = fixed_only(policy, MatchMode::Gazetteer)?;
    let span = tracing::span!(
        Level::INFO,
        "matcher.gazetteer",
        canonical = canonical.len(),
        messy = messy.len()
    );
    let _guard = span.enter();
    let start = Instant::now();

    engine.index(canonical)?;
    let results = engine.search(messy, threshold)?;

    info!(
        threshold,
        matched_messy = results.len(),
        candidates = results.iter().map(|r| r.candidates.len()).sum::<usize>(),
        elapsed_micros = start.elapsed().as_micros(),
        "gazetteer_search_complete"
    );
    Ok(MatchOutput {
        mode: MatchMode::Gazetteer,
        threshold,
        results,
    })
}
