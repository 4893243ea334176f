use std::collections::HashMap;

use engine::{LinkedPair, MatchingEngine, ScoredCluster, SearchResult};
use table::{Record, RecordId, RecordSet};
use tracing::debug;

use crate::types::{Assignment, Canonicalize, ClusterId, LinkAssignment};

/// Members of `ids` that exist in `records`, stringified.
fn members<'a>(ids: impl Iterator<Item = &'a RecordId>, records: &RecordSet) -> Vec<Record> {
    ids.filter_map(|id| records.get(id)).map(Record::stringified).collect()
}

fn canonical_values<E: MatchingEngine>(
    engine: &E,
    members: &[Record],
    canonicalize: &Canonicalize,
) -> Vec<(String, table::Value)> {
    if !canonicalize.is_enabled() || members.is_empty() {
        return Vec::new();
    }
    let refs: Vec<&Record> = members.iter().collect();
    canonicalize.select(&engine.canonicalize(&refs))
}

/// Rows for self-match output: one per clustered record, numbered by
/// cluster position.
pub fn assemble_clusters<E: MatchingEngine>(
    engine: &E,
    clusters: &[ScoredCluster],
    records: &RecordSet,
    canonicalize: &Canonicalize,
) -> Vec<Assignment> {
    let mut rows = Vec::new();
    for (n, cluster) in clusters.iter().enumerate() {
        let canonical =
            canonical_values(engine, &members(cluster.ids(), records), canonicalize);
        for (record_id, confidence) in &cluster.members {
            rows.push(Assignment {
                record_id: record_id.clone(),
                cluster_id: ClusterId::Seq(n),
                confidence: *confidence,
                canonical: canonical.clone(),
            });
        }
    }
    debug!(clusters = clusters.len(), rows = rows.len(), "clusters_assembled");
    rows
}

/// Rows for two-set link output, one per pair in engine order.
pub fn assemble_links<E: MatchingEngine>(
    engine: &E,
    pairs: &[LinkedPair],
    left: &RecordSet,
    right: &RecordSet,
    canonicalize: &Canonicalize,
) -> Vec<LinkAssignment> {
    pairs
        .iter()
        .enumerate()
        .map(|(n, pair)| {
            let mut group = members(std::iter::once(&pair.left), left);
            group.extend(members(std::iter::once(&pair.right), right));
            LinkAssignment {
                cluster_id: n,
                left: pair.left.clone(),
                right: pair.right.clone(),
                confidence: pair.confidence,
                canonical: canonical_values(engine, &group, canonicalize),
            }
        })
        .collect()
}

/// One row per messy record: the candidate with the highest confidence.
///
/// Ties keep the candidate the matcher listed first. Canonical values come
/// from the chosen canonical record. Rows follow the order in which messy
/// records first appear in `results`.
pub fn assemble_gazetteer(
    results: &[SearchResult],
    canonical: &RecordSet,
    canonicalize: &Canonicalize,
) -> Vec<Assignment> {
    let mut best: Vec<(RecordId, RecordId, f64)> = Vec::new();
    let mut slot: HashMap<&RecordId, usize> = HashMap::new();

    for result in results {
        for (canon_id, confidence) in &result.candidates {
            match slot.get(&result.messy) {
                Some(&i) => {
                    if *confidence > best[i].2 {
                        best[i] = (result.messy.clone(), canon_id.clone(), *confidence);
                    }
                }
                None => {
                    slot.insert(&result.messy, best.len());
                    best.push((result.messy.clone(), canon_id.clone(), *confidence));
                }
            }
        }
    }

    let rows: Vec<Assignment> = best
        .into_iter()
        .map(|(messy, canon_id, confidence)| {
            let canonical_fields = canonical
                .get(&canon_id)
                .map(|r| canonicalize.select(&r.stringified()))
                .unwrap_or_default();
            Assignment {
                record_id: messy,
                cluster_id: ClusterId::Canonical(canon_id),
                confidence,
                canonical: canonical_fields,
            }
        })
        .collect();
    debug!(messy = rows.len(), "gazetteer_assembled");
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::SimilarityEngine;
    use fields::{FieldSpec, FieldType};
    use table::Value;

    fn engine() -> SimilarityEngine {
        SimilarityEngine::new(&[FieldSpec::new("name", FieldType::String)], 1).expect("engine")
    }

    fn records(rows: &[(&str, &str, Value)]) -> RecordSet {
        let mut set = RecordSet::new();
        for (id, name, price) in rows {
            let r: Record = [("name", Value::from(*name)), ("price", price.clone())]
                .into_iter()
                .collect();
            set.insert(RecordId::new(*id), r).expect("insert");
        }
        set
    }

    fn id(s: &str) -> RecordId {
        RecordId::new(s)
    }

    #[test]
    fn clusters_numbered_in_matcher_order() {
        let set = records(&[
            ("0", "acme", Value::Float(10.0)),
            ("1", "acme", Value::Float(10.0)),
            ("2", "globex", Value::Null),
            ("3", "globex", Value::Float(5.5)),
        ]);
        let clusters = vec![
            ScoredCluster {
                members: vec![(id("2"), 0.8), (id("3"), 0.7)],
            },
            ScoredCluster {
                members: vec![(id("0"), 0.9), (id("1"), 0.95)],
            },
        ];
        let rows = assemble_clusters(&engine(), &clusters, &set, &Canonicalize::All);
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].record_id, id("2"));
        assert_eq!(rows[0].cluster_id, ClusterId::Seq(0));
        assert_eq!(rows[3].cluster_id, ClusterId::Seq(1));
        assert_eq!(rows[3].confidence, 0.95);
        assert_eq!(
            rows[0].canonical,
            vec![
                ("name".to_string(), Value::from("globex")),
                ("price".to_string(), Value::from("5.5"))
            ]
        );
    }

    #[test]
    fn canonical_subset_only() {
        let set = records(&[("0", "acme", Value::Null), ("1", "acme", Value::Null)]);
        let clusters = vec![ScoredCluster {
            members: vec![(id("0"), 1.0), (id("1"), 1.0)],
        }];
        let subset = Canonicalize::Fields(vec!["name".into()]);
        let rows = assemble_clusters(&engine(), &clusters, &set, &subset);
        for row in rows {
            let names: Vec<&str> = row.canonical.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["name"]);
        }
        let off = assemble_clusters(&engine(), &clusters, &set, &Canonicalize::Off);
        assert!(off.iter().all(|r| r.canonical.is_empty()));
    }

    #[test]
    fn links_numbered_by_position() {
        let left = records(&[("dfa0", "acme", Value::Null), ("dfa1", "globex", Value::Null)]);
        let right = records(&[("dfb0", "globex", Value::Null), ("dfb1", "acme", Value::Null)]);
        let pairs = vec![
            LinkedPair {
                left: id("dfa1"),
                right: id("dfb0"),
                confidence: 0.99,
            },
            LinkedPair {
                left: id("dfa0"),
                right: id("dfb1"),
                confidence: 0.9,
            },
        ];
        let links = assemble_links(&engine(), &pairs, &left, &right, &Canonicalize::from(true));
        assert_eq!(links[0].cluster_id, 0);
        assert_eq!(links[0].left, id("dfa1"));
        assert_eq!(links[1].cluster_id, 1);
        assert_eq!(links[1].canonical[0], ("name".to_string(), Value::from("acme")));
    }

    #[test]
    fn gazetteer_keeps_best_and_first_tie() {
        let gazette = records(&[
            ("c1", "acme", Value::Null),
            ("c2", "acme corp", Value::Null),
            ("c3", "acme co", Value::Null),
        ]);
        let results = vec![SearchResult {
            messy: id("m"),
            candidates: vec![(id("c1"), 0.9), (id("c2"), 0.95), (id("c3"), 0.95)],
        }];
        let rows = assemble_gazetteer(&results, &gazette, &Canonicalize::All);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].record_id, id("m"));
        assert_eq!(rows[0].cluster_id, ClusterId::Canonical(id("c2")));
        assert_eq!(rows[0].confidence, 0.95);
        assert_eq!(rows[0].canonical[0], ("name".to_string(), Value::from("acme corp")));
    }

    #[test]
    fn gazetteer_merges_repeated_messy_ids_in_first_seen_order() {
        let gazette = records(&[("c1", "acme", Value::Null), ("c2", "globex", Value::Null)]);
        let results = vec![
            SearchResult {
                messy: id("m2"),
                candidates: vec![(id("c2"), 0.5)],
            },
            SearchResult {
                messy: id("m1"),
                candidates: vec![(id("c1"), 0.4)],
            },
            SearchResult {
                messy: id("m2"),
                candidates: vec![(id("c1"), 0.7)],
            },
        ];
        let rows = assemble_gazetteer(&results, &gazette, &Canonicalize::Off);
        let order: Vec<&str> = rows.iter().map(|r| r.record_id.as_str()).collect();
        assert_eq!(order, vec!["m2", "m1"]);
        assert_eq!(rows[0].cluster_id, ClusterId::Canonical(id("c1")));
        assert_eq!(rows[0].confidence, 0.7);
    }
}
