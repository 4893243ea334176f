//! Blocking predicates and candidate-pair generation.

use std::collections::{BTreeSet, HashMap};

use fields::{FieldSpec, FieldType};
use serde::{Deserialize, Serialize};
use table::{Record, Value};

/// Above this many possible pairs, candidates come from blocking instead
/// of a full comparison.
pub(crate) const FULL_SCAN_PAIRS: usize = 50_000;

const PREFIX_LEN: usize = 3;

/// Cheap key extractor over one field (by position in the field list).
/// Two records land in the same block when a predicate yields the same key
/// for both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub(crate) enum Predicate {
    FirstToken(usize),
    Prefix(usize),
    WholeValue(usize),
}

impl Predicate {
    fn field(&self) -> usize {
        match self {
            Predicate::FirstToken(f) | Predicate::Prefix(f) | Predicate::WholeValue(f) => *f,
        }
    }

    pub(crate) fn key(&self, fields: &[FieldSpec], record: &Record) -> Option<String> {
        let field = fields.get(self.field())?;
        let value = record.get(&field.name).filter(|v| !v.is_null())?;
        let body = match (self, field.field_type) {
            (Predicate::WholeValue(_), FieldType::LatLong) => {
                let (lat, lon) = value.as_lat_long()?;
                format!("{lat:.2},{lon:.2}")
            }
            (Predicate::WholeValue(_), _) => value.render()?,
            (_, FieldType::Price | FieldType::LatLong) => return None,
            (Predicate::FirstToken(_), _) => value.render()?.split_whitespace().next()?.to_string(),
            (Predicate::Prefix(_), _) => text_prefix(value)?,
        };
        let tag = match self {
            Predicate::FirstToken(_) => 't',
            Predicate::Prefix(_) => 'p',
            Predicate::WholeValue(_) => 'w',
        };
        Some(format!("{}:{tag}:{body}", self.field()))
    }

    fn covers(&self, fields: &[FieldSpec], a: &Record, b: &Record) -> bool {
        match (self.key(fields, a), self.key(fields, b)) {
            (Some(ka), Some(kb)) => ka == kb,
            _ => false,
        }
    }
}

fn text_prefix(value: &Value) -> Option<String> {
    let text = value.render()?;
    let prefix: String = text.chars().take(PREFIX_LEN).collect();
    (prefix.chars().count() == PREFIX_LEN).then_some(prefix)
}

/// Every predicate applicable to the field list.
pub(crate) fn default_predicates(fields: &[FieldSpec]) -> Vec<Predicate> {
    fields
        .iter()
        .enumerate()
        .flat_map(|(i, f)| {
            if f.field_type.is_textual() {
                vec![Predicate::FirstToken(i), Predicate::Prefix(i)]
            } else {
                vec![Predicate::WholeValue(i)]
            }
        })
        .collect()
}

/// Greedy set cover over labeled matches.
///
/// Picks, repeatedly, the predicate covering the most still-uncovered
/// matches (fewest covered distinct pairs breaks ties), until every match
/// is covered or nothing adds coverage. With no matches the full default
/// set is returned.
pub(crate) fn learn_predicates(
    fields: &[FieldSpec],
    matches: &[(&Record, &Record)],
    distinct: &[(&Record, &Record)],
) -> Vec<Predicate> {
    let all = default_predicates(fields);
    if matches.is_empty() {
        return all;
    }

    let coverage: Vec<(Predicate, Vec<bool>, usize)> = all
        .iter()
        .map(|p| {
            let hits: Vec<bool> = matches.iter().map(|(a, b)| p.covers(fields, a, b)).collect();
            let false_hits = distinct.iter().filter(|(a, b)| p.covers(fields, a, b)).count();
            (*p, hits, false_hits)
        })
        .collect();

    let mut uncovered = vec![true; matches.len()];
    let mut chosen = Vec::new();
    loop {
        let best = coverage
            .iter()
            .filter(|(p, _, _)| !chosen.contains(p))
            .map(|(p, hits, false_hits)| {
                let gain = hits.iter().zip(&uncovered).filter(|(h, u)| **h && **u).count();
                (p, hits, gain, *false_hits)
            })
            .filter(|(_, _, gain, _)| *gain > 0)
            .min_by_key(|(_, _, gain, false_hits)| (std::cmp::Reverse(*gain), *false_hits));

        let Some((p, hits, _, _)) = best else {
            break;
        };
        chosen.push(*p);
        for (u, h) in uncovered.iter_mut().zip(hits) {
            if *h {
                *u = false;
            }
        }
        if !uncovered.contains(&true) {
            break;
        }
    }

    if chosen.is_empty() {
        all
    } else {
        chosen
    }
}

/// Candidate pairs `(i, j)`, `i < j`, within one set of records.
pub(crate) fn pairs_within(
    predicates: &[Predicate],
    fields: &[FieldSpec],
    records: &[&Record],
) -> Vec<(usize, usize)> {
    let n = records.len();
    if n.saturating_mul(n.saturating_sub(1)) / 2 <= FULL_SCAN_PAIRS {
        return (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
    }

    let blocks = block_index(predicates, fields, records);
    let mut pairs = BTreeSet::new();
    for members in blocks.values() {
        for (k, &i) in members.iter().enumerate() {
            for &j in &members[k + 1..] {
                pairs.insert((i.min(j), i.max(j)));
            }
        }
    }
    pairs.into_iter().collect()
}

/// Candidate pairs `(i, j)` with `i` indexing `left` and `j` indexing
/// `right`.
pub(crate) fn pairs_across(
    predicates: &[Predicate],
    fields: &[FieldSpec],
    left: &[&Record],
    right: &[&Record],
) -> Vec<(usize, usize)> {
    if left.len().saturating_mul(right.len()) <= FULL_SCAN_PAIRS {
        return (0..left.len())
            .flat_map(|i| (0..right.len()).map(move |j| (i, j)))
            .collect();
    }

    let blocks = block_index(predicates, fields, right);
    let mut pairs = BTreeSet::new();
    for (i, record) in left.iter().enumerate() {
        for p in predicates {
            if let Some(members) = p.key(fields, record).and_then(|k| blocks.get(&k)) {
                pairs.extend(members.iter().map(|&j| (i, j)));
            }
        }
    }
    pairs.into_iter().collect()
}

fn block_index(
    predicates: &[Predicate],
    fields: &[FieldSpec],
    records: &[&Record],
) -> HashMap<String, Vec<usize>> {
    let mut blocks: HashMap<String, Vec<usize>> = HashMap::new();
    for (i, record) in records.iter().enumerate() {
        for p in predicates {
            if let Some(key) = p.key(fields, record) {
                blocks.entry(key).or_default().push(i);
            }
        }
    }
    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("name", FieldType::String),
            FieldSpec::new("zip", FieldType::Exact),
        ]
    }

    fn rec(name: &str, zip: &str) -> Record {
        [("name", Value::from(name)), ("zip", Value::from(zip))]
            .into_iter()
            .collect()
    }

    #[test]
    fn keys_are_namespaced_by_field_and_kind() {
        let f = fields();
        let r = rec("acme corp", "10115");
        assert_eq!(Predicate::FirstToken(0).key(&f, &r).as_deref(), Some("0:t:acme"));
        assert_eq!(Predicate::Prefix(0).key(&f, &r).as_deref(), Some("0:p:acm"));
        assert_eq!(Predicate::WholeValue(1).key(&f, &r).as_deref(), Some("1:w:10115"));
        assert_eq!(Predicate::Prefix(0).key(&f, &rec("ab", "1")), None);
    }

    #[test]
    fn greedy_cover_prefers_precise_predicates() {
        let f = fields();
        let m1 = (rec("acme corp", "10115"), rec("acme corporation", "10115"));
        let m2 = (rec("globex ltd", "20095"), rec("globex", "20095"));
        let d1 = (rec("acme corp", "10115"), rec("acme tools", "80331"));
        let matches = vec![(&m1.0, &m1.1), (&m2.0, &m2.1)];
        let distinct = vec![(&d1.0, &d1.1)];

        let learned = learn_predicates(&f, &matches, &distinct);
        assert_eq!(learned, vec![Predicate::WholeValue(1)]);
    }

    #[test]
    fn no_matches_means_default_set() {
        let f = fields();
        assert_eq!(learn_predicates(&f, &[], &[]), default_predicates(&f));
    }

    #[test]
    fn small_sets_compare_every_pair() {
        let f = fields();
        let rs = [rec("a b c", "1"), rec("x y z", "2"), rec("q r s", "3")];
        let refs: Vec<&Record> = rs.iter().collect();
        assert_eq!(pairs_within(&[], &f, &refs), vec![(0, 1), (0, 2), (1, 2)]);
        assert_eq!(pairs_across(&[], &f, &refs[..1], &refs[1..]).len(), 2);
    }
}
