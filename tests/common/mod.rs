#![allow(dead_code)]

use recordlink::{EngineError, LabelDecision, Labeler, RecordPair, Table, Value};

/// Labels a pair a match when both records carry the same `entity` value.
/// Finishes after `budget` prompts.
pub struct OracleLabeler {
    pub prompts: usize,
    budget: usize,
}

impl OracleLabeler {
    pub fn new(budget: usize) -> Self {
        Self { prompts: 0, budget }
    }
}

impl Labeler for OracleLabeler {
    fn label(&mut self, pair: &RecordPair) -> Result<LabelDecision, EngineError> {
        self.prompts += 1;
        if self.prompts > self.budget {
            return Ok(LabelDecision::Finished);
        }
        let same = pair.left.get("entity") == pair.right.get("entity");
        Ok(if same {
            LabelDecision::Match
        } else {
            LabelDecision::Distinct
        })
    }
}

pub fn text(s: &str) -> Value {
    Value::from(s)
}

/// Companies with near-duplicate spellings, tagged by true entity.
pub fn companies() -> Table {
    let rows = [
        ("Acme Corp", "Berlin", "e1"),
        ("ACME corp.", "berlin", "e1"),
        ("Acme Corporation", "Berlin", "e1"),
        ("Globex", "Paris", "e2"),
        ("globex", "PARIS", "e2"),
        ("Initech", "Austin", "e3"),
        ("Umbrella", "Raccoon City", "e4"),
        ("Umbrella Corp", "raccoon city", "e4"),
    ];
    Table::from_rows(
        ["name", "city", "entity"],
        rows.iter()
            .map(|(n, c, e)| vec![text(n), text(c), text(e)])
            .collect(),
    )
    .expect("companies table")
}

pub fn file_count(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).expect("read dir").count()
}
