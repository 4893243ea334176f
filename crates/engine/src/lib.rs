//! # recordlink engine (`engine`)
//!
//! The statistical half of record linkage lives behind [`MatchingEngine`]:
//! candidate sampling, active-learning label acquisition, classifier and
//! blocking-rule training, thresholding, clustering, two-set joins and
//! gazetteer search. The orchestration crates only ever talk to the trait.
//!
//! [`SimilarityEngine`] is the built-in implementation:
//! - per-field similarity (Jaro-Winkler for strings, Sørensen-Dice for long
//!   text, normalized Levenshtein for `crf` fields, equality for `Exact`,
//!   relative difference for `Price`, distance decay for `LatLong`)
//! - logistic regression over those similarities, falling back to their
//!   mean until both match and distinct labels exist
//! - greedy blocking-predicate learning for large inputs
//! - a rayon pool sized by the caller's core count for pair scoring
//!
//! Labels come from a [`Labeler`]: [`ConsoleLabeler`] for interactive use,
//! [`ScriptedLabeler`] for replaying recorded answers.
//!
//! ```
//! use engine::{MatchingEngine, SimilarityEngine};
//! use fields::{FieldSpec, FieldType};
//! use table::{Record, RecordId, RecordSet, Value};
//!
//! let fields = [FieldSpec::new("name", FieldType::String)];
//! let engine = SimilarityEngine::new(&fields, 1).expect("engine");
//!
//! let mut records = RecordSet::new();
//! for (i, name) in ["acme corp", "acme corp", "globex"].into_iter().enumerate() {
//!     let r: Record = [("name", Value::from(name))].into_iter().collect();
//!     records.insert(RecordId::from(i), r).expect("insert");
//! }
//! let clusters = engine.partition(&records, 0.9).expect("partition");
//! assert_eq!(clusters.len(), 1);
//! ```

mod contract;
mod error;
mod labeler;
mod similarity;
mod types;

pub use crate::contract::MatchingEngine;
pub use crate::error::EngineError;
pub use crate::labeler::{ConsoleLabeler, LabelDecision, Labeler, ScriptedLabeler};
pub use crate::similarity::{SimilarityEngine, SETTINGS_VERSION};
pub use crate::types::{
    Label, LinkedPair, RecordPair, ScoredCluster, SearchResult, TrainingInput, TrainingPairs,
};
