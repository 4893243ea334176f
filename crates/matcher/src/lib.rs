//! # recordlink matcher (`matcher`)
//!
//! ## Purpose
//!
//! `matcher` drives a trained [`engine::MatchingEngine`] through one of the
//! three workflows and settles the score cutoff for the run. It does not
//! train, normalize or shape output; it only turns record sets into raw
//! engine results.
//!
//! ## Workflows
//!
//! - [`self_match`]: duplicate sets within one record set. The cutoff is a
//!   fixed value or the engine's recall-weighted optimum.
//! - [`link`]: one-to-one pairings across two record sets with disjoint ids.
//! - [`gazetteer_search`]: index a canonical set, search messy records
//!   against it; several candidates per messy record are possible.
//!
//! ## Threshold policy
//!
//! [`ThresholdPolicy::Fixed`] is accepted everywhere.
//! [`ThresholdPolicy::RecallWeighted`] is only meaningful for self-match and
//! is rejected for the other workflows with [`MatchError::UnsupportedPolicy`].
//!
//! ## Example Usage
//!
//! ```
//! use engine::{MatchingEngine, SimilarityEngine};
//! use fields::{FieldSpec, FieldType};
//! use matcher::{self_match, ThresholdPolicy};
//! use table::{Record, RecordId, RecordSet, Value};
//!
//! let engine = SimilarityEngine::new(&[FieldSpec::new("name", FieldType::String)], 1)
//!     .expect("engine");
//! let mut records = RecordSet::new();
//! for (i, name) in ["acme corp", "acme corp", "globex"].into_iter().enumerate() {
//!     let r: Record = [("name", Value::from(name))].into_iter().collect();
//!     records.insert(RecordId::from(i), r).expect("insert");
//! }
//!
//! let out = self_match(&engine, &records, ThresholdPolicy::RecallWeighted(1.0)).expect("match");
//! println!("threshold={} clusters={}", out.threshold, out.results.len());
//! ```

mod orchestrate;
mod types;

pub use crate::orchestrate::{gazetteer_search, link, self_match};
pub use crate::types::{MatchError, MatchMode, MatchOutput, ThresholdPolicy};
