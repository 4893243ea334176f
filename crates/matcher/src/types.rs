use engine::EngineError;
use serde::{Deserialize, Serialize};
use table::RecordId;
use thiserror::Error;

/// Which matcher workflow ran. Used for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Duplicate sets within one table.
    SelfMatch,
    /// One-to-one pairings across two tables.
    Link,
    /// Messy records searched against an indexed canonical set.
    Gazetteer,
}

impl MatchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMode::SelfMatch => "self_match",
            MatchMode::Link => "link",
            MatchMode::Gazetteer => "gazetteer",
        }
    }
}

/// How the score cutoff for a run is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Use this cutoff as is.
    Fixed(f64),
    /// Ask the engine for the cutoff maximizing a precision/recall trade-off
    /// where recall counts this many times as much as precision. Only
    /// self-match supports it.
    RecallWeighted(f64),
}

impl ThresholdPolicy {
    pub fn validate(&self) -> Result<(), MatchError> {
        match *self {
            ThresholdPolicy::Fixed(t) if !t.is_finite() || !(0.0..=1.0).contains(&t) => {
                Err(MatchError::InvalidThreshold(t))
            }
            ThresholdPolicy::RecallWeighted(w) if !w.is_finite() || w <= 0.0 => {
                Err(MatchError::InvalidRecallWeight(w))
            }
            _ => Ok(()),
        }
    }
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::RecallWeighted(1.0)
    }
}

/// Raw engine output for one run together with the cutoff it used.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchOutput<T> {
    pub mode: MatchMode,
    pub threshold: f64,
    pub results: T,
}

/// Errors raised by the orchestrator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MatchError {
    #[error("threshold must be a finite value in [0, 1], got {0}")]
    InvalidThreshold(f64),
    #[error("recall weight must be a finite positive value, got {0}")]
    InvalidRecallWeight(f64),
    #[error("{} does not support a recall-weighted threshold; use a fixed cutoff", .0.as_str())]
    UnsupportedPolicy(MatchMode),
    #[error("record id {0} appears in both sets; tag each set with its own prefix")]
    OverlappingIds(RecordId),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
