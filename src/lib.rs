//! Workspace umbrella crate for recordlink.
//!
//! Stitches the stage crates into four table-level workflows:
//!
//! - [`dedupe_table`]: cluster duplicate rows of one table
//! - [`link_tables`]: pair rows across two tables, stacked by cluster
//! - [`left_join_tables`]: enrich a primary table with its best match from
//!   a secondary table
//! - [`gazetteer_match`]: resolve a messy table against a one-column
//!   reference table
//!
//! Each run normalizes the input, loads or trains a model under a
//! configuration name, matches, and joins the result columns
//! (`cluster_id`, `confidence`, optional `canonical_<field>`) back onto the
//! caller's tables. The `*_with` variants take any [`MatchingEngine`]; the
//! plain ones use the built-in [`SimilarityEngine`].

pub mod config;
mod options;
mod workflow;

pub use cluster::{Assignment, Canonicalize, ClusterId, LinkAssignment};
pub use engine::{
    ConsoleLabeler, EngineError, Label, LabelDecision, Labeler, MatchingEngine, RecordPair,
    ScriptedLabeler, SimilarityEngine, TrainingPairs,
};
pub use fields::{compile, FieldError, FieldSpec, FieldType, Modifier, RawFieldSpec};
pub use matcher::{MatchError, MatchMode, ThresholdPolicy};
pub use model::{ArtifactPaths, ArtifactStore, ModelError, ModelOrigin, ModelState};
pub use normalize::{normalize_table, normalize_text, NormalizeConfig, NormalizeError};
pub use reconcile::{
    Dataset, ReconcileError, CANONICAL_PREFIX, CLUSTER_ID_COLUMN, CONFIDENCE_COLUMN,
};
pub use table::{read_csv, read_csv_path, write_csv, RecordId, Table, TableError, Value};

pub use crate::config::{ConfigLoadError, RecordLinkConfig};
pub use crate::options::{DedupeOptions, GazetteerOptions, LinkOptions};
pub use crate::workflow::{
    dedupe_table, dedupe_table_with, gazetteer_match, gazetteer_match_with, left_join_tables,
    left_join_tables_with, link_tables, link_tables_with,
};

use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};

/// Errors that can occur while running a workflow.
#[derive(Debug)]
pub enum PipelineError {
    Fields(FieldError),
    Normalize(NormalizeError),
    Model(ModelError),
    Match(MatchError),
    Reconcile(ReconcileError),
    Table(TableError),
    /// A canonical subset names a column the workflow's records lack.
    UnknownCanonicalField(String),
    /// A field spec names a column the input table lacks.
    UnknownField(String),
    /// The gazette must have exactly one column.
    GazetteShape { columns: usize },
    /// Gazetteer runs take exactly one bare field name.
    GazetteerFieldSpec(Vec<RawFieldSpec>),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Fields(err) => write!(f, "field spec error: {err}"),
            PipelineError::Normalize(err) => write!(f, "normalization failure: {err}"),
            PipelineError::Model(err) => write!(f, "model lifecycle failure: {err}"),
            PipelineError::Match(err) => write!(f, "matching failure: {err}"),
            PipelineError::Reconcile(err) => write!(f, "reconciliation failure: {err}"),
            PipelineError::Table(err) => write!(f, "table error: {err}"),
            PipelineError::UnknownCanonicalField(name) => {
                write!(f, "cannot canonicalize unknown field '{name}'")
            }
            PipelineError::UnknownField(name) => {
                write!(f, "field '{name}' is not a column of the input table")
            }
            PipelineError::GazetteShape { columns } => write!(
                f,
                "gazette must have exactly one column, found {columns}"
            ),
            PipelineError::GazetteerFieldSpec(spec) => write!(
                f,
                "gazetteer matching takes exactly one bare field name, got {spec:?}"
            ),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Fields(err) => Some(err),
            PipelineError::Normalize(err) => Some(err),
            PipelineError::Model(err) => Some(err),
            PipelineError::Match(err) => Some(err),
            PipelineError::Reconcile(err) => Some(err),
            PipelineError::Table(err) => Some(err),
            PipelineError::UnknownCanonicalField(_)
            | PipelineError::UnknownField(_)
            | PipelineError::GazetteShape { .. }
            | PipelineError::GazetteerFieldSpec(_) => None,
        }
    }
}

impl From<FieldError> for PipelineError {
    fn from(value: FieldError) -> Self {
        PipelineError::Fields(value)
    }
}

impl From<NormalizeError> for PipelineError {
    fn from(value: NormalizeError) -> Self {
        PipelineError::Normalize(value)
    }
}

impl From<ModelError> for PipelineError {
    fn from(value: ModelError) -> Self {
        PipelineError::Model(value)
    }
}

impl From<MatchError> for PipelineError {
    fn from(value: MatchError) -> Self {
        PipelineError::Match(value)
    }
}

impl From<ReconcileError> for PipelineError {
    fn from(value: ReconcileError) -> Self {
        PipelineError::Reconcile(value)
    }
}

impl From<TableError> for PipelineError {
    fn from(value: TableError) -> Self {
        PipelineError::Table(value)
    }
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_normalize(&self, latency: Duration, result: Result<(), &NormalizeError>);
    fn record_training(&self, latency: Duration, result: Result<ModelOrigin, &ModelError>);
    fn record_matching(&self, latency: Duration, mode: MatchMode, result: Result<(), &MatchError>);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

pub(crate) struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    pub(crate) fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    pub(crate) fn record_normalize(self, result: Result<(), &NormalizeError>) {
        self.recorder.record_normalize(self.start.elapsed(), result);
    }

    pub(crate) fn record_training(self, result: Result<ModelOrigin, &ModelError>) {
        self.recorder.record_training(self.start.elapsed(), result);
    }

    pub(crate) fn record_matching(self, mode: MatchMode, result: Result<(), &MatchError>) {
        self.recorder
            .record_matching(self.start.elapsed(), mode, result);
    }
}
