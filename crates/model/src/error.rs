use std::path::PathBuf;

use engine::EngineError;
use thiserror::Error;

/// Failures while resolving, training or persisting a model.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ModelError {
    #[error("sample fraction must be a finite value in [0, 1], got {0}")]
    InvalidSampleFraction(f64),
    #[error("artifact I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("training file {path} is not valid training JSON: {reason}")]
    CorruptTraining { path: PathBuf, reason: String },
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ModelError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ModelError::Io {
            path: path.into(),
            source,
        }
    }
}
