use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

/// Failures raised by a matching engine or a labeler.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("engine needs at least one field to compare")]
    NoFields,
    #[error("settings encode error: {0}")]
    Encode(String),
    #[error("settings decode error: {0}")]
    Decode(String),
    #[error("settings were written by format version {found}, this build reads version {expected}")]
    SettingsVersion { found: u32, expected: u32 },
    #[error("failed to build the scoring thread pool: {0}")]
    ThreadPool(String),
    #[error("search called before a canonical set was indexed")]
    NotIndexed,
    #[error("training data error: {0}")]
    Training(String),
    #[error("labeler I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EncodeError> for EngineError {
    fn from(e: EncodeError) -> Self {
        EngineError::Encode(e.to_string())
    }
}

impl From<DecodeError> for EngineError {
    fn from(e: DecodeError) -> Self {
        EngineError::Decode(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Training(e.to_string())
    }
}
