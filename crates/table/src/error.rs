use thiserror::Error;

use crate::value::RecordId;

/// Errors raised while building, reshaping, or loading tables.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TableError {
    #[error("row '{record}' has {found} cells, table has {expected} columns")]
    WidthMismatch {
        record: RecordId,
        expected: usize,
        found: usize,
    },
    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("duplicate record id '{0}'")]
    DuplicateRecord(RecordId),
    #[error("unknown column '{0}'")]
    UnknownColumn(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
