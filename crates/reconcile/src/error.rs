use table::{RecordId, TableError};
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReconcileError {
    #[error("result column '{0}' already exists in the input table")]
    ColumnClash(String),
    #[error("record {0} was assigned to more than one cluster")]
    DuplicateAssignment(RecordId),
    #[error("assignment refers to record {0}, which is not in the table")]
    UnknownRecord(RecordId),
    #[error("row {0} carries no dataset tag")]
    UntaggedRow(RecordId),
    #[error(transparent)]
    Table(#[from] TableError),
}
