//! Reconciliation of cluster rows with the caller's tables.
//!
//! - [`join_assignments`]: left join onto one table; every input row stays
//!   and unmatched rows get null result cells
//! - [`stack_linked`]: two tagged tables stacked, sorted by cluster id
//! - [`best_single_match`]: enrich the primary table with the best row from
//!   the secondary table in the same cluster
//!
//! Two-table workflows tag row ids with [`Dataset`] prefixes (`dfa`, `dfb`)
//! so ids from both tables can share one namespace.

mod best;
mod dataset;
mod error;
mod join;

pub use crate::best::best_single_match;
pub use crate::dataset::Dataset;
pub use crate::error::ReconcileError;
pub use crate::join::{
    canonical_column, join_assignments, sort_by_cluster, stack_linked, CANONICAL_PREFIX,
    CLUSTER_ID_COLUMN, CONFIDENCE_COLUMN,
};
