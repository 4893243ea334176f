//! Cluster result assembly.
//!
//! Converts raw matcher output into [`Assignment`] rows carrying a cluster
//! id, a confidence and optional canonical values:
//!
//! - [`assemble_clusters`]: self-match duplicate sets, numbered by position
//! - [`assemble_links`]: two-set pairs, numbered by position
//! - [`assemble_gazetteer`]: one row per messy record, best candidate wins
//!
//! Canonical values are always computed from stringified records, so typed
//! Price and LatLong cells render the same way they were written.

mod assemble;
mod types;

pub use crate::assemble::{assemble_clusters, assemble_gazetteer, assemble_links};
pub use crate::types::{Assignment, Canonicalize, ClusterId, LinkAssignment};
