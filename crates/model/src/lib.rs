//! Model lifecycle for recordlink.
//!
//! A configuration name owns two artifacts in an artifact directory:
//!
//! | file | contents |
//! |------|----------|
//! | `<name>_learned_settings` | engine settings blob (opaque) |
//! | `<name>_training.json` | labeled pairs, `{"match": [...], "distinct": [...]}` |
//!
//! [`ArtifactStore::state`] maps what is on disk to a [`ModelState`]:
//! no settings is `Cold`, settings without an update request is `Warm`,
//! settings with an update request is `Update`. [`ModelLifecycle::resolve`]
//! turns that state into a [`TrainedModel`], running an active-learning
//! session for `Cold` and `Update` and loading settings verbatim for `Warm`.
//!
//! Artifacts are written once per session, after training, training blob
//! first. Callers must not run two sessions against the same name at once.

mod error;
mod lifecycle;
mod store;

pub use crate::error::ModelError;
pub use crate::lifecycle::{run_active_learning, ModelLifecycle, ModelOrigin, TrainedModel};
pub use crate::store::{sanitize_name, ArtifactPaths, ArtifactStore, ModelState};
