use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use atomicwrites::{AtomicFile, OverwriteBehavior};
use engine::TrainingPairs;
use tracing::warn;

use crate::error::ModelError;

const SETTINGS_SUFFIX: &str = "_learned_settings";
const TRAINING_SUFFIX: &str = "_training.json";

/// Replace spaces so a configuration name is usable as a file prefix.
pub fn sanitize_name(name: &str) -> String {
    name.replace(' ', "_")
}

/// Locations of the two artifacts for one configuration name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub settings: PathBuf,
    pub training: PathBuf,
}

/// Where a model is on disk, as seen at the start of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelState {
    /// No settings blob. Learn from scratch, seeded if a training blob exists.
    Cold { seed: Option<TrainingPairs> },
    /// Settings exist and no update was requested.
    Warm { settings: Vec<u8> },
    /// Settings exist but the caller asked to keep labeling.
    Update { seed: Option<TrainingPairs> },
}

impl ModelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelState::Cold { .. } => "cold",
            ModelState::Warm { .. } => "warm",
            ModelState::Update { .. } => "update",
        }
    }
}

/// Settings and training artifacts keyed by a configuration name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    dir: PathBuf,
    name: String,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, config_name: &str) -> Self {
        Self {
            dir: dir.into(),
            name: sanitize_name(config_name),
        }
    }

    /// Sanitized configuration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            settings: self.dir.join(format!("{}{SETTINGS_SUFFIX}", self.name)),
            training: self.dir.join(format!("{}{TRAINING_SUFFIX}", self.name)),
        }
    }

    pub fn read_settings(&self) -> Result<Option<Vec<u8>>, ModelError> {
        read_optional(&self.paths().settings)
    }

    pub fn read_training(&self) -> Result<Option<TrainingPairs>, ModelError> {
        let path = self.paths().training;
        let Some(bytes) = read_optional(&path)? else {
            return Ok(None);
        };
        TrainingPairs::from_json(&bytes)
            .map(Some)
            .map_err(|e| ModelError::CorruptTraining {
                path,
                reason: e.to_string(),
            })
    }

    /// Inspect the artifacts and decide how this run gets its model.
    pub fn state(&self, update: bool) -> Result<ModelState, ModelError> {
        match (self.read_settings()?, update) {
            (None, _) => Ok(ModelState::Cold {
                seed: self.read_training()?,
            }),
            (Some(settings), false) => Ok(ModelState::Warm { settings }),
            (Some(_), true) => {
                let seed = self.read_training()?;
                if seed.is_none() {
                    warn!(
                        config = %self.name,
                        "update requested but no training file exists; labeling starts unseeded"
                    );
                }
                Ok(ModelState::Update { seed })
            }
        }
    }

    /// Persist a finished session: the training blob first, then the
    /// settings it produced. Each file is replaced atomically.
    pub fn write(&self, training: &TrainingPairs, settings: &[u8]) -> Result<(), ModelError> {
        let paths = self.paths();
        let json = training.to_json_pretty()?;
        write_atomic(&paths.training, json.as_bytes())?;
        write_atomic(&paths.settings, settings)?;
        Ok(())
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, ModelError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ModelError::io(path, e)),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), ModelError> {
    AtomicFile::new(path, OverwriteBehavior::AllowOverwrite)
        .write(|f| f.write_all(bytes))
        .map_err(|e| {
            let source = match e {
                atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => e,
            };
            ModelError::io(path, source)
        })
}
