//! Per-workflow tuning knobs.

use std::path::{Path, PathBuf};

use matcher::ThresholdPolicy;
use model::{ArtifactStore, ModelLifecycle};
use normalize::NormalizeConfig;

fn lifecycle(
    artifact_dir: &Path,
    config_name: &str,
    update: bool,
    sample_fraction: f64,
    num_cores: usize,
) -> ModelLifecycle {
    ModelLifecycle::new(ArtifactStore::new(artifact_dir, config_name))
        .with_update(update)
        .with_sample_fraction(sample_fraction)
        .with_num_cores(num_cores)
}

/// Options for [`crate::dedupe_table`] and [`crate::left_join_tables`].
#[derive(Debug, Clone, PartialEq)]
pub struct DedupeOptions {
    /// Directory holding `<name>_learned_settings` and `<name>_training.json`.
    pub artifact_dir: PathBuf,
    /// How much more recall counts than precision when the engine picks
    /// the cutoff.
    pub recall_weight: f64,
    /// Fixed cutoff. Overrides `recall_weight` when set.
    pub threshold: Option<f64>,
    pub sample_fraction: f64,
    /// Engine threads; 0 lets the engine decide.
    pub num_cores: usize,
    /// Retrain from the saved training file even if settings exist.
    pub update: bool,
    pub normalize: NormalizeConfig,
}

impl DedupeOptions {
    pub fn policy(&self) -> ThresholdPolicy {
        match self.threshold {
            Some(t) => ThresholdPolicy::Fixed(t),
            None => ThresholdPolicy::RecallWeighted(self.recall_weight),
        }
    }

    pub(crate) fn lifecycle(&self, config_name: &str) -> ModelLifecycle {
        lifecycle(
            &self.artifact_dir,
            config_name,
            self.update,
            self.sample_fraction,
            self.num_cores,
        )
    }
}

impl Default for DedupeOptions {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("."),
            recall_weight: 1.0,
            threshold: None,
            sample_fraction: 0.3,
            num_cores: 0,
            update: false,
            normalize: NormalizeConfig::default(),
        }
    }
}

/// Options for [`crate::link_tables`].
#[derive(Debug, Clone, PartialEq)]
pub struct LinkOptions {
    pub artifact_dir: PathBuf,
    /// Fixed cutoff; 0 keeps every pairing the engine proposes.
    pub threshold: f64,
    pub sample_fraction: f64,
    pub num_cores: usize,
    pub update: bool,
    pub normalize: NormalizeConfig,
}

impl LinkOptions {
    pub(crate) fn lifecycle(&self, config_name: &str) -> ModelLifecycle {
        lifecycle(
            &self.artifact_dir,
            config_name,
            self.update,
            self.sample_fraction,
            self.num_cores,
        )
    }
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("."),
            threshold: 0.0,
            sample_fraction: 0.3,
            num_cores: 0,
            update: false,
            normalize: NormalizeConfig::default(),
        }
    }
}

/// Options for [`crate::gazetteer_match`].
#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerOptions {
    pub artifact_dir: PathBuf,
    /// Candidates scoring below this are never returned.
    pub threshold: f64,
    /// Fraction of the messy table's length requested as training pairs.
    pub sample_fraction: f64,
    pub num_cores: usize,
    pub update: bool,
    pub normalize: NormalizeConfig,
}

impl GazetteerOptions {
    pub(crate) fn lifecycle(&self, config_name: &str) -> ModelLifecycle {
        lifecycle(
            &self.artifact_dir,
            config_name,
            self.update,
            self.sample_fraction,
            self.num_cores,
        )
    }
}

impl Default for GazetteerOptions {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("."),
            threshold: 0.3,
            sample_fraction: 1.0,
            num_cores: 0,
            update: false,
            normalize: NormalizeConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_each_mode() {
        let d = DedupeOptions::default();
        assert_eq!(d.policy(), ThresholdPolicy::RecallWeighted(1.0));
        assert_eq!(d.sample_fraction, 0.3);

        let fixed = DedupeOptions {
            threshold: Some(0.7),
            ..DedupeOptions::default()
        };
        assert_eq!(fixed.policy(), ThresholdPolicy::Fixed(0.7));

        assert_eq!(LinkOptions::default().threshold, 0.0);
        let g = GazetteerOptions::default();
        assert_eq!(g.threshold, 0.3);
        assert_eq!(g.sample_fraction, 1.0);
    }

    #[test]
    fn lifecycle_uses_sanitized_name() {
        let opts = DedupeOptions {
            artifact_dir: PathBuf::from("/tmp/models"),
            ..DedupeOptions::default()
        };
        let lc = opts.lifecycle("my run");
        assert_eq!(lc.store().name(), "my_run");
        assert_eq!(
            lc.store().paths().settings,
            PathBuf::from("/tmp/models/my_run_learned_settings")
        );
    }
}
