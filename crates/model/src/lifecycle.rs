use std::time::Instant;

use engine::{LabelDecision, Labeler, MatchingEngine, TrainingInput, TrainingPairs};
use fields::FieldSpec;
use tracing::{info, Level};

use crate::error::ModelError;
use crate::store::{ArtifactStore, ModelState};

/// How the engine in a [`TrainedModel`] came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOrigin {
    /// Rebuilt from a settings blob; no labeling happened.
    Loaded,
    /// Trained in this run.
    Learned { prompts: usize, labeled: usize },
}

/// Terminal state: an engine ready for thresholding and clustering.
#[derive(Debug)]
pub struct TrainedModel<E> {
    pub engine: E,
    pub origin: ModelOrigin,
}

/// Drives an engine from whatever is on disk to a trained model.
#[derive(Debug, Clone)]
pub struct ModelLifecycle {
    store: ArtifactStore,
    update: bool,
    sample_fraction: f64,
    num_cores: usize,
}

impl ModelLifecycle {
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            update: false,
            sample_fraction: 0.3,
            num_cores: 0,
        }
    }

    pub fn with_update(mut self, update: bool) -> Self {
        self.update = update;
        self
    }

    pub fn with_sample_fraction(mut self, fraction: f64) -> Self {
        self.sample_fraction = fraction;
        self
    }

    /// Threads for the engine; 0 lets the engine pick.
    pub fn with_num_cores(mut self, num_cores: usize) -> Self {
        self.num_cores = num_cores;
        self
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Number of candidate pairs requested for a training session.
    pub fn sample_size(&self, input: &TrainingInput<'_>) -> usize {
        (input.record_count() as f64 * self.sample_fraction).floor() as usize
    }

    /// Load or train a model for `fields`.
    ///
    /// Warm runs never touch `labeler`. Cold and update runs sample from
    /// `input`, label until the labeler finishes or the sample runs dry,
    /// train, then write the training blob followed by the settings blob.
    pub fn resolve<E, L>(
        &self,
        fields: &[FieldSpec],
        input: TrainingInput<'_>,
        labeler: &mut L,
    ) -> Result<TrainedModel<E>, ModelError>
    where
        E: MatchingEngine,
        L: Labeler + ?Sized,
    {
        if !self.sample_fraction.is_finite() || !(0.0..=1.0).contains(&self.sample_fraction) {
            return Err(ModelError::InvalidSampleFraction(self.sample_fraction));
        }

        let start = Instant::now();
        let state = self.store.state(self.update)?;
        let span = tracing::span!(
            Level::INFO,
            "model.resolve",
            config = %self.store.name(),
            state = state.as_str()
        );
        let _guard = span.enter();

        let model = match state {
            ModelState::Warm { settings } => TrainedModel {
                engine: E::from_settings(&settings, self.num_cores)?,
                origin: ModelOrigin::Loaded,
            },
            ModelState::Cold { seed } | ModelState::Update { seed } => {
                self.learn(fields, input, seed, labeler)?
            }
        };

        info!(
            origin = ?model.origin,
            elapsed_micros = start.elapsed().as_micros(),
            "model_ready"
        );
        Ok(model)
    }

    fn learn<E, L>(
        &self,
        fields: &[FieldSpec],
        input: TrainingInput<'_>,
        seed: Option<TrainingPairs>,
        labeler: &mut L,
    ) -> Result<TrainedModel<E>, ModelError>
    where
        E: MatchingEngine,
        L: Labeler + ?Sized,
    {
        let mut engine = E::new(fields, self.num_cores)?;
        engine.prepare_training(input, self.sample_size(&input))?;
        if let Some(seed) = seed {
            info!(seeded_pairs = seed.len(), "reading labeled examples");
            engine.read_training(seed)?;
        }

        let prompts = run_active_learning(&mut engine, labeler)?;
        engine.train()?;

        let settings = engine.write_settings()?;
        self.store.write(engine.training(), &settings)?;

        let labeled = engine.training().len();
        Ok(TrainedModel {
            engine,
            origin: ModelOrigin::Learned { prompts, labeled },
        })
    }
}

/// Present uncertain pairs until the labeler finishes or none remain.
/// Returns the number of prompts shown.
pub fn run_active_learning<E, L>(engine: &mut E, labeler: &mut L) -> Result<usize, ModelError>
where
    E: MatchingEngine,
    L: Labeler + ?Sized,
{
    let mut prompts = 0;
    while let Some(pair) = engine.uncertain_pair() {
        prompts += 1;
        match labeler.label(&pair)? {
            LabelDecision::Finished => break,
            LabelDecision::Unsure => continue,
            decision => {
                if let Some(label) = decision.label() {
                    engine.mark_pair(pair, label);
                }
            }
        }
    }
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine::{ScriptedLabeler, SimilarityEngine};
    use fields::FieldType;
    use table::{Record, RecordId, RecordSet, Value};

    fn fields() -> Vec<FieldSpec> {
        vec![FieldSpec::new("name", FieldType::String)]
    }

    fn records() -> RecordSet {
        let mut set = RecordSet::new();
        for (i, name) in ["acme corp", "acme corp", "acme corporation", "globex", "initech"]
            .into_iter()
            .enumerate()
        {
            let r: Record = [("name", Value::from(name))].into_iter().collect();
            set.insert(RecordId::from(i), r).expect("insert");
        }
        set
    }

    fn lifecycle(dir: &std::path::Path) -> ModelLifecycle {
        ModelLifecycle::new(ArtifactStore::new(dir, "unit test")).with_sample_fraction(1.0)
    }

    #[test]
    fn cold_run_labels_trains_and_persists() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lc = lifecycle(dir.path());
        let records = records();
        let mut labeler = ScriptedLabeler::new([
            LabelDecision::Match,
            LabelDecision::Distinct,
            LabelDecision::Unsure,
            LabelDecision::Finished,
        ]);

        let model: TrainedModel<SimilarityEngine> = lc
            .resolve(&fields(), TrainingInput::Dedupe(&records), &mut labeler)
            .expect("resolve");

        assert_eq!(
            model.origin,
            ModelOrigin::Learned {
                prompts: 4,
                labeled: 2
            }
        );
        let paths = lc.store().paths();
        assert!(paths.settings.exists());
        assert!(paths.training.exists());
        assert!(paths.training.ends_with("unit_test_training.json"));
    }

    #[test]
    fn warm_run_never_prompts() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lc = lifecycle(dir.path());
        let records = records();
        let mut first = ScriptedLabeler::new([LabelDecision::Match, LabelDecision::Distinct]);
        let trained: TrainedModel<SimilarityEngine> = lc
            .resolve(&fields(), TrainingInput::Dedupe(&records), &mut first)
            .expect("train");

        let mut second = ScriptedLabeler::finished();
        let loaded: TrainedModel<SimilarityEngine> = lc
            .resolve(&fields(), TrainingInput::Dedupe(&records), &mut second)
            .expect("load");
        assert_eq!(loaded.origin, ModelOrigin::Loaded);
        assert_eq!(second.prompts(), 0);
        assert_eq!(
            trained.engine.partition(&records, 0.5).expect("a"),
            loaded.engine.partition(&records, 0.5).expect("b")
        );
    }

    #[test]
    fn update_reenters_labeling_with_seed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lc = lifecycle(dir.path());
        let records = records();
        let mut first = ScriptedLabeler::new([LabelDecision::Match, LabelDecision::Distinct]);
        let _: TrainedModel<SimilarityEngine> = lc
            .resolve(&fields(), TrainingInput::Dedupe(&records), &mut first)
            .expect("train");

        let mut more = ScriptedLabeler::new([LabelDecision::Distinct]);
        let updated: TrainedModel<SimilarityEngine> = lc
            .clone()
            .with_update(true)
            .resolve(&fields(), TrainingInput::Dedupe(&records), &mut more)
            .expect("update");
        assert!(matches!(updated.origin, ModelOrigin::Learned { labeled: 3, .. }));
        let saved = lc.store().read_training().expect("read").expect("present");
        assert_eq!(saved.len(), 3);
    }

    #[test]
    fn empty_sample_still_trains() {
        let dir = tempfile::tempdir().expect("tempdir");
        let lc = lifecycle(dir.path()).with_sample_fraction(0.0);
        let records = records();
        let mut labeler = ScriptedLabeler::finished();
        let model: TrainedModel<SimilarityEngine> = lc
            .resolve(&fields(), TrainingInput::Dedupe(&records), &mut labeler)
            .expect("resolve");
        assert_eq!(
            model.origin,
            ModelOrigin::Learned {
                prompts: 0,
                labeled: 0
            }
        );
        assert_eq!(lc.sample_size(&TrainingInput::Dedupe(&records)), 0);
    }

    #[test]
    fn sample_size_floors() {
        let lc = ModelLifecycle::new(ArtifactStore::new(".", "x")).with_sample_fraction(0.3);
        let records = records();
        assert_eq!(lc.sample_size(&TrainingInput::Dedupe(&records)), 1);
        assert_eq!(
            lc.sample_size(&TrainingInput::Link {
                left: &records,
                right: &records
            }),
            3
        );
    }

    #[test]
    fn rejects_bad_sample_fraction() {
        let dir = tempfile::tempdir().expect("tempdir");
        let records = records();
        let result: Result<TrainedModel<SimilarityEngine>, _> = lifecycle(dir.path())
            .with_sample_fraction(1.5)
            .resolve(
                &fields(),
                TrainingInput::Dedupe(&records),
                &mut ScriptedLabeler::finished(),
            );
        assert!(matches!(result, Err(ModelError::InvalidSampleFraction(_))));
    }
}
