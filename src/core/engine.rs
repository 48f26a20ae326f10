/// The idea pipeline: corpus → trained model pair → title/pitch output.
///
/// Owns one Markov model for titles and one for elevator pitches, built via
/// `PitchEngine::builder()` with an explicit train-or-restore initialization
/// phase, so every generation request runs against fully trained models.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use thiserror::Error;

use crate::core::markov::{load_model, save_model, MarkovError, MarkovModel};
use crate::corpus::{self, CorpusError};
use crate::schema::project::ProjectRecord;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("markov error: {0}")]
    Markov(#[from] MarkovError),
    #[error("corpus error: {0}")]
    Corpus(#[from] CorpusError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no training data: provide records, trained models, or a snapshot directory")]
    NoTrainingData,
}

/// Neutral sampling temperature, applied when a caller gives no override.
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

/// Snapshot file names inside a snapshot directory.
pub const TITLE_SNAPSHOT: &str = "title.ron";
pub const PITCH_SNAPSHOT: &str = "pitch.ron";

/// A generated title/description pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Idea {
    pub title: String,
    pub description: String,
}

/// Order and step cap for one model slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    pub order: usize,
    pub max_length: usize,
}

impl ModelConfig {
    /// Default title model: short window, short output.
    pub const TITLE: ModelConfig = ModelConfig {
        order: 4,
        max_length: 40,
    };
    /// Default pitch model: longer window, paragraph-sized output.
    pub const PITCH: ModelConfig = ModelConfig {
        order: 5,
        max_length: 1000,
    };
}

/// The top-level generator. Built via `PitchEngine::builder()`.
pub struct PitchEngine {
    title_model: MarkovModel,
    pitch_model: MarkovModel,
    rng: StdRng,
}

/// Builder for constructing a `PitchEngine`.
pub struct PitchEngineBuilder {
    title_config: ModelConfig,
    pitch_config: ModelConfig,
    seed: u64,
    records: Vec<ProjectRecord>,
    snapshot_dir: Option<PathBuf>,
    /// Directly provided models (for testing without files).
    title_model: Option<MarkovModel>,
    pitch_model: Option<MarkovModel>,
}

impl PitchEngine {
    pub fn builder() -> PitchEngineBuilder {
        PitchEngineBuilder {
            title_config: ModelConfig::TITLE,
            pitch_config: ModelConfig::PITCH,
            seed: 0,
            records: Vec::new(),
            snapshot_dir: None,
            title_model: None,
            pitch_model: None,
        }
    }

    /// Generates one title/description pair.
    ///
    /// One call per user-triggered event; pass `DEFAULT_TEMPERATURE` when
    /// the caller supplied no temperature.
    pub fn idea(&mut self, temperature: f64) -> Result<Idea, EngineError> {
        let title = self.title_model.generate(&mut self.rng, temperature)?;
        let description = self.pitch_model.generate(&mut self.rng, temperature)?;
        Ok(Idea { title, description })
    }

    pub fn title_model(&self) -> &MarkovModel {
        &self.title_model
    }

    pub fn pitch_model(&self) -> &MarkovModel {
        &self.pitch_model
    }
}

impl PitchEngineBuilder {
    /// RNG seed for reproducible generation.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn title_config(mut self, config: ModelConfig) -> Self {
        self.title_config = config;
        self
    }

    pub fn pitch_config(mut self, config: ModelConfig) -> Self {
        self.pitch_config = config;
        self
    }

    /// Corpus records to train on when no snapshots or models are given.
    pub fn records(mut self, records: Vec<ProjectRecord>) -> Self {
        self.records = records;
        self
    }

    /// Directory for the train-or-restore branch: when both snapshot files
    /// exist the models are restored from them, otherwise freshly trained
    /// models are saved there.
    pub fn snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = Some(dir.into());
        self
    }

    /// Injects an already-trained title model, bypassing training for it.
    pub fn with_title_model(mut self, model: MarkovModel) -> Self {
        self.title_model = Some(model);
        self
    }

    /// Injects an already-trained pitch model, bypassing training for it.
    pub fn with_pitch_model(mut self, model: MarkovModel) -> Self {
        self.pitch_model = Some(model);
        self
    }

    pub fn build(mut self) -> Result<PitchEngine, EngineError> {
        let rng = StdRng::seed_from_u64(self.seed);

        if self.title_model.is_none() && self.pitch_model.is_none() {
            if let Some((title, pitch)) = self.try_restore()? {
                self.title_model = Some(title);
                self.pitch_model = Some(pitch);
            }
        }

        let mut trained = false;
        let (title_model, pitch_model) = match (self.title_model.take(), self.pitch_model.take())
        {
            (Some(title), Some(pitch)) => (title, pitch),
            (title, pitch) => {
                if self.records.is_empty() {
                    return Err(EngineError::NoTrainingData);
                }
                let mut stats = corpus::IngestStats::default();
                // Only the slots without an injected model get a training
                // pass over the records.
                let title_model = match title {
                    Some(model) => model,
                    None => {
                        let mut fresh = MarkovModel::new(
                            self.title_config.order,
                            self.title_config.max_length,
                        )?;
                        let title_stats = corpus::ingest_titles(&self.records, &mut fresh);
                        stats.titles = title_stats.titles;
                        stats.skipped += title_stats.skipped;
                        fresh
                    }
                };
                let pitch_model = match pitch {
                    Some(model) => model,
                    None => {
                        let mut fresh = MarkovModel::new(
                            self.pitch_config.order,
                            self.pitch_config.max_length,
                        )?;
                        let pitch_stats = corpus::ingest_pitches(&self.records, &mut fresh);
                        stats.pitches = pitch_stats.pitches;
                        stats.skipped += pitch_stats.skipped;
                        fresh
                    }
                };
                log::info!(
                    "trained on {} records: {} titles, {} pitches, {} skipped",
                    self.records.len(),
                    stats.titles,
                    stats.pitches,
                    stats.skipped
                );
                trained = true;
                (title_model, pitch_model)
            }
        };

        if !title_model.is_trained() || !pitch_model.is_trained() {
            return Err(EngineError::NoTrainingData);
        }

        // Training always rewrites both snapshot files, so a stale or
        // partial directory cannot survive a rebuild.
        if trained {
            if let Some(dir) = &self.snapshot_dir {
                std::fs::create_dir_all(dir)?;
                save_model(&title_model, &dir.join(TITLE_SNAPSHOT))?;
                save_model(&pitch_model, &dir.join(PITCH_SNAPSHOT))?;
            }
        }

        Ok(PitchEngine {
            title_model,
            pitch_model,
            rng,
        })
    }

    fn try_restore(&self) -> Result<Option<(MarkovModel, MarkovModel)>, EngineError> {
        let dir = match &self.snapshot_dir {
            Some(dir) => dir,
            None => return Ok(None),
        };
        let title_path = dir.join(TITLE_SNAPSHOT);
        let pitch_path = dir.join(PITCH_SNAPSHOT);
        if !title_path.is_file() || !pitch_path.is_file() {
            return Ok(None);
        }
        log::info!("restoring model snapshots from {}", dir.display());
        Ok(Some((load_model(&title_path)?, load_model(&pitch_path)?)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_records() -> Vec<ProjectRecord> {
        vec![
            ProjectRecord {
                project_name: Some("Echo Garden".to_string()),
                elevator_pitch: Some(
                    "A sound installation that replays whispered words as plants.".to_string(),
                ),
            },
            ProjectRecord {
                project_name: Some("Echo Chamber".to_string()),
                elevator_pitch: Some(
                    "A room that argues back using everything you said before.".to_string(),
                ),
            },
            ProjectRecord {
                project_name: Some("Paper Signals".to_string()),
                elevator_pitch: Some(
                    "A paper craft kit that folds network traffic into origami.".to_string(),
                ),
            },
        ]
    }

    #[test]
    fn build_without_any_source_fails() {
        assert!(matches!(
            PitchEngine::builder().build(),
            Err(EngineError::NoTrainingData)
        ));
    }

    #[test]
    fn build_trains_from_records_and_generates() {
        let mut engine = PitchEngine::builder()
            .seed(42)
            .records(sample_records())
            .build()
            .unwrap();

        let idea = engine.idea(DEFAULT_TEMPERATURE).unwrap();
        assert!(idea.title.chars().count() >= engine.title_model().order());
        assert!(idea.description.chars().count() >= engine.pitch_model().order());
    }

    #[test]
    fn same_seed_same_idea() {
        let build = || {
            PitchEngine::builder()
                .seed(7)
                .records(sample_records())
                .build()
                .unwrap()
        };
        let idea1 = build().idea(DEFAULT_TEMPERATURE).unwrap();
        let idea2 = build().idea(DEFAULT_TEMPERATURE).unwrap();
        assert_eq!(idea1, idea2);
    }

    #[test]
    fn injected_models_bypass_training() {
        let mut title = MarkovModel::new(2, 10).unwrap();
        title.feed("abcd").unwrap();
        let mut pitch = MarkovModel::new(2, 10).unwrap();
        pitch.feed("wxyz").unwrap();

        let mut engine = PitchEngine::builder()
            .seed(1)
            .with_title_model(title)
            .with_pitch_model(pitch)
            .build()
            .unwrap();

        let idea = engine.idea(DEFAULT_TEMPERATURE).unwrap();
        assert!(idea.title.starts_with("ab"));
        assert!(idea.description.starts_with("wx"));
    }

    #[test]
    fn build_rejects_untrained_injected_model() {
        let title = MarkovModel::new(2, 10).unwrap();
        let pitch = MarkovModel::new(2, 10).unwrap();
        assert!(matches!(
            PitchEngine::builder()
                .with_title_model(title)
                .with_pitch_model(pitch)
                .build(),
            Err(EngineError::NoTrainingData)
        ));
    }

    #[test]
    fn custom_configs_apply_to_trained_models() {
        let engine = PitchEngine::builder()
            .records(sample_records())
            .title_config(ModelConfig {
                order: 3,
                max_length: 12,
            })
            .pitch_config(ModelConfig {
                order: 4,
                max_length: 50,
            })
            .build()
            .unwrap();

        assert_eq!(engine.title_model().order(), 3);
        assert_eq!(engine.title_model().max_length(), 12);
        assert_eq!(engine.pitch_model().order(), 4);
        assert_eq!(engine.pitch_model().max_length(), 50);
    }

    #[test]
    fn invalid_temperature_surfaces_from_the_models() {
        let mut engine = PitchEngine::builder()
            .records(sample_records())
            .build()
            .unwrap();
        assert!(matches!(
            engine.idea(0.0),
            Err(EngineError::Markov(MarkovError::Sample(_)))
        ));
    }
}
