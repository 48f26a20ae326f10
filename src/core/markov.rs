/// Character-level Markov model — training, serialization, and generation.

use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::sampler::{self, SampleError};

#[derive(Debug, Error)]
pub enum MarkovError {
    #[error("model order must be at least 1, got {0}")]
    InvalidOrder(usize),
    #[error("training input too short: {len} chars for a model of order {order}")]
    InputTooShort { len: usize, order: usize },
    #[error("model has no starting ngrams (nothing has been fed)")]
    Untrained,
    #[error(transparent)]
    Sample(#[from] SampleError),
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encoding error: {0}")]
    SnapshotEncode(#[from] ron::Error),
    #[error("snapshot parse error: {0}")]
    SnapshotParse(#[from] ron::error::SpannedError),
}

/// A trained character-level Markov model of fixed order.
///
/// Every ngram key is a string of exactly `order` chars. For each key the
/// model stores an insertion-ordered list of `(next_char, probability)`
/// pairs; the probabilities for a key sum to 1 between `feed` calls. Raw
/// occurrence counts live in a side table that is not serialized —
/// snapshots carry only the normalized probabilities, which is all that
/// generation needs.
///
/// Training (`feed`, `train`) mutates the model and needs exclusive access;
/// generation only reads, so a trained model can serve concurrent callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkovModel {
    /// Number of characters in each ngram key.
    order: usize,
    /// Upper bound on generation steps after the seed.
    max_length: usize,
    /// Ngram → ordered `(next_char, probability)` pairs.
    transitions: FxHashMap<String, Vec<(char, f64)>>,
    /// One seed per fed string, duplicates included: picking uniformly over
    /// this list weights seeds by corpus frequency.
    starting_ngrams: Vec<String>,
    /// Ngram → ordered `(next_char, occurrences)` pairs. Rebuilt from
    /// scratch on every training pass, never persisted.
    #[serde(skip)]
    counts: FxHashMap<String, Vec<(char, u64)>>,
}

impl MarkovModel {
    /// Creates an untrained model.
    ///
    /// # Errors
    /// Rejects `order == 0`; a zero-length window can never key a lookup.
    pub fn new(order: usize, max_length: usize) -> Result<Self, MarkovError> {
        if order == 0 {
            return Err(MarkovError::InvalidOrder(order));
        }
        Ok(Self {
            order,
            max_length,
            transitions: FxHashMap::default(),
            starting_ngrams: Vec::new(),
            counts: FxHashMap::default(),
        })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn transitions(&self) -> &FxHashMap<String, Vec<(char, f64)>> {
        &self.transitions
    }

    pub fn starting_ngrams(&self) -> &[String] {
        &self.starting_ngrams
    }

    /// True once at least one string has been fed (or restored).
    pub fn is_trained(&self) -> bool {
        !self.starting_ngrams.is_empty()
    }

    /// Trains on one input string.
    ///
    /// Records the first `order` chars as a starting ngram, counts every
    /// `(ngram, next_char)` pair in the text, then renormalizes the touched
    /// ngrams so their probabilities sum to 1 again.
    ///
    /// # Errors
    /// `InputTooShort` when the text has fewer than `order` chars; the
    /// model is left untouched and later feeds proceed normally.
    pub fn feed(&mut self, text: &str) -> Result<(), MarkovError> {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() < self.order {
            return Err(MarkovError::InputTooShort {
                len: chars.len(),
                order: self.order,
            });
        }

        self.starting_ngrams.push(chars[..self.order].iter().collect());

        let mut touched: FxHashSet<String> = FxHashSet::default();
        for i in 0..chars.len() - self.order {
            let gram: String = chars[i..i + self.order].iter().collect();
            let next = chars[i + self.order];

            let entries = self.counts.entry(gram.clone()).or_default();
            if let Some(entry) = entries.iter_mut().find(|(ch, _)| *ch == next) {
                entry.1 += 1;
            } else {
                entries.push((next, 1));
            }
            touched.insert(gram);
        }

        // Probabilities are recomputed from full counts, so only the grams
        // this feed touched can change; the rest already hold the same
        // values a whole-table renormalization would produce.
        for gram in touched {
            let entries = &self.counts[&gram];
            let total: u64 = entries.iter().map(|(_, count)| count).sum();
            let probs = entries
                .iter()
                .map(|&(ch, count)| (ch, count as f64 / total as f64))
                .collect();
            self.transitions.insert(gram, probs);
        }

        Ok(())
    }

    /// Feeds every line of a corpus, skipping lines shorter than the order.
    ///
    /// Returns how many lines were actually ingested.
    pub fn train<I, S>(&mut self, lines: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut fed = 0;
        for line in lines {
            match self.feed(line.as_ref()) {
                Ok(()) => fed += 1,
                Err(e) => log::debug!("skipping corpus line: {}", e),
            }
        }
        fed
    }

    /// Picks a starting ngram uniformly over recorded occurrences.
    ///
    /// Returns `None` on an untrained model.
    pub fn random_starting_ngram(&self, rng: &mut StdRng) -> Option<&str> {
        if self.starting_ngrams.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.starting_ngrams.len());
        Some(&self.starting_ngrams[index])
    }

    /// Samples a new string from the trained model.
    ///
    /// Starts from a random starting ngram, then repeatedly draws the next
    /// character by temperature-weighted sampling and slides the window,
    /// stopping after `max_length` steps or at the first window the model
    /// has never seen. The output is therefore between `order` and
    /// `order + max_length` chars long.
    ///
    /// # Errors
    /// `Untrained` when nothing has been fed; `InvalidTemperature` when
    /// `temperature <= 0` (checked before any sampling).
    pub fn generate(&self, rng: &mut StdRng, temperature: f64) -> Result<String, MarkovError> {
        if temperature <= 0.0 {
            return Err(SampleError::InvalidTemperature(temperature).into());
        }
        let seed = self
            .random_starting_ngram(rng)
            .ok_or(MarkovError::Untrained)?
            .to_owned();
        self.generate_from(&seed, rng, temperature)
    }

    /// Samples with a caller-chosen seed window instead of a random one.
    pub fn generate_from(
        &self,
        seed: &str,
        rng: &mut StdRng,
        temperature: f64,
    ) -> Result<String, MarkovError> {
        if temperature <= 0.0 {
            return Err(SampleError::InvalidTemperature(temperature).into());
        }

        let mut output: Vec<char> = seed.chars().collect();
        let mut window: String = output.iter().collect();

        for _ in 0..self.max_length {
            let dist = match self.transitions.get(&window) {
                Some(dist) => dist,
                // An unseen window is the natural end of the text.
                None => break,
            };
            let next = *sampler::weighted_choice(dist, temperature, rng)?;
            output.push(next);
            window = output[output.len() - self.order..].iter().collect();
        }

        Ok(output.into_iter().collect())
    }

    /// Serializes the model's full state to RON text.
    pub fn dump(&self) -> Result<String, MarkovError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    /// Rebuilds a model from a `dump` snapshot.
    ///
    /// The restored model generates identically to the original. Raw counts
    /// are not part of the snapshot, so a feed after restore recomputes the
    /// touched ngrams from post-restore counts only; restore exists to skip
    /// retraining, not to resume it.
    ///
    /// # Errors
    /// Fails on unparseable input, a zero order, or any ngram whose length
    /// disagrees with the order, without partial effect.
    pub fn restore(snapshot: &str) -> Result<Self, MarkovError> {
        let model: Self = ron::from_str(snapshot)?;
        model.validate_snapshot()?;
        Ok(model)
    }

    fn validate_snapshot(&self) -> Result<(), MarkovError> {
        if self.order == 0 {
            return Err(MarkovError::InvalidSnapshot(
                "order must be at least 1".to_string(),
            ));
        }
        for gram in self.transitions.keys().chain(self.starting_ngrams.iter()) {
            if gram.chars().count() != self.order {
                return Err(MarkovError::InvalidSnapshot(format!(
                    "ngram {:?} does not match order {}",
                    gram, self.order
                )));
            }
        }
        Ok(())
    }
}

/// Save a model snapshot to a RON file.
pub fn save_model(model: &MarkovModel, path: &std::path::Path) -> Result<(), MarkovError> {
    std::fs::write(path, model.dump()?)?;
    log::info!("saved model snapshot to {}", path.display());
    Ok(())
}

/// Load a model snapshot from a RON file.
pub fn load_model(path: &std::path::Path) -> Result<MarkovModel, MarkovError> {
    let contents = std::fs::read_to_string(path)?;
    let model = MarkovModel::restore(&contents)?;
    log::info!(
        "restored model snapshot from {} ({} ngrams)",
        path.display(),
        model.transitions.len()
    );
    Ok(model)
}
