/// Weighted random selection — temperature reshaping and inverse-CDF draws.

use rand::rngs::StdRng;
use rand::Rng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("temperature must be positive, got {0}")]
    InvalidTemperature(f64),
    #[error("cannot sample from an empty distribution")]
    EmptyDistribution,
}

/// Picks one outcome from a discrete probability distribution.
///
/// `choices` is an insertion-ordered sequence of `(outcome, probability)`
/// pairs. Each probability is raised to `1 / temperature` and the results
/// are renormalized before the draw: temperatures above 1 flatten the
/// distribution toward uniform, temperatures below 1 sharpen it toward the
/// most probable outcome.
///
/// The draw itself walks the pairs in order, so ties broken by
/// floating-point rounding resolve the same way on every run with a seeded
/// rng.
pub fn weighted_choice<'a, K>(
    choices: &'a [(K, f64)],
    temperature: f64,
    rng: &mut StdRng,
) -> Result<&'a K, SampleError> {
    if temperature <= 0.0 {
        return Err(SampleError::InvalidTemperature(temperature));
    }
    if choices.is_empty() {
        return Err(SampleError::EmptyDistribution);
    }
    let u = rng.gen::<f64>();
    Ok(choice_at(choices, temperature, u))
}

/// Inverse-CDF walk at a fixed uniform draw `u` in `[0, 1)`.
///
/// Subtracts each outcome's adjusted probability from `u` in insertion
/// order and returns the outcome that takes `u` non-positive. Callers
/// guarantee `choices` is non-empty and `temperature` is positive.
pub(crate) fn choice_at<K>(choices: &[(K, f64)], temperature: f64, u: f64) -> &K {
    let adjusted: Vec<f64> = choices
        .iter()
        .map(|(_, p)| p.powf(1.0 / temperature))
        .collect();
    let total: f64 = adjusted.iter().sum();

    let mut remaining = u;
    for ((outcome, _), weight) in choices.iter().zip(&adjusted) {
        remaining -= weight / total;
        if remaining <= 0.0 {
            return outcome;
        }
    }

    // Rounding can leave a sliver of `u` after the final outcome; the draw
    // still has to land somewhere.
    &choices[choices.len() - 1].0
}
