/// Character-level Markov model — training, snapshots, and generation.
pub mod markov;

/// Temperature-weighted random selection over discrete distributions.
pub mod sampler;

/// The composing layer: a title/pitch model pair with bootstrapping.
pub mod engine;
