//! Pitch Engine — pseudo-random project titles and elevator pitches.
//!
//! Trains character-level n-gram Markov models on a corpus of scraped
//! project records, snapshots the trained tables to disk, and samples new
//! titles and short descriptions from them with a tunable temperature.

pub mod core;
pub mod corpus;
pub mod schema;
