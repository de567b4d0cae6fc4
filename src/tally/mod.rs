// src/tally/mod.rs
// =============================================================================
// This module counts letters.
//
// Many file downloads finish at the same time, and every one of them feeds its
// text into the same tally. The tally therefore has to accept increments from
// many tasks at once without losing any.
//
// Rust concepts:
// - Shared state across tasks: &self methods on a concurrent map
// - Iterators: Filtering and mapping characters
// =============================================================================

mod counter;

pub use counter::{LetterRank, LetterTally};
