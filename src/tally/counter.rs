// src/tally/counter.rs
// =============================================================================
// A thread-safe letter -> count map.
//
// How it works:
// 1. Every letter (Unicode general category L*) is lowercased
// 2. Its counter is bumped inside a DashMap entry
// 3. At the end the map is snapshotted and sorted by count
//
// DashMap splits its keys across shards, each behind its own lock, so two
// tasks bumping different letters rarely touch the same lock and no single
// global lock serializes the whole tally.
// =============================================================================

use std::sync::LazyLock;

use dashmap::DashMap;
use regex::Regex;
use serde::Serialize;
use tracing::info;

/// One letter: upper, lower, title case, modifier or other letter.
///
/// Letter-numbers such as 'Ⅻ' and combining vowel signs are alphabetic in
/// Unicode terms but are not letters, so `char::is_alphabetic` is too broad.
static LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}").expect("Invalid letter regex"));

/// One line of the final report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LetterRank {
    /// 1-based position, most frequent first
    pub rank: usize,
    pub letter: char,
    pub count: u64,
}

#[derive(Debug, Default)]
pub struct LetterTally {
    counts: DashMap<char, u64>,
}

impl LetterTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one to the counter of every letter in `text`, case-folded.
    ///
    /// Digits, punctuation and whitespace are ignored. Safe to call from many
    /// tasks at once.
    pub fn count_letters(&self, text: &str) {
        // Each match of \p{L} is exactly one char
        let letters = LETTER
            .find_iter(text)
            .filter_map(|m| m.as_str().chars().next())
            .map(fold_case);

        for letter in letters {
            *self.counts.entry(letter).or_insert(0) += 1;
        }
    }

    /// Current count for `letter` (0 if never seen).
    #[cfg(test)]
    pub fn get(&self, letter: char) -> u64 {
        self.counts.get(&letter).map_or(0, |count| *count)
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|entry| *entry.value()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Snapshot sorted by count descending, ties by letter ascending.
    pub fn ranked(&self) -> Vec<LetterRank> {
        let mut pairs: Vec<(char, u64)> = self
            .counts
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();

        pairs.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        pairs
            .into_iter()
            .enumerate()
            .map(|(i, (letter, count))| LetterRank {
                rank: i + 1,
                letter,
                count,
            })
            .collect()
    }

    /// Prints the ranked report, one "Rank N: x - count" line per letter.
    pub fn display_results(&self) {
        info!("Letter frequencies in JavaScript/TypeScript files:");
        for line in self.ranked() {
            println!("Rank {}: {} - {}", line.rank, line.letter, line.count);
        }
    }
}

// Some letters lowercase to more than one char (e.g. 'İ'); only the first is
// kept so each input letter bumps exactly one counter.
fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}
