// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Frequency statistics over a dataset snapshot.

use crate::symbol::{Sequence, SequenceSet, Symbol, SEQUENCE_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distinct length-3 substrings.
pub const TRIGRAM_COUNT: usize = 27;

/// Number of overlapping trigrams in one sequence.
pub const TRIGRAMS_PER_SEQUENCE: usize = SEQUENCE_LEN - 2;

/// A contiguous length-3 substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Trigram(pub [Symbol; 3]);

impl Trigram {
    /// Trigram starting at `position` (0..12).
    pub fn at(sequence: &Sequence, position: usize) -> Self {
        let s = sequence.symbols();
        Trigram([s[position], s[position + 1], s[position + 2]])
    }

    /// Dense index in `0..27`; follows text order.
    #[inline]
    pub fn index(self) -> usize {
        self.0[0].index() * 9 + self.0[1].index() * 3 + self.0[2].index()
    }

    pub fn from_index(index: usize) -> Self {
        Trigram([
            Symbol::ALL[(index / 9) % 3],
            Symbol::ALL[(index / 3) % 3],
            Symbol::ALL[index % 3],
        ])
    }
}

impl fmt::Display for Trigram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for symbol in &self.0 {
            write!(f, "{}", symbol.to_char())?;
        }
        Ok(())
    }
}

/// Position and trigram frequencies of one dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyStats {
    /// Number of sequences the statistics were computed over.
    pub sample_count: u64,
    /// Per position, how many sequences hold WIN or DRAW there.
    pub position_favorable: [u64; SEQUENCE_LEN],
    /// Occurrences of each trigram, indexed by [`Trigram::index`].
    pub trigram_counts: [u64; TRIGRAM_COUNT],
}

impl Default for FrequencyStats {
    fn default() -> Self {
        Self {
            sample_count: 0,
            position_favorable: [0; SEQUENCE_LEN],
            trigram_counts: [0; TRIGRAM_COUNT],
        }
    }
}

impl FrequencyStats {
    pub fn compute(data: &SequenceSet) -> Self {
        let mut stats = Self::default();
        for sequence in data {
            stats.add(sequence);
        }
        stats
    }

    fn add(&mut self, sequence: &Sequence) {
        self.sample_count += 1;
        for (pos, symbol) in sequence.symbols().iter().enumerate() {
            if symbol.is_favorable() {
                self.position_favorable[pos] += 1;
            }
        }
        for pos in 0..TRIGRAMS_PER_SEQUENCE {
            self.trigram_counts[Trigram::at(sequence, pos).index()] += 1;
        }
    }

    pub fn trigram_count(&self, trigram: Trigram) -> u64 {
        self.trigram_counts[trigram.index()]
    }

    /// Favourable fraction at `position`; 0 for an empty dataset.
    pub fn position_ratio(&self, position: usize) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        self.position_favorable[position] as f64 / self.sample_count as f64
    }

    /// The `n` most frequent trigrams seen at least once, most frequent first.
    pub fn top_trigrams(&self, n: usize) -> Vec<(Trigram, u64)> {
        let mut seen: Vec<(Trigram, u64)> = (0..TRIGRAM_COUNT)
            .filter(|&i| self.trigram_counts[i] > 0)
            .map(|i| (Trigram::from_index(i), self.trigram_counts[i]))
            .collect();
        seen.sort_by(|a, b| b.1.cmp(&a.1));
        seen.truncate(n);
        seen
    }

    /// Trigram frequency plus favourable frequency of the favourable positions.
    pub fn score(&self, sequence: &Sequence) -> u64 {
        let trigram_part: u64 = (0..TRIGRAMS_PER_SEQUENCE)
            .map(|pos| self.trigram_count(Trigram::at(sequence, pos)))
            .sum();
        let position_part: u64 = sequence
            .symbols()
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_favorable())
            .map(|(pos, _)| self.position_favorable[pos])
            .sum();
        trigram_part + position_part
    }
}
