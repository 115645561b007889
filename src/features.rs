// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Per-sequence feature extraction
//!
//! Pure counting and run-length statistics over a single sequence. These
//! back the nine feature ids the basic range filter can bound.

use crate::symbol::{Sequence, Symbol, SymbolSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Occurrences of `symbol` in `sequence`
pub fn count(sequence: &Sequence, symbol: Symbol) -> u32 {
    sequence.symbols().iter().filter(|s| **s == symbol).count() as u32
}

/// Longest contiguous run of exactly `symbol` (0 if absent)
pub fn max_run(sequence: &Sequence, symbol: Symbol) -> u32 {
    max_mixed_run(sequence, SymbolSet::only(symbol))
}

/// Longest contiguous run whose symbols all belong to `allowed`
///
/// With a two-symbol subset the run may alternate freely between both
/// symbols but is broken by the third.
pub fn max_mixed_run(sequence: &Sequence, allowed: SymbolSet) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    for symbol in sequence.symbols() {
        if allowed.contains(*symbol) {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Feature ids a range condition can bound
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum FeatureId {
    WinCount = 0,
    DrawCount = 1,
    LossCount = 2,
    WinStreak = 3,
    DrawStreak = 4,
    LossStreak = 5,
    WinOrDrawStreak = 6,
    WinOrLossStreak = 7,
    DrawOrLossStreak = 8,
}

impl FeatureId {
    /// All ids, in feature-vector order
    pub const ALL: [FeatureId; 9] = [
        FeatureId::WinCount,
        FeatureId::DrawCount,
        FeatureId::LossCount,
        FeatureId::WinStreak,
        FeatureId::DrawStreak,
        FeatureId::LossStreak,
        FeatureId::WinOrDrawStreak,
        FeatureId::WinOrLossStreak,
        FeatureId::DrawOrLossStreak,
    ];

    /// Parse the upper-snake-case name, case-insensitively
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase().replace('-', "_");
        FeatureId::ALL.iter().copied().find(|id| id.name() == upper)
    }

    /// Upper-snake-case name, e.g. `WIN_OR_DRAW_STREAK`
    pub fn name(self) -> &'static str {
        match self {
            FeatureId::WinCount => "WIN_COUNT",
            FeatureId::DrawCount => "DRAW_COUNT",
            FeatureId::LossCount => "LOSS_COUNT",
            FeatureId::WinStreak => "WIN_STREAK",
            FeatureId::DrawStreak => "DRAW_STREAK",
            FeatureId::LossStreak => "LOSS_STREAK",
            FeatureId::WinOrDrawStreak => "WIN_OR_DRAW_STREAK",
            FeatureId::WinOrLossStreak => "WIN_OR_LOSS_STREAK",
            FeatureId::DrawOrLossStreak => "DRAW_OR_LOSS_STREAK",
        }
    }

    /// Compute this single feature for `sequence`
    pub fn evaluate(self, sequence: &Sequence) -> u32 {
        match self {
            FeatureId::WinCount => count(sequence, Symbol::Win),
            FeatureId::DrawCount => count(sequence, Symbol::Draw),
            FeatureId::LossCount => count(sequence, Symbol::Loss),
            FeatureId::WinStreak => max_run(sequence, Symbol::Win),
            FeatureId::DrawStreak => max_run(sequence, Symbol::Draw),
            FeatureId::LossStreak => max_run(sequence, Symbol::Loss),
            FeatureId::WinOrDrawStreak => max_mixed_run(sequence, SymbolSet::FAVORABLE),
            FeatureId::WinOrLossStreak => {
                max_mixed_run(sequence, SymbolSet::of(&[Symbol::Win, Symbol::Loss]))
            }
            FeatureId::DrawOrLossStreak => {
                max_mixed_run(sequence, SymbolSet::of(&[Symbol::Draw, Symbol::Loss]))
            }
        }
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// All nine features of one sequence, computed once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureVector([u32; 9]);

impl FeatureVector {
    pub fn extract(sequence: &Sequence) -> Self {
        let mut values = [0; 9];
        for id in FeatureId::ALL {
            values[id as usize] = id.evaluate(sequence);
        }
        Self(values)
    }

    #[inline(always)]
    pub fn get(&self, id: FeatureId) -> u32 {
        self.0[id as usize]
    }
}
