// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Mystic optimizer.
//!
//! A statistics-driven shrink of a dataset in five stages:
//!
//! 1. compute [`FrequencyStats`] over the input
//! 2. pick the `K` positions most often favourable (the anchors)
//! 3. keep sequences that are favourable at every anchor
//! 4. keep sequences whose weighted loss stays within the tolerance
//! 5. rank by trigram and position frequency and keep the leading fraction
//!
//! Stages 3-5 work on the lexicographically sorted view of the input, which
//! is the reference order for stable tie-breaking.

pub mod stats;

pub use stats::{FrequencyStats, Trigram, TRIGRAM_COUNT};

use crate::config::DEFAULT_POSITION_WEIGHTS;
use crate::error::{Result, UsageError, ValidationError};
use crate::symbol::{Sequence, SequenceSet, Symbol, SEQUENCE_LEN};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Slack on the inclusive tolerance comparison.
const TOLERANCE_EPSILON: f64 = 1e-9;

/// Upper bound of the tolerance parameter.
pub const MAX_TOLERANCE: f64 = 5.0;

/// Weight of a loss at each position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionWeights([f64; SEQUENCE_LEN]);

impl Default for PositionWeights {
    fn default() -> Self {
        Self(DEFAULT_POSITION_WEIGHTS)
    }
}

impl PositionWeights {
    pub fn new(weights: [f64; SEQUENCE_LEN]) -> Self {
        Self(weights)
    }

    pub fn get(&self, position: usize) -> f64 {
        self.0[position]
    }

    /// Sum of the weights of the positions holding a loss.
    pub fn weighted_loss(&self, sequence: &Sequence) -> f64 {
        sequence
            .symbols()
            .iter()
            .zip(self.0.iter())
            .filter(|(s, _)| **s == Symbol::Loss)
            .map(|(_, w)| *w)
            .sum()
    }
}

/// Parameters of a full optimizer run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MysticParams {
    /// Number of anchor positions (1-14).
    pub anchor_count: usize,
    /// Maximum weighted loss (0-5).
    pub max_tolerance: f64,
    /// Percentage of the ranked pool kept (0-100).
    pub strength: u32,
}

impl Default for MysticParams {
    fn default() -> Self {
        Self {
            anchor_count: 5,
            max_tolerance: 3.0,
            strength: 50,
        }
    }
}

impl MysticParams {
    pub fn new(anchor_count: usize, max_tolerance: f64, strength: u32) -> Self {
        Self {
            anchor_count,
            max_tolerance,
            strength,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_anchor_count(self.anchor_count)?;
        if !self.max_tolerance.is_finite()
            || self.max_tolerance < 0.0
            || self.max_tolerance > MAX_TOLERANCE
        {
            return Err(ValidationError::OutOfRange {
                name: "max_tolerance",
                value: self.max_tolerance,
                min: 0.0,
                max: MAX_TOLERANCE,
            });
        }
        if self.strength > 100 {
            return Err(ValidationError::OutOfRange {
                name: "strength",
                value: self.strength as f64,
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(())
    }
}

fn validate_anchor_count(anchor_count: usize) -> std::result::Result<(), ValidationError> {
    if anchor_count == 0 || anchor_count > SEQUENCE_LEN {
        return Err(ValidationError::OutOfRange {
            name: "anchor_count",
            value: anchor_count as f64,
            min: 1.0,
            max: SEQUENCE_LEN as f64,
        });
    }
    Ok(())
}

/// Sizes after each stage of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct MysticOutcome {
    pub anchors: Vec<usize>,
    pub input: usize,
    pub after_anchor: usize,
    pub after_tolerance: usize,
    /// Retained sequences, best score first.
    pub ranked: Vec<Sequence>,
}

impl MysticOutcome {
    pub fn result(&self) -> SequenceSet {
        self.ranked.iter().copied().collect()
    }
}

/// Keep sequences favourable at every anchor position.
pub fn anchor_filter(data: &[Sequence], anchors: &[usize]) -> Vec<Sequence> {
    data.iter()
        .filter(|s| anchors.iter().all(|&p| s.at(p).is_favorable()))
        .copied()
        .collect()
}

/// Stateful optimizer holding the statistics snapshot of its dataset.
#[derive(Debug, Clone, Default)]
pub struct MysticOptimizer {
    weights: PositionWeights,
    stats: Option<FrequencyStats>,
}

impl MysticOptimizer {
    pub fn new(weights: PositionWeights) -> Self {
        Self {
            weights,
            stats: None,
        }
    }

    pub fn weights(&self) -> &PositionWeights {
        &self.weights
    }

    /// Compute and cache the statistics of `data`.
    pub fn initialize(&mut self, data: &SequenceSet) -> &FrequencyStats {
        let stats = FrequencyStats::compute(data);
        log::debug!("mystic statistics computed over {} sequences", data.len());
        self.stats.insert(stats)
    }

    /// Cached statistics, computed over `data` if none are cached yet.
    pub fn stats_for(&mut self, data: &SequenceSet) -> &FrequencyStats {
        self.stats.get_or_insert_with(|| FrequencyStats::compute(data))
    }

    /// Drop the cached statistics.
    pub fn invalidate(&mut self) {
        self.stats = None;
    }

    pub fn stats(&self) -> std::result::Result<&FrequencyStats, UsageError> {
        self.stats.as_ref().ok_or(UsageError::StatisticsNotComputed)
    }

    /// Top `anchor_count` positions by favourable frequency, ties to the lower index.
    pub fn select_anchors(&self, anchor_count: usize) -> Result<Vec<usize>> {
        let stats = self.stats()?;
        validate_anchor_count(anchor_count)?;

        let mut positions: Vec<usize> = (0..SEQUENCE_LEN).collect();
        positions.sort_by(|a, b| stats.position_favorable[*b].cmp(&stats.position_favorable[*a]));
        positions.truncate(anchor_count);
        Ok(positions)
    }

    /// Keep sequences whose weighted loss is at most `max_tolerance`.
    pub fn tolerance_filter(&self, data: &[Sequence], max_tolerance: f64) -> Vec<Sequence> {
        data.iter()
            .filter(|s| self.weights.weighted_loss(s) <= max_tolerance + TOLERANCE_EPSILON)
            .copied()
            .collect()
    }

    pub fn score(&self, sequence: &Sequence) -> Result<u64> {
        Ok(self.stats()?.score(sequence))
    }

    /// Rank by score (stable, descending) and keep `max(1, len * strength / 100)`.
    pub fn shrink(&self, data: &[Sequence], strength: u32) -> Result<Vec<Sequence>> {
        let stats = self.stats()?;
        if strength > 100 {
            return Err(ValidationError::OutOfRange {
                name: "strength",
                value: strength as f64,
                min: 0.0,
                max: 100.0,
            }
            .into());
        }
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(u64, Sequence)> =
            data.iter().map(|s| (stats.score(s), *s)).collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        let keep = (data.len() * strength as usize / 100).max(1);
        Ok(scored.into_iter().take(keep).map(|(_, s)| s).collect())
    }

    /// Run all five stages over `data`, replacing any cached statistics.
    pub fn run(&mut self, data: &SequenceSet, params: &MysticParams) -> Result<MysticOutcome> {
        params.validate()?;
        self.initialize(data);

        let anchors = self.select_anchors(params.anchor_count)?;
        let anchored = anchor_filter(data.sorted_view(), &anchors);
        let tolerated = self.tolerance_filter(&anchored, params.max_tolerance);
        let ranked = self.shrink(&tolerated, params.strength)?;

        log::info!(
            "mystic run: anchors {:?}, {} -> {} -> {} -> {} sequences",
            anchors,
            data.len(),
            anchored.len(),
            tolerated.len(),
            ranked.len()
        );

        Ok(MysticOutcome {
            anchors,
            input: data.len(),
            after_anchor: anchored.len(),
            after_tolerance: tolerated.len(),
            ranked,
        })
    }
}

/// Advisory tolerance and strength for a dataset size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub max_tolerance: u32,
    pub strength: u32,
}

/// `tolerance = min(4, floor(sqrt(n)))`, `strength = max(30, 100 - floor(n / 100))`.
pub fn suggest_parameters(dataset_size: usize) -> Suggestion {
    let root = (dataset_size as f64).sqrt().floor() as u64;
    let max_tolerance = root.min(4) as u32;
    let strength = 100u64.saturating_sub(dataset_size as u64 / 100).max(30) as u32;
    Suggestion {
        max_tolerance,
        strength,
    }
}

/// Random sample of `min(n, |data|)` distinct sequences.
///
/// Sampling draws from the sorted view, so a seeded RNG gives a
/// reproducible preview.
pub fn preview<R: Rng + ?Sized>(data: &SequenceSet, n: usize, rng: &mut R) -> SequenceSet {
    data.sorted_view().choose_multiple(rng, n).copied().collect()
}
