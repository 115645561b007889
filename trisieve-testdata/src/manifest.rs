// Trisieve Testdata - Pool manifest
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Manifest describing a generated pool.
//!
//! Besides the generation parameters the manifest records the observed
//! outcome mix, so a test can check a pool file against what it expects
//! without recomputing statistics.

use crate::dataset::DatasetError;
use crate::generator::PoolConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use trisieve::{FrequencyStats, SequenceSet, Symbol, SEQUENCE_LEN};

/// Pool manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolManifest {
    /// Pool name (matches the file name without extension).
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Profile name.
    pub profile: String,
    /// Number of sequences requested.
    pub requested: usize,
    /// Number of distinct sequences generated.
    pub size: usize,
    /// Observed share of each outcome.
    pub outcome_mix: OutcomeMix,
    /// Observed favourable share at each position.
    pub position_favorable: Vec<f64>,
    /// Generation timestamp.
    pub generated_at: DateTime<Utc>,
    /// Random seed used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// Share of WIN, DRAW and LOSS over all positions of a pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OutcomeMix {
    pub win: f64,
    pub draw: f64,
    pub loss: f64,
}

impl OutcomeMix {
    pub fn observe(sequences: &SequenceSet) -> Self {
        let mut counts = [0u64; 3];
        for sequence in sequences {
            for symbol in sequence.symbols() {
                counts[symbol.index()] += 1;
            }
        }
        let total = (sequences.len() * SEQUENCE_LEN) as f64;
        if total == 0.0 {
            return Self::default();
        }
        Self {
            win: counts[Symbol::Win.index()] as f64 / total,
            draw: counts[Symbol::Draw.index()] as f64 / total,
            loss: counts[Symbol::Loss.index()] as f64 / total,
        }
    }
}

impl PoolManifest {
    /// Describe a freshly generated pool.
    pub fn describe(config: &PoolConfig, sequences: &SequenceSet) -> Self {
        let stats = FrequencyStats::compute(sequences);
        Self {
            name: config.name.clone(),
            description: String::new(),
            profile: config.profile.name().to_string(),
            requested: config.size,
            size: sequences.len(),
            outcome_mix: OutcomeMix::observe(sequences),
            position_favorable: (0..SEQUENCE_LEN).map(|p| stats.position_ratio(p)).collect(),
            generated_at: Utc::now(),
            seed: config.seed,
        }
    }

    /// Set description.
    pub fn with_description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Save to JSON file.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), DatasetError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load from JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trisieve::Sequence;

    #[test]
    fn test_outcome_mix() {
        let set: SequenceSet = ["33333333333333", "11111110000000"]
            .iter()
            .map(|t| Sequence::parse(t).unwrap())
            .collect();
        let mix = OutcomeMix::observe(&set);
        assert!((mix.win - 0.5).abs() < 1e-12);
        assert!((mix.draw - 0.25).abs() < 1e-12);
        assert!((mix.loss - 0.25).abs() < 1e-12);
        assert_eq!(OutcomeMix::observe(&SequenceSet::new()), OutcomeMix::default());
    }

    #[test]
    fn test_manifest_json() {
        let set: SequenceSet = ["33333333333333"]
            .iter()
            .map(|t| Sequence::parse(t).unwrap())
            .collect();
        let config = PoolConfig::new().with_name("unit").with_size(1).with_seed(3);
        let manifest = PoolManifest::describe(&config, &set).with_description("one sequence");

        let json = manifest.to_json().unwrap();
        let parsed: PoolManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, "unit");
        assert_eq!(parsed.seed, Some(3));
        assert_eq!(parsed.position_favorable, vec![1.0; SEQUENCE_LEN]);
    }
}
