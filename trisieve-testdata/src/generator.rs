// Trisieve Testdata - Core generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Synthetic pool generation.

use crate::dataset::{DatasetError, SyntheticPool};
use crate::manifest::PoolManifest;
use crate::profile::OutcomeProfile;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use trisieve::SequenceSet;

/// Draws per requested sequence before giving up on reaching the size.
const MAX_DRAWS_PER_SEQUENCE: usize = 50;

/// Pool generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Pool name, used for file names.
    pub name: String,
    /// Number of distinct sequences requested.
    pub size: usize,
    /// Outcome profile.
    pub profile: OutcomeProfile,
    /// Random seed for reproducibility.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            size: 1000,
            profile: OutcomeProfile::Uniform,
            seed: None,
        }
    }
}

impl PoolConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Set number of distinct sequences.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self
    }

    pub fn with_profile(mut self, profile: OutcomeProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Generate a pool of distinct sequences.
///
/// Duplicate draws are discarded; with a strongly skewed profile the pool
/// can end up smaller than requested, which the manifest records.
pub fn generate_pool(config: &PoolConfig) -> Result<SyntheticPool, DatasetError> {
    if !config.profile.is_valid() {
        return Err(DatasetError::InvalidProfile(format!(
            "{} profile has negative, non-finite or all-zero weights",
            config.profile.name()
        )));
    }

    let mut rng: Box<dyn RngCore> = match config.seed {
        Some(s) => Box::new(StdRng::seed_from_u64(s)),
        None => Box::new(StdRng::from_entropy()),
    };

    let mut sequences = SequenceSet::with_capacity(config.size);
    let max_draws = config.size.saturating_mul(MAX_DRAWS_PER_SEQUENCE);
    let mut draws = 0;
    while sequences.len() < config.size && draws < max_draws {
        sequences.insert(config.profile.sample(&mut rng));
        draws += 1;
    }

    let manifest = PoolManifest::describe(config, &sequences);
    Ok(SyntheticPool {
        sequences,
        manifest,
    })
}
