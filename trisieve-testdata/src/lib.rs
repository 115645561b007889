// Trisieve Testdata - Synthetic outcome pool generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Trisieve Testdata
//!
//! Synthetic outcome pool generator for the Trisieve ecosystem.
//!
//! Builds realistic base sets for tests, benchmarks and the CLI:
//!
//! - **Outcome profiles**: uniform, weighted, per-position, drifting form
//! - **Seeded generation**: the same seed always yields the same pool
//! - **Manifests**: JSON description of a pool and its observed outcome mix
//!
//! ## Quick Start
//!
//! ```rust
//! use trisieve_testdata::{generate_pool, OutcomeProfile, OutcomeWeights, PoolConfig};
//!
//! let config = PoolConfig::new()
//!     .with_name("home_heavy")
//!     .with_size(1000)
//!     .with_profile(OutcomeProfile::Weighted(OutcomeWeights::new(2.0, 1.0, 1.0)))
//!     .with_seed(42);
//!
//! let pool = generate_pool(&config).unwrap();
//! assert_eq!(pool.sequences.len(), 1000);
//! assert!(pool.manifest.outcome_mix.win > pool.manifest.outcome_mix.loss);
//! ```

pub mod dataset;
pub mod generator;
pub mod manifest;
pub mod profile;

// Re-exports for convenience
pub use dataset::{DatasetError, SyntheticPool};
pub use generator::{generate_pool, PoolConfig};
pub use manifest::{OutcomeMix, PoolManifest};
pub use profile::{OutcomeProfile, OutcomeWeights};
