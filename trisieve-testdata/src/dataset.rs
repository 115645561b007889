// Trisieve Testdata - Pool structures
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Generated pools and their files.
//!
//! A pool is saved as two files side by side: `<name>.txt` in the engine's
//! sequence format and `<name>.json` holding the manifest.

use crate::manifest::PoolManifest;
use std::path::{Path, PathBuf};
use thiserror::Error;
use trisieve::{SequenceSet, SieveError};

/// Dataset error types.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Engine error: {0}")]
    Sieve(#[from] SieveError),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Empty pool")]
    Empty,
}

/// A generated pool together with its manifest.
#[derive(Debug, Clone)]
pub struct SyntheticPool {
    pub sequences: SequenceSet,
    pub manifest: PoolManifest,
}

impl SyntheticPool {
    /// Path of the sequence file for this pool inside `dir`.
    pub fn sequence_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!("{}.txt", self.manifest.name))
    }

    /// Path of the manifest file for this pool inside `dir`.
    pub fn manifest_path(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!("{}.json", self.manifest.name))
    }

    /// Write the sequence file and the manifest into `dir`.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf, DatasetError> {
        if self.sequences.is_empty() {
            return Err(DatasetError::Empty);
        }
        let dir = dir.as_ref();
        let path = self.sequence_path(dir);
        trisieve::io::write_sequences(&path, &self.sequences)?;
        self.manifest.to_json_file(self.manifest_path(dir))?;
        Ok(path)
    }

    /// Load a pool saved with [`SyntheticPool::save`].
    pub fn load(dir: impl AsRef<Path>, name: &str) -> Result<Self, DatasetError> {
        let dir = dir.as_ref();
        let manifest = PoolManifest::from_json_file(dir.join(format!("{}.json", name)))?;
        let sequences = trisieve::io::read_sequences(dir.join(format!("{}.txt", name)))?;
        Ok(Self {
            sequences,
            manifest,
        })
    }
}
