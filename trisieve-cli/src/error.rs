// Trisieve CLI - Error types
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

use thiserror::Error;
use trisieve::{SieveError, ValidationError};
use trisieve_testdata::DatasetError;

/// CLI error types.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Sieve(#[from] SieveError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<ValidationError> for CliError {
    fn from(e: ValidationError) -> Self {
        CliError::Sieve(e.into())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;
