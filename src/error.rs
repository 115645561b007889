// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Error types for Trisieve
//!
//! This module defines all error types used throughout the library.
//! Failures during a generation run are not errors of the call: they are
//! reported through [`crate::generator::GenerationEvent::Error`] together
//! with whatever partial result had been accumulated.

use crate::features::FeatureId;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Trisieve operations
pub type Result<T> = std::result::Result<T, SieveError>;

/// Main error type for Trisieve operations
#[derive(Error, Debug)]
pub enum SieveError {
    /// Malformed input, rejected before any work begins
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Operation invoked without its prerequisite state
    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    /// Unreadable or unwritable persistence path
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl SieveError {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SieveError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the caller can recover by correcting its input
    pub fn is_validation(&self) -> bool {
        matches!(self, SieveError::Validation(_))
    }

    /// Whether the error is a missing-prerequisite usage error
    pub fn is_usage(&self) -> bool {
        matches!(self, SieveError::Usage(_))
    }
}

/// Malformed sequences, masks, conditions or parameters
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Record does not have the fixed length
    #[error("Line {line}: expected {expected} symbols, got {actual}")]
    InvalidLength {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// Character outside the accepted alphabet
    #[error("Line {line}, column {column}: invalid symbol {found:?}")]
    InvalidSymbol {
        line: usize,
        column: usize,
        found: char,
    },

    /// Standalone record (not read from a file) with the wrong length
    #[error("Expected {expected} symbols, got {actual}")]
    RecordLength { expected: usize, actual: usize },

    /// Standalone record (not read from a file) with a foreign character
    #[error("Column {column}: invalid symbol {found:?}")]
    RecordSymbol { column: usize, found: char },

    /// Range condition with min > max
    #[error("Condition on {feature}: min {min} is greater than max {max}")]
    InvertedBounds { feature: FeatureId, min: u32, max: u32 },

    /// Basic filter invoked without any active condition
    #[error("At least one filter condition must be active")]
    NoConditions,

    /// Mask filter invoked with an empty mask list
    #[error("Mask list is empty")]
    EmptyMaskSet,

    /// Template file without any sequence
    #[error("Template contains no sequences")]
    EmptyTemplate,

    /// Numeric parameter outside its accepted range
    #[error("{name} = {value} is outside [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ValidationError {
    /// Attach the file line a record-level error came from
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            ValidationError::RecordLength { expected, actual }
            | ValidationError::InvalidLength {
                expected, actual, ..
            } => ValidationError::InvalidLength {
                line,
                expected,
                actual,
            },
            ValidationError::RecordSymbol { column, found }
            | ValidationError::InvalidSymbol { column, found, .. } => {
                ValidationError::InvalidSymbol {
                    line,
                    column,
                    found,
                }
            }
            other => other,
        }
    }
}

/// Operations invoked in the wrong session state
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// Mystic stage used before statistics were computed
    #[error("Frequency statistics have not been computed for this dataset")]
    StatisticsNotComputed,

    /// Session is owned by a running generation job
    #[error("A generation job is running; wait for it to finish")]
    GenerationInProgress,

    /// Generation result handed back while no job was started
    #[error("No generation job is running")]
    NoGenerationRunning,

    /// Report produced by another job or by an inline run
    #[error("Generation report was not produced by this session's job")]
    ForeignReport,
}
