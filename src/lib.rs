// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! # Trisieve - Outcome sequence generation and filtering
//!
//! Builds pools of 14-event outcome sequences over the alphabet
//! WIN `'3'`, DRAW `'1'`, LOSS `'0'` and narrows them through independent
//! filter stages.
//!
//! ## Key Features
//!
//! - **Batch generator**: expands a per-position selector into every
//!   candidate not already in a base set, cancellable between batches
//! - **Basic range filter**: inclusive bounds on counts and run lengths
//! - **Positional mask filter**: wildcard masks, keep or exclude
//! - **Mystic optimizer**: statistics-driven anchor, tolerance and
//!   score-ranked shrink stages
//! - **Session**: one owner for base set, working set, masks and statistics
//!
//! ## Quick Start
//!
//! ```rust
//! use trisieve::{
//!     CancelToken, FeatureId, FilterCondition, PositionSelector, Session, SequenceSet, SymbolSet,
//! };
//!
//! let mut session = Session::new();
//! session.set_base(SequenceSet::new()).unwrap();
//! session
//!     .set_selector(PositionSelector::uniform(SymbolSet::FAVORABLE))
//!     .unwrap();
//!
//! // 2^14 candidates, none of them in the (empty) base set
//! let report = session.generate(&CancelToken::new(), &mut |_| {}).unwrap();
//! assert_eq!(report.new.len(), 16_384);
//!
//! // Keep the sequences with exactly seven wins
//! let kept = session
//!     .apply_basic(&[FilterCondition::exactly(FeatureId::WinCount, 7)])
//!     .unwrap();
//! assert_eq!(kept, 3432);
//! ```
//!
//! ## Modules
//!
//! - [`symbol`]: Alphabet, sequences, sequence sets, position selector
//! - [`features`]: Counts and run lengths
//! - [`generator`]: Batch generator and background job
//! - [`basic`]: Basic range filter
//! - [`mask`]: Positional mask filter
//! - [`mystic`]: Mystic optimizer
//! - [`session`]: Filtering session
//! - [`io`]: Sequence, mask and template files
//! - [`config`]: Engine configuration

pub mod basic;
pub mod config;
pub mod error;
pub mod features;
pub mod generator;
pub mod io;
pub mod mask;
pub mod mystic;
pub mod session;
pub mod symbol;

// Re-exports for convenient access
pub use basic::{apply_basic, FilterCondition};
pub use config::{BasicConfig, ConditionPreset, EngineConfig, GeneratorConfig, MysticConfig};
pub use error::{Result, SieveError, UsageError, ValidationError};
pub use features::{FeatureId, FeatureVector};
pub use generator::{
    CancelToken, GenerationEvent, GenerationHandle, GenerationJob, GenerationReport,
    GenerationStatus, Generator, JobId,
};
pub use io::MaskImport;
pub use mask::{apply_mask, MaskEntry, MaskMode, MaskSet, PositionMask};
pub use mystic::{
    preview, suggest_parameters, FrequencyStats, MysticOptimizer, MysticOutcome, MysticParams,
    PositionWeights, Suggestion,
};
pub use session::Session;
pub use symbol::{PositionSelector, Sequence, SequenceSet, Symbol, SymbolSet, SEQUENCE_LEN};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
