// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Filtering session.
//!
//! A [`Session`] owns everything one filtering workflow needs: the base set,
//! the last generated pool, the working set every filter narrows, the
//! position selector, the mask list and the optimizer's statistics. Filters
//! form a linear pipeline over the working set; going back to an earlier
//! stage means resetting the working set, not undoing a step.
//!
//! While a background generation job is running the session refuses every
//! other mutating call with [`UsageError::GenerationInProgress`]. The lock
//! lives as long as the job's [`GenerationHandle`]: joining or dropping the
//! handle releases it, and [`Session::abort_generate`] releases it at once.
//! Only the report of the session's own job is accepted by
//! [`Session::finish_generate`].

use crate::basic::{self, FilterCondition};
use crate::config::EngineConfig;
use crate::error::{Result, UsageError};
use crate::generator::{
    CancelToken, GenerationEvent, GenerationHandle, GenerationJob, GenerationReport,
    GenerationStatus, Generator, JobId, JobLease,
};
use crate::io::{self, MaskImport};
use crate::mask::{self, MaskMode, MaskSet};
use crate::mystic::{
    self, FrequencyStats, MysticOptimizer, MysticOutcome, MysticParams, PositionWeights,
    Suggestion,
};
use crate::symbol::{PositionSelector, SequenceSet};
use rand::Rng;
use std::path::Path;
use std::sync::{Arc, Weak};

pub struct Session {
    config: EngineConfig,
    base: Arc<SequenceSet>,
    pool: SequenceSet,
    working: SequenceSet,
    selector: PositionSelector,
    masks: MaskSet,
    optimizer: MysticOptimizer,
    job: Option<ActiveJob>,
}

/// Background job started by the session and not yet finished.
struct ActiveJob {
    id: JobId,
    lease: Weak<JobLease>,
}

impl ActiveJob {
    fn is_running(&self) -> bool {
        self.lease.strong_count() > 0
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Empty session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let optimizer = MysticOptimizer::new(PositionWeights::new(config.mystic.position_weights));
        Self {
            config,
            base: Arc::new(SequenceSet::new()),
            pool: SequenceSet::new(),
            working: SequenceSet::new(),
            selector: PositionSelector::all(),
            masks: MaskSet::new(),
            optimizer,
            job: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a job's handle is still alive.
    pub fn is_generating(&self) -> bool {
        self.job.as_ref().map_or(false, ActiveJob::is_running)
    }

    fn ensure_idle(&self) -> Result<()> {
        if self.is_generating() {
            return Err(UsageError::GenerationInProgress.into());
        }
        Ok(())
    }

    fn replace_working(&mut self, working: SequenceSet) {
        self.working = working;
        self.optimizer.invalidate();
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Load the base set from a sequence file; returns its size.
    pub fn load_base(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        self.ensure_idle()?;
        let set = io::read_sequences(path)?;
        let len = set.len();
        self.set_base(set)?;
        Ok(len)
    }

    /// Replace the base set; the pool and working set restart from it.
    pub fn set_base(&mut self, base: SequenceSet) -> Result<()> {
        self.ensure_idle()?;
        self.pool = base.clone();
        self.replace_working(base.clone());
        self.base = Arc::new(base);
        log::info!("session base set: {} sequences", self.base.len());
        Ok(())
    }

    /// Derive the position selector from a template file.
    pub fn load_template(&mut self, path: impl AsRef<Path>) -> Result<&PositionSelector> {
        self.ensure_idle()?;
        self.selector = io::read_template(path)?;
        log::info!(
            "selector loaded from template: universe {}",
            self.selector.universe_size()
        );
        Ok(&self.selector)
    }

    pub fn set_selector(&mut self, selector: PositionSelector) -> Result<()> {
        self.ensure_idle()?;
        self.selector = selector;
        Ok(())
    }

    pub fn selector(&self) -> &PositionSelector {
        &self.selector
    }

    // ------------------------------------------------------------------
    // Generation
    // ------------------------------------------------------------------

    /// Start generation on a background thread.
    ///
    /// The session stays locked while the returned handle is alive. Pass the
    /// report from [`GenerationHandle::join`] to [`Session::finish_generate`]
    /// to adopt the result.
    pub fn start_generate(&mut self) -> Result<GenerationHandle> {
        self.ensure_idle()?;
        log::info!(
            "starting background generation over a universe of {}",
            self.selector.universe_size()
        );
        let handle = GenerationJob::spawn(
            Arc::clone(&self.base),
            self.selector,
            self.config.generator.clone(),
        );
        self.job = Some(ActiveJob {
            id: handle.id(),
            lease: handle.lease(),
        });
        Ok(handle)
    }

    /// Adopt the result of this session's background run.
    ///
    /// Partial results of cancelled or failed runs are adopted as well; the
    /// returned status tells whether the pool is complete. Reports of other
    /// jobs and of inline runs are refused.
    pub fn finish_generate(&mut self, report: GenerationReport) -> Result<GenerationStatus> {
        let active = self
            .job
            .as_ref()
            .ok_or(UsageError::NoGenerationRunning)?;
        if report.job != Some(active.id) {
            return Err(UsageError::ForeignReport.into());
        }
        self.job = None;
        self.adopt(&report);
        Ok(report.status)
    }

    /// Give up on the background job without adopting anything.
    ///
    /// The job is cancelled and the session unlocks immediately; a report
    /// the job still produces is refused afterwards.
    pub fn abort_generate(&mut self) -> Result<()> {
        let job = self.job.take().ok_or(UsageError::NoGenerationRunning)?;
        if let Some(lease) = job.lease.upgrade() {
            lease.cancel();
        }
        log::warn!("{} abandoned", job.id);
        Ok(())
    }

    /// Run generation on the calling thread.
    pub fn generate(
        &mut self,
        cancel: &CancelToken,
        on_event: &mut dyn FnMut(GenerationEvent),
    ) -> Result<GenerationReport> {
        self.ensure_idle()?;
        let generator = Generator::new(self.config.generator.clone());
        let report = generator.run(&self.base, &self.selector, cancel, on_event);
        self.adopt(&report);
        Ok(report)
    }

    fn adopt(&mut self, report: &GenerationReport) {
        if !report.completed() {
            log::warn!(
                "adopting partial generation result: {} new candidates ({:?})",
                report.new.len(),
                report.status
            );
        }
        self.pool = report.new.clone();
        self.replace_working(report.new.clone());
    }

    // ------------------------------------------------------------------
    // Filters
    // ------------------------------------------------------------------

    /// Narrow the working set by range conditions; returns the new size.
    pub fn apply_basic(&mut self, conditions: &[FilterCondition]) -> Result<usize> {
        self.ensure_idle()?;
        let kept = basic::apply_basic(&self.working, conditions)?;
        self.replace_working(kept);
        Ok(self.working.len())
    }

    /// Narrow the working set by the session's mask list.
    pub fn apply_masks(&mut self, mode: MaskMode) -> Result<usize> {
        self.ensure_idle()?;
        let kept = mask::apply_mask(&self.working, &self.masks, mode)?;
        self.replace_working(kept);
        Ok(self.working.len())
    }

    /// Narrow the working set by an explicit mask list.
    pub fn apply_mask_set(&mut self, masks: &MaskSet, mode: MaskMode) -> Result<usize> {
        self.ensure_idle()?;
        let kept = mask::apply_mask(&self.working, masks, mode)?;
        self.replace_working(kept);
        Ok(self.working.len())
    }

    /// Run the optimizer over the working set and keep its result.
    pub fn run_mystic(&mut self, params: &MysticParams) -> Result<MysticOutcome> {
        self.ensure_idle()?;
        let outcome = self.optimizer.run(&self.working, params)?;
        self.replace_working(outcome.result());
        Ok(outcome)
    }

    pub fn suggest_mystic_params(&self) -> Suggestion {
        mystic::suggest_parameters(self.working.len())
    }

    /// Statistics of the current working set, computed on first use.
    pub fn frequency_stats(&mut self) -> &FrequencyStats {
        self.optimizer.stats_for(&self.working)
    }

    /// Random sample of the working set.
    pub fn preview(&self, n: usize) -> SequenceSet {
        self.preview_with(n, &mut rand::thread_rng())
    }

    pub fn preview_with<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> SequenceSet {
        mystic::preview(&self.working, n, rng)
    }

    /// Working set := base set.
    pub fn reset_to_base(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.replace_working(self.base.as_ref().clone());
        log::info!("working set reset to base ({})", self.working.len());
        Ok(())
    }

    /// Working set := last generated pool.
    pub fn reset_to_pool(&mut self) -> Result<()> {
        self.ensure_idle()?;
        self.replace_working(self.pool.clone());
        log::info!("working set reset to pool ({})", self.working.len());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn save_current_set(&self, path: impl AsRef<Path>) -> Result<()> {
        self.ensure_idle()?;
        io::write_sequences(path, &self.working)
    }

    pub fn export_masks(&self, path: impl AsRef<Path>) -> Result<()> {
        io::write_masks(path, &self.masks)
    }

    /// Replace the mask list with the valid lines of a mask file.
    pub fn import_masks(&mut self, path: impl AsRef<Path>) -> Result<MaskImport> {
        let import = io::read_masks(path)?;
        self.masks = import.masks.clone();
        Ok(import)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn masks(&self) -> &MaskSet {
        &self.masks
    }

    pub fn masks_mut(&mut self) -> &mut MaskSet {
        &mut self.masks
    }

    pub fn base(&self) -> &SequenceSet {
        &self.base
    }

    pub fn pool(&self) -> &SequenceSet {
        &self.pool
    }

    pub fn working(&self) -> &SequenceSet {
        &self.working
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SieveError;
    use crate::features::FeatureId;
    use crate::symbol::{Sequence, Symbol, SymbolSet};

    fn set(texts: &[&str]) -> SequenceSet {
        texts.iter().map(|t| Sequence::parse(t).unwrap()).collect()
    }

    #[test]
    fn test_new_session_is_empty() {
        let session = Session::new();
        assert!(session.base().is_empty());
        assert!(session.working().is_empty());
        assert!(!session.is_generating());
        assert_eq!(session.selector().universe_size(), 4_782_969);
    }

    #[test]
    fn test_set_base_resets_working() {
        let mut session = Session::new();
        session.set_base(set(&["33333333333333", "00000000000000"])).unwrap();
        assert_eq!(session.working().len(), 2);
        assert_eq!(session.pool().len(), 2);
    }

    #[test]
    fn test_generate_then_filter_then_reset() {
        let mut session = Session::new();
        session.set_base(set(&["33333333333333"])).unwrap();
        session
            .set_selector(PositionSelector::uniform(SymbolSet::FAVORABLE))
            .unwrap();

        let report = session.generate(&CancelToken::new(), &mut |_| {}).unwrap();
        assert!(report.completed());
        assert_eq!(session.working().len(), 16_383);

        let kept = session
            .apply_basic(&[FilterCondition::exactly(FeatureId::DrawCount, 14)])
            .unwrap();
        assert_eq!(kept, 1);

        session.reset_to_pool().unwrap();
        assert_eq!(session.working().len(), 16_383);
        session.reset_to_base().unwrap();
        assert_eq!(session.working(), &set(&["33333333333333"]));
    }

    #[test]
    fn test_locked_while_generating() {
        let mut session = Session::new();
        session
            .set_selector(PositionSelector::uniform(SymbolSet::only(Symbol::Win)))
            .unwrap();

        let handle = session.start_generate().unwrap();
        assert!(session.is_generating());
        let err = session.reset_to_base().unwrap_err();
        assert!(err.is_usage());
        assert!(session.start_generate().is_err());

        let report = handle.join();
        assert!(!session.is_generating());
        let status = session.finish_generate(report).unwrap();
        assert_eq!(status, GenerationStatus::Completed);
        assert_eq!(session.working().len(), 1);

        let again = session.finish_generate(GenerationReport {
            new: SequenceSet::new(),
            status: GenerationStatus::Completed,
            evaluated: 0,
            universe: 0,
            job: None,
        });
        assert!(again.unwrap_err().is_usage());
    }

    #[test]
    fn test_dropped_handle_unlocks_session() {
        let mut session = Session::new();
        session.set_base(set(&["33333333333333"])).unwrap();
        session
            .set_selector(PositionSelector::uniform(SymbolSet::FAVORABLE))
            .unwrap();

        let handle = session.start_generate().unwrap();
        let token = handle.cancel_token();
        assert!(session.is_generating());
        drop(handle);

        assert!(token.is_cancelled());
        assert!(!session.is_generating());
        session.reset_to_base().unwrap();
        session
            .apply_basic(&[FilterCondition::exactly(FeatureId::WinCount, 14)])
            .unwrap();
        let next = session.start_generate().unwrap();
        let status = session.finish_generate(next.join()).unwrap();
        assert_eq!(status, GenerationStatus::Completed);
        assert_eq!(session.working().len(), 16_383);
    }

    #[test]
    fn test_foreign_report_refused() {
        let mut session = Session::new();
        session
            .set_selector(PositionSelector::uniform(SymbolSet::only(Symbol::Win)))
            .unwrap();
        let handle = session.start_generate().unwrap();

        let fabricated = GenerationReport {
            new: set(&["00000000000000"]),
            status: GenerationStatus::Completed,
            evaluated: 0,
            universe: 0,
            job: None,
        };
        assert!(matches!(
            session.finish_generate(fabricated),
            Err(SieveError::Usage(UsageError::ForeignReport))
        ));

        let mut other = Session::new();
        other
            .set_selector(PositionSelector::uniform(SymbolSet::only(Symbol::Win)))
            .unwrap();
        let other_report = other.start_generate().unwrap().join();
        assert!(session.finish_generate(other_report).is_err());

        // the refused reports left the job in place
        session.finish_generate(handle.join()).unwrap();
        assert_eq!(session.working(), &set(&["33333333333333"]));
    }

    #[test]
    fn test_abort_generate() {
        let mut session = Session::new();
        assert!(session.abort_generate().unwrap_err().is_usage());

        let handle = session.start_generate().unwrap();
        session.abort_generate().unwrap();
        assert!(handle.cancel_token().is_cancelled());
        assert!(!session.is_generating());
        session.reset_to_base().unwrap();

        let late = handle.join();
        assert!(session.finish_generate(late).unwrap_err().is_usage());
    }

    #[test]
    fn test_mystic_and_stats_follow_working_set() {
        let mut session = Session::new();
        session
            .set_base(set(&["33333333333333", "31313131313131", "00000000000000"]))
            .unwrap();
        assert_eq!(session.frequency_stats().sample_count, 3);

        session.run_mystic(&MysticParams::new(14, 0.0, 100)).unwrap();
        assert_eq!(session.working().len(), 2);
        assert_eq!(session.frequency_stats().sample_count, 2);
    }

    #[test]
    fn test_apply_masks_requires_masks() {
        let mut session = Session::new();
        session.set_base(set(&["33333333333333"])).unwrap();
        assert!(session.apply_masks(MaskMode::Keep).unwrap_err().is_validation());

        session
            .masks_mut()
            .insert(crate::mask::PositionMask::wildcard());
        assert_eq!(session.apply_masks(MaskMode::Exclude).unwrap(), 0);
    }
}
