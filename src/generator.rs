// Trisieve - Candidate pool generation and filtering
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Cancellable batch generator.
//!
//! The generator enumerates the Cartesian product of a [`PositionSelector`]
//! (the *universe*) once per run and keeps the candidates that are not
//! already in the base set. Work is split into fixed-size batches; after each
//! batch the generator reports progress and the running count, and samples
//! the cancellation flag. A run ends with exactly one terminal event.
//!
//! ```rust
//! use trisieve::generator::{CancelToken, GenerationEvent, Generator};
//! use trisieve::{GeneratorConfig, PositionSelector, SequenceSet, SymbolSet};
//!
//! let generator = Generator::new(GeneratorConfig::default());
//! let selector = PositionSelector::uniform(SymbolSet::FAVORABLE);
//! let mut events = Vec::new();
//!
//! let report = generator.run(
//!     &SequenceSet::new(),
//!     &selector,
//!     &CancelToken::new(),
//!     &mut |e| events.push(e),
//! );
//!
//! assert!(report.completed());
//! assert_eq!(report.new.len(), 16_384);
//! assert_eq!(events.last(), Some(&GenerationEvent::Done(16_384)));
//! ```

use crate::config::GeneratorConfig;
use crate::symbol::{PositionSelector, Sequence, SequenceSet, Symbol, SEQUENCE_LEN};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Weak};
use std::thread::JoinHandle;

static NEXT_JOB_ID: AtomicU64 = AtomicU64::new(1);

/// Cooperative cancellation flag shared between a job and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; honoured at the next batch boundary.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Notification emitted by a generation run.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationEvent {
    /// Percentage (0-100) of the universe evaluated so far.
    Progress(f64),
    /// Running number of new candidates.
    Partial(usize),
    /// Run covered the whole universe.
    Done(usize),
    /// Run stopped at a batch boundary after a cancel request.
    Cancelled(usize),
    /// Run aborted; candidates found before the failure remain valid.
    Error(String),
}

impl GenerationEvent {
    /// Done, Cancelled and Error close the event stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GenerationEvent::Done(_) | GenerationEvent::Cancelled(_) | GenerationEvent::Error(_)
        )
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationStatus {
    Completed,
    Cancelled,
    Failed(String),
}

/// Identity of a background job, unique within the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(u64);

impl JobId {
    fn next() -> Self {
        JobId(NEXT_JOB_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job #{}", self.0)
    }
}

/// Liveness marker of a background job, owned by its handle.
///
/// Dropping it cancels the run.
#[derive(Debug)]
pub(crate) struct JobLease {
    cancel: CancelToken,
}

impl JobLease {
    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for JobLease {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationReport {
    /// Candidates not present in the base set (partial unless completed).
    pub new: SequenceSet,
    pub status: GenerationStatus,
    /// Candidates evaluated before the run ended.
    pub evaluated: u64,
    /// Size of the universe.
    pub universe: u64,
    /// Background job that produced the report; `None` for inline runs.
    pub job: Option<JobId>,
}

impl GenerationReport {
    /// Whether the whole universe was covered.
    pub fn completed(&self) -> bool {
        self.status == GenerationStatus::Completed
    }

    /// The terminal event matching this report.
    pub fn terminal_event(&self) -> GenerationEvent {
        match &self.status {
            GenerationStatus::Completed => GenerationEvent::Done(self.new.len()),
            GenerationStatus::Cancelled => GenerationEvent::Cancelled(self.new.len()),
            GenerationStatus::Failed(message) => GenerationEvent::Error(message.clone()),
        }
    }
}

/// Lexicographic walk over the Cartesian product of a selector.
///
/// Symbols are visited in text-encoding order with the last position
/// varying fastest, so candidates come out in sorted order.
pub struct UniverseIter {
    options: Vec<Vec<Symbol>>,
    digits: [usize; SEQUENCE_LEN],
    exhausted: bool,
}

impl UniverseIter {
    pub fn new(selector: &PositionSelector) -> Self {
        let options: Vec<Vec<Symbol>> = (0..SEQUENCE_LEN)
            .map(|pos| selector.allowed(pos).symbols())
            .collect();
        let exhausted = options.iter().any(|o| o.is_empty());
        Self {
            options,
            digits: [0; SEQUENCE_LEN],
            exhausted,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    fn current(&self) -> Sequence {
        let mut symbols = [Symbol::Loss; SEQUENCE_LEN];
        for (pos, symbol) in symbols.iter_mut().enumerate() {
            *symbol = self.options[pos][self.digits[pos]];
        }
        Sequence::from_symbols(symbols)
    }

    fn advance(&mut self) {
        for pos in (0..SEQUENCE_LEN).rev() {
            self.digits[pos] += 1;
            if self.digits[pos] < self.options[pos].len() {
                return;
            }
            self.digits[pos] = 0;
        }
        self.exhausted = true;
    }
}

impl Iterator for UniverseIter {
    type Item = Sequence;

    fn next(&mut self) -> Option<Sequence> {
        if self.exhausted {
            return None;
        }
        let candidate = self.current();
        self.advance();
        Some(candidate)
    }
}

/// Batch generator.
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: GeneratorConfig,
}

impl Generator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Expand `selector` against `base` on the calling thread.
    ///
    /// Emits `Progress` and `Partial` after every batch and exactly one
    /// terminal event before returning.
    pub fn run(
        &self,
        base: &SequenceSet,
        selector: &PositionSelector,
        cancel: &CancelToken,
        on_event: &mut dyn FnMut(GenerationEvent),
    ) -> GenerationReport {
        let universe = selector.universe_size();
        let mut new = SequenceSet::new();
        let mut evaluated = 0u64;

        log::debug!(
            "generation started: universe {}, base {}, batch size {}",
            universe,
            base.len(),
            self.config.batch_size
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.expand(
                base,
                selector,
                cancel,
                &mut new,
                &mut evaluated,
                universe,
                &mut *on_event,
            )
        }));

        let status = outcome.unwrap_or_else(|payload| {
            GenerationStatus::Failed(format!("generator panicked: {}", panic_message(&payload)))
        });

        let report = GenerationReport {
            new,
            status,
            evaluated,
            universe,
            job: None,
        };

        match &report.status {
            GenerationStatus::Completed => {
                log::info!("generation done: {} new candidates", report.new.len())
            }
            GenerationStatus::Cancelled => log::info!(
                "generation cancelled after {}/{} candidates: {} new",
                evaluated,
                universe,
                report.new.len()
            ),
            GenerationStatus::Failed(message) => log::warn!(
                "generation failed after {}/{} candidates: {}",
                evaluated,
                universe,
                message
            ),
        }

        on_event(report.terminal_event());
        report
    }

    #[allow(clippy::too_many_arguments)]
    fn expand(
        &self,
        base: &SequenceSet,
        selector: &PositionSelector,
        cancel: &CancelToken,
        new: &mut SequenceSet,
        evaluated: &mut u64,
        universe: u64,
        on_event: &mut dyn FnMut(GenerationEvent),
    ) -> GenerationStatus {
        let batch_size = self.config.batch_size.max(1);
        let mut candidates = UniverseIter::new(selector);

        loop {
            if candidates.is_exhausted() {
                return GenerationStatus::Completed;
            }
            if cancel.is_cancelled() {
                return GenerationStatus::Cancelled;
            }

            for candidate in candidates.by_ref().take(batch_size) {
                *evaluated += 1;
                if base.contains(&candidate) {
                    continue;
                }
                if let Some(max) = self.config.max_new_candidates {
                    if new.len() >= max && !new.contains(&candidate) {
                        return GenerationStatus::Failed(format!(
                            "new candidate limit of {} reached",
                            max
                        ));
                    }
                }
                new.insert(candidate);
            }

            on_event(GenerationEvent::Progress(
                *evaluated as f64 / universe as f64 * 100.0,
            ));
            on_event(GenerationEvent::Partial(new.len()));
        }
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Generation running on a background thread.
pub struct GenerationJob;

impl GenerationJob {
    /// Start a run on its own thread.
    ///
    /// The base set is shared read-only with the job; events are delivered
    /// through the handle's channel and the final report through
    /// [`GenerationHandle::join`]. Dropping the handle cancels the run.
    pub fn spawn(
        base: Arc<SequenceSet>,
        selector: PositionSelector,
        config: GeneratorConfig,
    ) -> GenerationHandle {
        let id = JobId::next();
        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();
        let token = cancel.clone();

        let thread = std::thread::spawn(move || {
            let generator = Generator::new(config);
            // Consumers may stop listening; events are best-effort.
            let mut report = generator.run(&base, &selector, &token, &mut |event| {
                let _ = tx.send(event);
            });
            report.job = Some(id);
            report
        });

        GenerationHandle {
            id,
            lease: Arc::new(JobLease {
                cancel: cancel.clone(),
            }),
            cancel,
            events: rx,
            thread,
        }
    }
}

/// Owner side of a background generation run.
pub struct GenerationHandle {
    id: JobId,
    lease: Arc<JobLease>,
    cancel: CancelToken,
    events: Receiver<GenerationEvent>,
    thread: JoinHandle<GenerationReport>,
}

impl GenerationHandle {
    pub fn id(&self) -> JobId {
        self.id
    }

    /// Weak reference that dies with this handle.
    pub(crate) fn lease(&self) -> Weak<JobLease> {
        Arc::downgrade(&self.lease)
    }

    /// Request cancellation at the next batch boundary.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Token that cancels this run, e.g. for a signal handler.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Event stream; closes after the terminal event.
    pub fn events(&self) -> &Receiver<GenerationEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the run to end and take its report.
    pub fn join(self) -> GenerationReport {
        match self.thread.join() {
            Ok(report) => report,
            Err(payload) => GenerationReport {
                new: SequenceSet::new(),
                status: GenerationStatus::Failed(format!(
                    "generation thread panicked: {}",
                    panic_message(&payload)
                )),
                evaluated: 0,
                universe: 0,
                job: Some(self.id),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolSet;

    fn seq(text: &str) -> Sequence {
        Sequence::parse(text).unwrap()
    }

    fn run(
        base: &SequenceSet,
        selector: &PositionSelector,
        config: GeneratorConfig,
        cancel: &CancelToken,
    ) -> (GenerationReport, Vec<GenerationEvent>) {
        let mut events = Vec::new();
        let report = Generator::new(config).run(base, selector, cancel, &mut |e| events.push(e));
        (report, events)
    }

    fn small_selector() -> PositionSelector {
        // 3 x 2 x 1... = 6 candidates
        let mut selector = PositionSelector::uniform(SymbolSet::only(Symbol::Win));
        selector.set(0, SymbolSet::ALL);
        selector.set(1, SymbolSet::FAVORABLE);
        selector
    }

    #[test]
    fn test_universe_iter_sorted_and_complete() {
        let all: Vec<Sequence> = UniverseIter::new(&small_selector()).collect();
        assert_eq!(all.len(), 6);
        let mut sorted = all.clone();
        sorted.sort();
        assert_eq!(all, sorted);
        assert_eq!(all[0].to_string(), "01333333333333");
        assert_eq!(all[5].to_string(), "33333333333333");
    }

    #[test]
    fn test_all_favorable_from_empty_base() {
        let selector = PositionSelector::uniform(SymbolSet::FAVORABLE);
        let (report, events) = run(
            &SequenceSet::new(),
            &selector,
            GeneratorConfig::default(),
            &CancelToken::new(),
        );
        assert!(report.completed());
        assert_eq!(report.new.len(), 16_384);
        assert_eq!(report.evaluated, 16_384);
        assert_eq!(events.last(), Some(&GenerationEvent::Done(16_384)));
    }

    #[test]
    fn test_single_candidate_already_in_base() {
        let base: SequenceSet = vec![seq("33333333333333")].into_iter().collect();
        let selector = PositionSelector::uniform(SymbolSet::only(Symbol::Win));
        let (report, events) = run(&base, &selector, GeneratorConfig::default(), &CancelToken::new());
        assert!(report.completed());
        assert!(report.new.is_empty());
        assert_eq!(events.last(), Some(&GenerationEvent::Done(0)));
    }

    #[test]
    fn test_novelty_excludes_base_members() {
        let base: SequenceSet = vec![seq("01333333333333"), seq("00000000000000")]
            .into_iter()
            .collect();
        let (report, _) = run(
            &base,
            &small_selector(),
            GeneratorConfig::default(),
            &CancelToken::new(),
        );
        assert_eq!(report.new.len(), 5);
        assert!(!report.new.contains(&seq("01333333333333")));
    }

    #[test]
    fn test_events_per_batch() {
        let (report, events) = run(
            &SequenceSet::new(),
            &small_selector(),
            GeneratorConfig::default().with_batch_size(4),
            &CancelToken::new(),
        );
        assert!(report.completed());
        assert_eq!(
            events,
            vec![
                GenerationEvent::Progress(4.0 / 6.0 * 100.0),
                GenerationEvent::Partial(4),
                GenerationEvent::Progress(100.0),
                GenerationEvent::Partial(6),
                GenerationEvent::Done(6),
            ]
        );
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[test]
    fn test_cancel_before_start() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let (report, events) = run(
            &SequenceSet::new(),
            &small_selector(),
            GeneratorConfig::default(),
            &cancel,
        );
        assert_eq!(report.status, GenerationStatus::Cancelled);
        assert!(report.new.is_empty());
        assert_eq!(events, vec![GenerationEvent::Cancelled(0)]);
    }

    #[test]
    fn test_cancel_honoured_at_batch_boundary() {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let mut events = Vec::new();
        let report = Generator::new(GeneratorConfig::default().with_batch_size(2)).run(
            &SequenceSet::new(),
            &small_selector(),
            &cancel,
            &mut |e| {
                if matches!(e, GenerationEvent::Partial(_)) {
                    token.cancel();
                }
                events.push(e);
            },
        );
        assert!(!report.completed());
        assert_eq!(report.new.len(), 2);
        assert_eq!(report.evaluated, 2);
        assert_eq!(events.last(), Some(&GenerationEvent::Cancelled(2)));
    }

    #[test]
    fn test_candidate_limit_reports_error_with_partial() {
        let (report, events) = run(
            &SequenceSet::new(),
            &small_selector(),
            GeneratorConfig::default().with_max_new_candidates(3),
            &CancelToken::new(),
        );
        assert!(matches!(report.status, GenerationStatus::Failed(_)));
        assert_eq!(report.new.len(), 3);
        assert!(matches!(events.last(), Some(GenerationEvent::Error(_))));
    }

    #[test]
    fn test_background_job() {
        let base = Arc::new(SequenceSet::new());
        let handle = GenerationJob::spawn(
            base,
            small_selector(),
            GeneratorConfig::default().with_batch_size(1),
        );
        let id = handle.id();
        let events: Vec<GenerationEvent> = handle.events().iter().collect();
        let report = handle.join();

        assert!(report.completed());
        assert_eq!(report.job, Some(id));
        assert_eq!(report.new.len(), 6);
        assert_eq!(events.last(), Some(&GenerationEvent::Done(6)));
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[test]
    fn test_job_ids_are_distinct() {
        let spawn = || {
            GenerationJob::spawn(
                Arc::new(SequenceSet::new()),
                small_selector(),
                GeneratorConfig::default(),
            )
        };
        let (a, b) = (spawn(), spawn());
        assert_ne!(a.id(), b.id());
        assert_ne!(a.join().job, b.join().job);

        let (inline, _) = run(
            &SequenceSet::new(),
            &small_selector(),
            GeneratorConfig::default(),
            &CancelToken::new(),
        );
        assert_eq!(inline.job, None);
    }

    #[test]
    fn test_dropping_handle_cancels_job() {
        let handle = GenerationJob::spawn(
            Arc::new(SequenceSet::new()),
            PositionSelector::all(),
            GeneratorConfig::default().with_batch_size(1),
        );
        let token = handle.cancel_token();
        let lease = handle.lease();
        assert!(!token.is_cancelled());

        drop(handle);
        assert!(token.is_cancelled());
        assert!(lease.upgrade().is_none());
    }
}
