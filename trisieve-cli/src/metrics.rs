// Trisieve CLI - Prometheus metrics definitions
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Prometheus metrics for Trisieve runs.
//!
//! The CLI is short-lived, so metrics are not served: they are collected
//! during a command and written in the text exposition format on exit when
//! `--metrics-out` is given.

use crate::error::CliError;
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_gauge_vec, Counter,
    CounterVec, Encoder, Gauge, GaugeVec, TextEncoder,
};
use std::path::Path;
use trisieve::{GenerationEvent, GenerationReport, GenerationStatus, MysticOutcome};

lazy_static! {
    // ============================================================
    // Generation
    // ============================================================

    /// Candidates evaluated by the generator.
    pub static ref CANDIDATES_EVALUATED_TOTAL: Counter = register_counter!(
        "trisieve_candidates_evaluated_total",
        "Candidates of the universe evaluated by the generator"
    ).unwrap();

    /// New candidates found by the last generation run.
    pub static ref NEW_CANDIDATES: Gauge = register_gauge!(
        "trisieve_new_candidates",
        "New candidates found by the last generation run"
    ).unwrap();

    /// Size of the universe of the last generation run.
    pub static ref UNIVERSE_SIZE: Gauge = register_gauge!(
        "trisieve_universe_size",
        "Size of the Cartesian product of the position selector"
    ).unwrap();

    /// Generation progress (0-100).
    pub static ref GENERATION_PROGRESS: Gauge = register_gauge!(
        "trisieve_generation_progress_percent",
        "Progress of the running generation (0-100)"
    ).unwrap();

    /// Generation runs by terminal status.
    pub static ref GENERATION_RUNS_TOTAL: CounterVec = register_counter_vec!(
        "trisieve_generation_runs_total",
        "Generation runs by terminal status",
        &["status"]
    ).unwrap();

    // ============================================================
    // Filters
    // ============================================================

    /// Working set size after each stage.
    pub static ref WORKING_SET_SIZE: GaugeVec = register_gauge_vec!(
        "trisieve_working_set_size",
        "Working set size after a filter stage",
        &["stage"]
    ).unwrap();

    /// Wall time of each stage in seconds.
    pub static ref STAGE_DURATION_SECONDS: GaugeVec = register_gauge_vec!(
        "trisieve_stage_duration_seconds",
        "Wall time of a stage in seconds",
        &["stage"]
    ).unwrap();
}

fn status_label(status: &GenerationStatus) -> &'static str {
    match status {
        GenerationStatus::Completed => "done",
        GenerationStatus::Cancelled => "cancelled",
        GenerationStatus::Failed(_) => "error",
    }
}

/// Update live gauges from a generator event.
pub fn record_event(event: &GenerationEvent) {
    match event {
        GenerationEvent::Progress(p) => GENERATION_PROGRESS.set(*p),
        GenerationEvent::Partial(n) => NEW_CANDIDATES.set(*n as f64),
        _ => {}
    }
}

/// Record the outcome of a generation run.
pub fn record_generation(report: &GenerationReport) {
    CANDIDATES_EVALUATED_TOTAL.inc_by(report.evaluated as f64);
    NEW_CANDIDATES.set(report.new.len() as f64);
    UNIVERSE_SIZE.set(report.universe as f64);
    GENERATION_RUNS_TOTAL
        .with_label_values(&[status_label(&report.status)])
        .inc();
}

/// Record the size and duration of a stage.
pub fn record_stage(stage: &str, size: usize, seconds: f64) {
    WORKING_SET_SIZE.with_label_values(&[stage]).set(size as f64);
    STAGE_DURATION_SECONDS.with_label_values(&[stage]).set(seconds);
}

/// Record the per-stage sizes of an optimizer run.
pub fn record_mystic(outcome: &MysticOutcome) {
    WORKING_SET_SIZE
        .with_label_values(&["mystic_input"])
        .set(outcome.input as f64);
    WORKING_SET_SIZE
        .with_label_values(&["mystic_anchor"])
        .set(outcome.after_anchor as f64);
    WORKING_SET_SIZE
        .with_label_values(&["mystic_tolerance"])
        .set(outcome.after_tolerance as f64);
    WORKING_SET_SIZE
        .with_label_values(&["mystic_shrink"])
        .set(outcome.ranked.len() as f64);
}

/// Encode all metrics to Prometheus text format.
pub fn encode_metrics() -> Result<String, CliError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| CliError::InvalidArgument(e.to_string()))
}

/// Write the text exposition to `path`.
pub fn write_metrics(path: &Path) -> Result<(), CliError> {
    std::fs::write(path, encode_metrics()?)?;
    Ok(())
}
