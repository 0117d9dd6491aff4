//! Structured observability hooks for experiment runs and analyses.
//!
//! - Run-scoped tracing spans via the [`RunSpan`] RAII guard
//! - `emit_*` functions for lifecycle events, each tagged with an `event` field

use tracing::{debug, info, warn};

/// RAII guard that enters a run-scoped tracing span.
///
/// ```ignore
/// let _span = RunSpan::enter("3f0c...");
/// // everything logged here carries run_id
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: &str) -> Self {
        let span = tracing::info_span!("conjoint.run", run_id = %run_id);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_run_started(run_id: &str, agents: usize, alternatives: usize) {
    info!(
        event = "run.started",
        run_id = %run_id,
        agents = agents,
        alternatives = alternatives,
    );
}

pub fn emit_tasks_generated(tasks: usize, holdouts: usize, repeats: usize) {
    info!(
        event = "tasks.generated",
        tasks = tasks,
        holdouts = holdouts,
        repeats = repeats,
    );
}

pub fn emit_responses_collected(responses: usize, none_count: usize) {
    info!(
        event = "responses.collected",
        responses = responses,
        none_count = none_count,
    );
}

pub fn emit_analysis_started(responses: usize, segments: usize) {
    info!(
        event = "analysis.started",
        responses = responses,
        segments = segments,
    );
}

pub fn emit_analysis_finished(duration_ms: u64, has_wtp: bool) {
    info!(
        event = "analysis.finished",
        duration_ms = duration_ms,
        has_wtp = has_wtp,
    );
}

/// Emit event: an MNL model was fitted for `scope` ("overall" or a segment id).
pub fn emit_model_fitted(scope: &str, observations: usize, log_likelihood: f64) {
    debug!(
        event = "mnl.fitted",
        scope = %scope,
        observations = observations,
        log_likelihood = log_likelihood,
    );
}

/// Emit event: fit skipped because `scope` had too few observations.
pub fn emit_fit_skipped(scope: &str, observations: usize, required: usize) {
    debug!(
        event = "mnl.skipped",
        scope = %scope,
        observations = observations,
        required = required,
    );
}

/// Emit event: segment membership recovered by parsing agent ids (warning level).
pub fn emit_legacy_segment_resolution(responses: usize) {
    warn!(
        event = "segments.legacy_resolution",
        responses = responses,
        "responses lack segmentId; segment parsed from agent id suffix, ambiguous if segment ids end in _<digits>"
    );
}
