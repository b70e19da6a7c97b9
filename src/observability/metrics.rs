//! Metrics collection.
//!
//! # Metrics
//! - `bootstrap_phase_transitions_total` (counter): phases entered, by phase
//! - `bootstrap_failures_total` (counter): terminal failures, by phase
//! - `bootstrap_probe_attempts_total` (counter): readiness attempts, by outcome
//! - `bootstrap_step_duration_seconds` (histogram): step latency, by step and outcome
//!
//! # Design Decisions
//! - Uses the `metrics` facade; nothing is recorded without a recorder
//! - Low-overhead metric updates (atomic operations)

use std::time::Duration;

use metrics::{counter, histogram};

use crate::lifecycle::state::Phase;

/// Record entry into a phase.
pub fn record_phase(phase: Phase) {
    counter!("bootstrap_phase_transitions_total", "phase" => phase.as_str()).increment(1);
}

/// Record a terminal failure.
pub fn record_failure(phase: Phase) {
    counter!("bootstrap_failures_total", "phase" => phase.as_str()).increment(1);
}

/// Record one readiness probe attempt.
pub fn record_probe_attempt(target: &str, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    counter!(
        "bootstrap_probe_attempts_total",
        "target" => target.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a finished preparation step.
pub fn record_step(step: &str, duration: Duration, success: bool) {
    let outcome = if success { "success" } else { "failure" };
    histogram!(
        "bootstrap_step_duration_seconds",
        "step" => step.to_string(),
        "outcome" => outcome
    )
    .record(duration.as_secs_f64());
}
