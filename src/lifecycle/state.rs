//! Bootstrap phase state machine.
//!
//! # States
//! ```text
//! INIT → CONFIG_RESOLVED → WAITING_FOR_DEPENDENCY → DEPENDENCY_READY
//!      → RUNNING_STEPS → STEPS_COMPLETE → HANDED_OFF
//!
//! any phase → FAILED(phase, cause)
//! ```
//!
//! # Design Decisions
//! - Single path, no cycles: only the successor phase is accepted
//! - Every transition and the terminal failure are logged with the phase
//! - A restart re-enters at INIT; there is no resume

use std::fmt;
use std::time::Instant;

use serde::Serialize;

use crate::observability::metrics;

/// Bootstrap phases in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Init,
    ConfigResolved,
    WaitingForDependency,
    DependencyReady,
    RunningSteps,
    StepsComplete,
    HandedOff,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Init => "INIT",
            Phase::ConfigResolved => "CONFIG_RESOLVED",
            Phase::WaitingForDependency => "WAITING_FOR_DEPENDENCY",
            Phase::DependencyReady => "DEPENDENCY_READY",
            Phase::RunningSteps => "RUNNING_STEPS",
            Phase::StepsComplete => "STEPS_COMPLETE",
            Phase::HandedOff => "HANDED_OFF",
        }
    }

    /// The only phase allowed to follow this one.
    pub fn successor(&self) -> Option<Phase> {
        match self {
            Phase::Init => Some(Phase::ConfigResolved),
            Phase::ConfigResolved => Some(Phase::WaitingForDependency),
            Phase::WaitingForDependency => Some(Phase::DependencyReady),
            Phase::DependencyReady => Some(Phase::RunningSteps),
            Phase::RunningSteps => Some(Phase::StepsComplete),
            Phase::StepsComplete => Some(Phase::HandedOff),
            Phase::HandedOff => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks the current phase of a single bootstrap run.
#[derive(Debug)]
pub struct PhaseTracker {
    current: Phase,
    entered: Instant,
    started: Instant,
}

impl PhaseTracker {
    pub fn new() -> Self {
        let now = Instant::now();
        tracing::info!(phase = %Phase::Init, "Bootstrap starting");
        Self {
            current: Phase::Init,
            entered: now,
            started: now,
        }
    }

    pub fn current(&self) -> Phase {
        self.current
    }

    /// Move to `next`.
    ///
    /// # Panics
    /// Panics if `next` is not the successor of the current phase; phase
    /// order is fixed at compile time by the orchestrator.
    pub fn advance(&mut self, next: Phase) {
        assert_eq!(
            self.current.successor(),
            Some(next),
            "invalid phase transition {} -> {}",
            self.current,
            next
        );

        let now = Instant::now();
        tracing::info!(
            from = %self.current,
            phase = %next,
            phase_ms = now.duration_since(self.entered).as_millis() as u64,
            total_ms = now.duration_since(self.started).as_millis() as u64,
            "Phase transition"
        );
        metrics::record_phase(next);

        self.current = next;
        self.entered = now;
    }

    /// Log the terminal failure of the current phase.
    pub fn fail(&self, cause: &dyn fmt::Display) {
        tracing::error!(
            phase = "FAILED",
            failed_phase = %self.current,
            cause = %cause,
            total_ms = self.started.elapsed().as_millis() as u64,
            "Bootstrap failed"
        );
        metrics::record_failure(self.current);
    }
}

impl Default for PhaseTracker {
    fn default() -> Self {
        Self::new()
    }
}
