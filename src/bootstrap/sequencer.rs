//! Ordered execution of preparation steps.
//!
//! # Responsibilities
//! - Run steps strictly in declaration order, one at a time
//! - Record every execution (name, duration, outcome) before moving on
//! - Stop at the first failure; never roll back earlier steps
//! - Stop promptly on shutdown

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::bootstrap::step::{Idempotency, PreparationStep, StepError};
use crate::lifecycle::shutdown::{ShutdownReason, ShutdownSignal};
use crate::observability::metrics;
use crate::resilience::within;

/// Outcome of a single step execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    Failed(String),
    /// Interrupted by shutdown while running.
    Cancelled,
}

/// Structured record of one step execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepRecord {
    pub name: String,
    pub duration_ms: u64,
    pub outcome: StepOutcome,
}

/// Every step ran and succeeded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    pub records: Vec<StepRecord>,
}

/// A step failed; later steps did not run.
#[derive(Debug, Error)]
#[error("step '{step}' failed: {cause}")]
pub struct StepFailure {
    /// Name of the failing step.
    pub step: String,
    #[source]
    pub cause: StepError,
    /// Records of every step executed, the failing one last.
    pub records: Vec<StepRecord>,
}

/// Why the sequence did not complete.
#[derive(Debug, Error)]
pub enum SequenceError {
    #[error(transparent)]
    Failed(#[from] StepFailure),

    #[error("step '{step}' cancelled by {reason}")]
    Cancelled {
        step: String,
        reason: ShutdownReason,
        records: Vec<StepRecord>,
    },
}

/// Runs preparation steps in order.
#[derive(Debug, Clone, Default)]
pub struct BootstrapSequencer {
    step_timeout: Option<Duration>,
}

impl BootstrapSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any step that runs longer than `timeout`.
    pub fn with_step_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.step_timeout = timeout;
        self
    }

    pub async fn run(
        &self,
        steps: &[Box<dyn PreparationStep>],
        shutdown: &ShutdownSignal,
    ) -> Result<SequenceReport, SequenceError> {
        let mut records = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let name = step.name().to_string();

            if let Some(reason) = shutdown.reason() {
                return Err(SequenceError::Cancelled {
                    step: name,
                    reason,
                    records,
                });
            }

            if step.idempotency() == Idempotency::NonIdempotent {
                tracing::warn!(step = %name, "Step is not declared idempotent; a restart will repeat it");
            }

            tracing::info!(
                step = %name,
                position = index + 1,
                total = steps.len(),
                command = %step.describe(),
                "Step starting"
            );

            let started = Instant::now();
            let result = tokio::select! {
                res = within(self.step_timeout, step.run()) => {
                    res.unwrap_or_else(|e| Err(StepError::TimedOut(e.0)))
                }
                reason = shutdown.cancelled() => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    tracing::warn!(
                        step = %name,
                        signal = %reason,
                        duration_ms,
                        outcome = "cancelled",
                        "Step finished"
                    );
                    records.push(StepRecord {
                        name: name.clone(),
                        duration_ms,
                        outcome: StepOutcome::Cancelled,
                    });
                    return Err(SequenceError::Cancelled { step: name, reason, records });
                }
            };
            let duration = started.elapsed();
            metrics::record_step(&name, duration, result.is_ok());

            let outcome = match &result {
                Ok(()) => StepOutcome::Succeeded,
                Err(e) => StepOutcome::Failed(e.to_string()),
            };
            records.push(StepRecord {
                name: name.clone(),
                duration_ms: duration.as_millis() as u64,
                outcome,
            });

            match result {
                Ok(()) => {
                    tracing::info!(
                        step = %name,
                        duration_ms = duration.as_millis() as u64,
                        outcome = "succeeded",
                        "Step finished"
                    );
                }
                Err(cause) => {
                    tracing::error!(
                        step = %name,
                        duration_ms = duration.as_millis() as u64,
                        outcome = "failed",
                        error = %cause,
                        skipped = steps.len() - index - 1,
                        "Step finished"
                    );
                    return Err(StepFailure {
                        step: name,
                        cause,
                        records,
                    }
                    .into());
                }
            }
        }

        Ok(SequenceReport { records })
    }
}
