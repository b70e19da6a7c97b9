//! Preparation step contract.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Whether a step may safely run more than once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Idempotency {
    Idempotent,
    NonIdempotent,
}

/// Why a step failed.
#[derive(Debug, Error)]
pub enum StepError {
    /// The external command could not be started.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external command ran and reported failure.
    #[error("'{program}' exited with {}", exit_description(.code))]
    Exited { program: String, code: Option<i32> },

    /// The step exceeded its deadline.
    #[error("step timed out after {0:?}")]
    TimedOut(Duration),

    /// Local filesystem preparation failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Any other failure reported by a step.
    #[error("{0}")]
    Failed(String),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (killed by signal)".to_string(),
    }
}

/// An ordered, named unit of preparation work.
///
/// Steps are expected to be idempotent; the sequencer relies on this and
/// does not verify it.
#[async_trait]
pub trait PreparationStep: Send + Sync {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    fn idempotency(&self) -> Idempotency {
        Idempotency::Idempotent
    }

    /// Human readable description of what runs, for planning output.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    async fn run(&self) -> Result<(), StepError>;
}
