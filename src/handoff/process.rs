//! Transfer of control to the application process.
//!
//! # Responsibilities
//! - Exec: replace the orchestrator's process image (unix)
//! - Spawn: run the application as a child, forward the first shutdown
//!   signal, and report the child's exit code
//!
//! # Design Decisions
//! - Exec leaves no supervisory process behind
//! - In spawn mode the orchestrator never outlives the child
//! - Death by signal N is reported as 128 + N, like a shell

use std::process::{ExitStatus, Stdio};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::process::{Child, Command};

use crate::config::HandoffMode;
use crate::handoff::launch::LaunchSpec;
use crate::lifecycle::shutdown::{ShutdownReason, ShutdownSignal};

/// The application ran and exited (spawn mode only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HandoffOutcome {
    pub exit_code: i32,
}

impl HandoffOutcome {
    /// Exit status for the orchestrator itself, truncated to a byte.
    pub fn process_exit_code(&self) -> u8 {
        (self.exit_code & 0xff) as u8
    }
}

/// The application could not be started.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("application command is empty")]
    EmptyCommand,

    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to exec '{program}': {source}")]
    Exec {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to wait for application: {0}")]
    Wait(#[source] std::io::Error),
}

/// Starts the long-running application.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Hand control to the application described by `spec`.
    ///
    /// Exec-style launchers do not return on success.
    async fn launch(
        &self,
        spec: &LaunchSpec,
        shutdown: ShutdownSignal,
    ) -> Result<HandoffOutcome, HandoffError>;
}

/// Launches the application as an OS process.
#[derive(Debug, Clone, Copy)]
pub struct ProcessHandoff {
    mode: HandoffMode,
}

impl ProcessHandoff {
    pub fn new(mode: HandoffMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl Launcher for ProcessHandoff {
    async fn launch(
        &self,
        spec: &LaunchSpec,
        shutdown: ShutdownSignal,
    ) -> Result<HandoffOutcome, HandoffError> {
        if spec.program.trim().is_empty() {
            return Err(HandoffError::EmptyCommand);
        }

        match self.mode {
            HandoffMode::Exec => exec(spec),
            HandoffMode::Spawn => spawn_and_wait(spec, shutdown).await,
        }
    }
}

#[cfg(unix)]
fn exec(spec: &LaunchSpec) -> Result<HandoffOutcome, HandoffError> {
    use std::os::unix::process::CommandExt;

    tracing::info!(command = %spec, "Replacing process image");
    let source = std::process::Command::new(&spec.program)
        .args(&spec.args)
        .exec();

    Err(HandoffError::Exec {
        program: spec.program.clone(),
        source,
    })
}

#[cfg(not(unix))]
fn exec(spec: &LaunchSpec) -> Result<HandoffOutcome, HandoffError> {
    Err(HandoffError::Exec {
        program: spec.program.clone(),
        source: std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "process image replacement requires unix",
        ),
    })
}

async fn spawn_and_wait(
    spec: &LaunchSpec,
    shutdown: ShutdownSignal,
) -> Result<HandoffOutcome, HandoffError> {
    let mut child = Command::new(&spec.program)
        .args(&spec.args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| HandoffError::Spawn {
            program: spec.program.clone(),
            source,
        })?;

    tracing::info!(command = %spec, pid = child.id(), "Application started");

    let mut forwarded = false;
    let status = loop {
        tokio::select! {
            status = child.wait() => break status.map_err(HandoffError::Wait)?,
            reason = shutdown.cancelled(), if !forwarded => {
                forwarded = true;
                forward(&mut child, reason);
            }
        }
    };

    let outcome = HandoffOutcome {
        exit_code: exit_code(status),
    };
    tracing::info!(
        exit_code = outcome.exit_code,
        success = status.success(),
        "Application exited"
    );
    Ok(outcome)
}

#[cfg(unix)]
fn forward(child: &mut Child, reason: ShutdownReason) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let signal = match reason {
        ShutdownReason::Interrupt => Signal::SIGINT,
        ShutdownReason::Terminate | ShutdownReason::Requested => Signal::SIGTERM,
    };

    tracing::info!(pid, signal = %signal, "Forwarding signal to application");
    if let Err(e) = kill(Pid::from_raw(pid as i32), signal) {
        tracing::error!(pid, error = %e, "Failed to forward signal");
    }
}

#[cfg(not(unix))]
fn forward(child: &mut Child, reason: ShutdownReason) {
    tracing::info!(signal = %reason, "Stopping application");
    if let Err(e) = child.start_kill() {
        tracing::error!(error = %e, "Failed to stop application");
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
