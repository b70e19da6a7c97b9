//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals into shutdown triggers
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are registered before the listener task is spawned, so a
//!   registration failure is reported to the caller
//! - Repeated signals re-trigger; a spawned application sees the latest one

use tokio::task::JoinHandle;

use crate::lifecycle::shutdown::{Shutdown, ShutdownReason};

/// Listen for termination signals and trigger `shutdown` on each one.
#[cfg(unix)]
pub fn listen(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            let reason = tokio::select! {
                Some(()) = sigterm.recv() => ShutdownReason::Terminate,
                Some(()) = sigint.recv() => ShutdownReason::Interrupt,
                else => break,
            };
            tracing::warn!(signal = %reason, "Shutdown signal received");
            shutdown.trigger(reason);
        }
    }))
}

/// Listen for Ctrl-C and trigger `shutdown` on each one.
#[cfg(not(unix))]
pub fn listen(shutdown: Shutdown) -> std::io::Result<JoinHandle<()>> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!(signal = %ShutdownReason::Interrupt, "Shutdown signal received");
            shutdown.trigger(ShutdownReason::Interrupt);
        }
    }))
}
