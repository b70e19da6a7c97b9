//! Container bootstrap orchestrator
//!
//! Prepares a web application's runtime environment and hands off to it.
//!
//! # Architecture Overview
//!
//! ```text
//!   environment ──▶ config ──▶ health (readiness wait)
//!                                   │
//!                                   ▼
//!                            bootstrap (steps: migrations → assets)
//!                                   │
//!                                   ▼
//!                            handoff (exec or spawn application)
//!
//!   Cross-cutting: lifecycle (phases, shutdown, signals),
//!                  observability (logs, metrics, run span),
//!                  resilience (backoff, deadlines)
//! ```
//!
//! Takes no command-line arguments; everything comes from the environment.

use std::process::ExitCode;

use bootstrap_orchestrator::config::ProcessEnv;
use bootstrap_orchestrator::lifecycle::{signals, Bootstrap, Shutdown, SystemCollaborators};
use bootstrap_orchestrator::observability::logging::{self, LogFormat};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    logging::init(LogFormat::from_env());

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "bootstrap-orchestrator starting");

    let shutdown = Shutdown::new();
    if let Err(e) = signals::listen(shutdown.clone()) {
        tracing::warn!(error = %e, "Signal handlers unavailable; shutdown signals will not be observed");
    }

    match Bootstrap::new(SystemCollaborators)
        .run(&ProcessEnv, shutdown.subscribe())
        .await
    {
        Ok(outcome) => ExitCode::from(outcome.process_exit_code()),
        Err(e) => {
            tracing::info!(failed_phase = %e.phase(), exit_code = e.exit_code(), "Exiting");
            ExitCode::from(e.exit_code())
        }
    }
}
