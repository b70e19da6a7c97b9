//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Wait for dependency → Run steps → Hand off
//!
//! State (state.rs):
//!     INIT → … → HANDED_OFF, or FAILED(phase, cause)
//!
//! Shutdown (shutdown.rs):
//!     Trigger → every cancellable phase observes the reason
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: phases never run concurrently or out of order
//! - Fail fast: any phase error is terminal
//! - Cancellation is checked at every phase boundary and raced inside
//!   the probe loop and the step runner

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{Shutdown, ShutdownReason, ShutdownSignal};
pub use startup::{Bootstrap, Collaborators, SystemCollaborators};
pub use state::{Phase, PhaseTracker};
