//! Preparation subsystem.
//!
//! # Data Flow
//! ```text
//! Statically declared steps (apply-migrations, materialize-assets)
//!     → sequencer.rs (strict order, one at a time)
//!     → step.rs contract: run() → Ok | StepError
//!     → StepRecord per execution (name, duration, outcome)
//!     → SequenceReport | StepFailure | Cancelled
//! ```
//!
//! # Design Decisions
//! - Steps are forward-only and idempotent, not transactional
//! - First failure aborts; no rollback of earlier steps
//! - External commands are opaque; only their exit status matters

pub mod command;
pub mod sequencer;
pub mod step;

pub use command::{CommandStep, APPLY_MIGRATIONS, MATERIALIZE_ASSETS};
pub use sequencer::{
    BootstrapSequencer, SequenceError, SequenceReport, StepFailure, StepOutcome, StepRecord,
};
pub use step::{Idempotency, PreparationStep, StepError};
