//! Process handoff subsystem.
//!
//! # Data Flow
//! ```text
//! ApplicationConfig
//!     → launch.rs (LaunchSpec: program + args)
//!     → process.rs
//!         exec  → process image replaced, never returns
//!         spawn → child runs; signals forwarded; exit code returned
//! ```
//!
//! # Design Decisions
//! - Only reached after every preparation step succeeded
//! - Start failures are distinct from preparation failures (own exit code)

pub mod launch;
pub mod process;

pub use launch::LaunchSpec;
pub use process::{HandoffError, HandoffOutcome, Launcher, ProcessHandoff};
