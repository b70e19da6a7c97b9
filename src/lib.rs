//! Container bootstrap orchestrator library.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod handoff;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::schema::BootstrapConfig;
pub use error::BootstrapError;
pub use handoff::HandoffOutcome;
pub use lifecycle::{Bootstrap, Shutdown, SystemCollaborators};
