//! Dependency readiness subsystem.
//!
//! # Data Flow
//! ```text
//! DependencyConfig
//!     → probe.rs (DependencyTarget + TCP or HTTP probe)
//!     → readiness.rs (attempt → sleep → deadline check → attempt …)
//!     → Ready | Unavailable | Cancelled
//! ```
//!
//! # Design Decisions
//! - Probes are read-only and scoped to a single attempt
//! - Attempt failures are transient; only the overall deadline is fatal
//! - The wait is the only phase that may block indefinitely

pub mod probe;
pub mod readiness;

pub use probe::{probe_from_config, DependencyTarget, HttpProbe, Probe, ProbeError, TcpProbe};
pub use readiness::{ReadinessError, ReadinessProber, Ready};
