//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All phases produce:
//!     → logging.rs (structured log events, JSON or text)
//!     → metrics.rs (counters, histograms via the metrics facade)
//!     → span.rs (a `bootstrap` span carrying the run ID)
//!
//! Consumers:
//!     → Container log collection (stdout)
//!     → Any metrics recorder installed by the embedding binary
//! ```
//!
//! # Design Decisions
//! - One log line per phase transition and per step outcome
//! - Run ID flows through every event of a bootstrap run
//! - Metrics are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
pub mod span;
