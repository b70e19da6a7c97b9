//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Readiness attempt / preparation step:
//!     → timeouts.rs (bound the attempt or step with a deadline)
//!     → On probe failure: backoff.rs (delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Every probe attempt has a deadline; steps have one when configured
//! - Fixed delay by default, exponential with jitter on request
//! - Delays never exceed the remaining readiness budget

pub mod backoff;
pub mod timeouts;

pub use backoff::{calculate_backoff, RetryPolicy};
pub use timeouts::{within, DeadlineExceeded};
