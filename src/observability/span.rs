//! Run correlation.
//!
//! Every event of a bootstrap run is emitted inside a `bootstrap` span that
//! carries a UUID v4 run ID, so interleaved container logs can be grouped.

use tracing::Span;
use uuid::Uuid;

/// Identifier of a single bootstrap run.
pub fn new_run_id() -> Uuid {
    Uuid::new_v4()
}

/// Root span for a bootstrap run.
pub fn run_span(run_id: Uuid) -> Span {
    tracing::info_span!("bootstrap", run_id = %run_id)
}
