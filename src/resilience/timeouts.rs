//! Timeout enforcement.
//!
//! Wraps probe attempts and preparation steps with an optional deadline.
//! Timeout errors are distinct from the wrapped operation's own errors.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

/// The wrapped operation did not finish in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("deadline of {0:?} exceeded")]
pub struct DeadlineExceeded(pub Duration);

/// Run `fut` to completion, or until `limit` elapses when one is given.
pub async fn within<F>(limit: Option<Duration>, fut: F) -> Result<F::Output, DeadlineExceeded>
where
    F: Future,
{
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| DeadlineExceeded(limit)),
        None => Ok(fut.await),
    }
}
