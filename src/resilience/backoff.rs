//! Retry delays for the readiness loop.

use std::time::Duration;

use rand::Rng;

use crate::config::{BackoffKind, DependencyConfig};

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Delay strategy between failed probe attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Sleep the same interval after every failure.
    Fixed(Duration),
    /// Double the delay after every failure, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

impl RetryPolicy {
    pub fn from_config(config: &DependencyConfig) -> Self {
        match config.backoff {
            BackoffKind::Fixed => RetryPolicy::Fixed(config.interval()),
            BackoffKind::Exponential => RetryPolicy::Exponential {
                base: config.interval(),
                max: config.max_interval(),
            },
        }
    }

    /// Delay after the `failures`-th consecutive failure (1-based).
    pub fn delay(&self, failures: u32) -> Duration {
        match *self {
            RetryPolicy::Fixed(interval) => interval,
            RetryPolicy::Exponential { base, max } => calculate_backoff(
                failures.max(1),
                base.as_millis() as u64,
                max.as_millis() as u64,
            ),
        }
    }
}
