//! Blocking readiness wait.
//!
//! # Responsibilities
//! - Probe the dependency until it answers
//! - Sleep between attempts according to the retry policy
//! - Enforce the optional overall deadline
//! - Stop promptly on shutdown, including mid-sleep
//!
//! # Design Decisions
//! - No timeout means retry forever (availability over fast failure)
//! - The deadline is checked after every sleep; sleeps and single attempts
//!   are capped to the remaining budget so the loop never overshoots it
//! - Uses `tokio::time::Instant` so paused-clock tests see exact timings

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::health::probe::{DependencyTarget, Probe, ProbeError};
use crate::lifecycle::shutdown::{ShutdownReason, ShutdownSignal};
use crate::observability::metrics;
use crate::resilience::{within, RetryPolicy};

/// The dependency answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ready {
    /// Attempts made, including the successful one.
    pub attempts: u32,
    /// Time since the first attempt started.
    #[serde(with = "duration_ms")]
    pub elapsed: Duration,
}

/// Why the readiness wait ended without the dependency answering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadinessError {
    /// The overall deadline passed.
    #[error("dependency {target} unavailable after {elapsed:?} ({attempts} attempts): {last_error}")]
    Unavailable {
        target: DependencyTarget,
        elapsed: Duration,
        attempts: u32,
        last_error: ProbeError,
    },

    /// Shutdown was requested while waiting.
    #[error("readiness wait cancelled by {reason} after {attempts} attempts")]
    Cancelled {
        reason: ShutdownReason,
        attempts: u32,
    },
}

/// Waits for a dependency to become reachable.
pub struct ReadinessProber<'a> {
    probe: &'a dyn Probe,
    policy: RetryPolicy,
    timeout: Option<Duration>,
    attempt_timeout: Duration,
}

impl<'a> ReadinessProber<'a> {
    pub fn new(probe: &'a dyn Probe, policy: RetryPolicy) -> Self {
        Self {
            probe,
            policy,
            timeout: None,
            attempt_timeout: Duration::from_secs(2),
        }
    }

    /// Give up once `timeout` has elapsed since the first attempt.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Bound each individual attempt.
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Block until `target` answers, the deadline passes, or shutdown fires.
    pub async fn wait_until_ready(
        &self,
        target: &DependencyTarget,
        shutdown: &ShutdownSignal,
    ) -> Result<Ready, ReadinessError> {
        let started = Instant::now();
        let target_label = target.to_string();
        let mut attempts: u32 = 0;

        tracing::info!(
            target = %target,
            probe = self.probe.kind(),
            timeout_ms = self.timeout.map(|t| t.as_millis() as u64),
            "Waiting for dependency"
        );

        loop {
            if let Some(reason) = shutdown.reason() {
                return Err(ReadinessError::Cancelled { reason, attempts });
            }

            attempts += 1;
            let attempt_timeout = match self.timeout {
                Some(timeout) => self
                    .attempt_timeout
                    .min(timeout.saturating_sub(started.elapsed())),
                None => self.attempt_timeout,
            };
            let result = tokio::select! {
                res = within(Some(attempt_timeout), self.probe.check(target)) => {
                    res.unwrap_or(Err(ProbeError::TimedOut(attempt_timeout)))
                }
                reason = shutdown.cancelled() => {
                    return Err(ReadinessError::Cancelled { reason, attempts });
                }
            };
            metrics::record_probe_attempt(&target_label, result.is_ok());

            let last_error = match result {
                Ok(()) => {
                    let ready = Ready {
                        attempts,
                        elapsed: started.elapsed(),
                    };
                    tracing::info!(
                        target = %target,
                        attempts,
                        elapsed_ms = ready.elapsed.as_millis() as u64,
                        "Dependency ready"
                    );
                    return Ok(ready);
                }
                Err(e) => e,
            };

            let mut delay = self.policy.delay(attempts);
            if let Some(timeout) = self.timeout {
                delay = delay.min(timeout.saturating_sub(started.elapsed()));
            }
            tracing::warn!(
                target = %target,
                attempt = attempts,
                error = %last_error,
                retry_in_ms = delay.as_millis() as u64,
                "Dependency not ready"
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                reason = shutdown.cancelled() => {
                    return Err(ReadinessError::Cancelled { reason, attempts });
                }
            }

            if let Some(timeout) = self.timeout {
                let elapsed = started.elapsed();
                if elapsed >= timeout {
                    return Err(ReadinessError::Unavailable {
                        target: target.clone(),
                        elapsed,
                        attempts,
                        last_error,
                    });
                }
            }
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::shutdown::Shutdown;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails until `ready_on` attempts have been made.
    struct FlakyProbe {
        calls: AtomicU32,
        ready_on: Option<u32>,
    }

    impl FlakyProbe {
        fn ready_on(n: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                ready_on: Some(n),
            }
        }

        fn never() -> Self {
            Self {
                calls: AtomicU32::new(0),
                ready_on: None,
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Probe for FlakyProbe {
        fn kind(&self) -> &'static str {
            "flaky"
        }

        async fn check(&self, _target: &DependencyTarget) -> Result<(), ProbeError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            match self.ready_on {
                Some(ready_on) if n >= ready_on => Ok(()),
                _ => Err(ProbeError::Connect("connection refused".into())),
            }
        }
    }

    fn target() -> DependencyTarget {
        DependencyTarget::new("db", 5432)
    }

    const SECOND: Duration = Duration::from_millis(1000);

    #[tokio::test(start_paused = true)]
    async fn test_ready_immediately() {
        let probe = FlakyProbe::ready_on(1);
        let prober = ReadinessProber::new(&probe, RetryPolicy::Fixed(SECOND));

        let ready = prober
            .wait_until_ready(&target(), &ShutdownSignal::never())
            .await
            .unwrap();
        assert_eq!(ready.attempts, 1);
        assert_eq!(ready.elapsed, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleeps_once_per_failed_attempt() {
        // Reachable on attempt N+1 with N = 4.
        let probe = FlakyProbe::ready_on(5);
        let prober = ReadinessProber::new(&probe, RetryPolicy::Fixed(SECOND));

        let ready = prober
            .wait_until_ready(&target(), &ShutdownSignal::never())
            .await
            .unwrap();
        assert_eq!(ready.attempts, 5);
        assert_eq!(probe.calls(), 5);
        assert_eq!(ready.elapsed, 4 * SECOND);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_bounds_attempts() {
        let probe = FlakyProbe::never();
        let prober = ReadinessProber::new(&probe, RetryPolicy::Fixed(SECOND))
            .with_timeout(Some(Duration::from_millis(5000)));

        let err = prober
            .wait_until_ready(&target(), &ShutdownSignal::never())
            .await
            .unwrap_err();

        match err {
            ReadinessError::Unavailable {
                attempts,
                elapsed,
                target: t,
                ..
            } => {
                assert!(attempts <= 5, "made {attempts} attempts");
                assert_eq!(elapsed, Duration::from_millis(5000));
                assert_eq!(t, target());
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(probe.calls() <= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_capped_to_remaining_budget() {
        let probe = FlakyProbe::never();
        let prober = ReadinessProber::new(&probe, RetryPolicy::Fixed(SECOND))
            .with_timeout(Some(Duration::from_millis(2500)));

        let err = prober
            .wait_until_ready(&target(), &ShutdownSignal::never())
            .await
            .unwrap_err();
        match err {
            ReadinessError::Unavailable { attempts, elapsed, .. } => {
                assert_eq!(attempts, 3);
                assert_eq!(elapsed, Duration::from_millis(2500));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_mid_sleep() {
        let probe = FlakyProbe::never();
        let prober = ReadinessProber::new(&probe, RetryPolicy::Fixed(Duration::from_secs(60)));
        let shutdown = Shutdown::new();
        let signal = shutdown.subscribe();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.trigger(ShutdownReason::Terminate);
        });

        let started = Instant::now();
        let err = prober.wait_until_ready(&target(), &signal).await.unwrap_err();
        assert_eq!(
            err,
            ReadinessError::Cancelled {
                reason: ShutdownReason::Terminate,
                attempts: 1
            }
        );
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(probe.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_already_cancelled_makes_no_attempt() {
        let probe = FlakyProbe::ready_on(1);
        let prober = ReadinessProber::new(&probe, RetryPolicy::Fixed(SECOND));
        let shutdown = Shutdown::new();
        shutdown.trigger(ShutdownReason::Interrupt);

        let err = prober
            .wait_until_ready(&target(), &shutdown.subscribe())
            .await
            .unwrap_err();
        assert!(matches!(err, ReadinessError::Cancelled { attempts: 0, .. }));
        assert_eq!(probe.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_attempt_times_out() {
        struct HangingProbe;

        #[async_trait]
        impl Probe for HangingProbe {
            fn kind(&self) -> &'static str {
                "hang"
            }

            async fn check(&self, _target: &DependencyTarget) -> Result<(), ProbeError> {
                std::future::pending().await
            }
        }

        let prober = ReadinessProber::new(&HangingProbe, RetryPolicy::Fixed(SECOND))
            .with_attempt_timeout(Duration::from_millis(200))
            .with_timeout(Some(Duration::from_millis(1000)));

        let err = prober
            .wait_until_ready(&target(), &ShutdownSignal::never())
            .await
            .unwrap_err();
        match err {
            ReadinessError::Unavailable { last_error, .. } => {
                assert_eq!(last_error, ProbeError::TimedOut(Duration::from_millis(200)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_capped_to_remaining_budget() {
        struct BlackHole;

        #[async_trait]
        impl Probe for BlackHole {
            fn kind(&self) -> &'static str {
                "black-hole"
            }

            async fn check(&self, _target: &DependencyTarget) -> Result<(), ProbeError> {
                std::future::pending().await
            }
        }

        let prober = ReadinessProber::new(&BlackHole, RetryPolicy::Fixed(SECOND))
            .with_attempt_timeout(Duration::from_millis(2000))
            .with_timeout(Some(Duration::from_millis(500)));

        let started = Instant::now();
        let err = prober
            .wait_until_ready(&target(), &ShutdownSignal::never())
            .await
            .unwrap_err();

        assert_eq!(started.elapsed(), Duration::from_millis(500));
        match err {
            ReadinessError::Unavailable {
                attempts,
                elapsed,
                last_error,
                ..
            } => {
                assert_eq!(attempts, 1);
                assert_eq!(elapsed, Duration::from_millis(500));
                assert_eq!(last_error, ProbeError::TimedOut(Duration::from_millis(500)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
