//! Readiness probes against real sockets.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bootstrap_orchestrator::health::{
    DependencyTarget, HttpProbe, ProbeError, ReadinessError, ReadinessProber, TcpProbe,
};
use bootstrap_orchestrator::lifecycle::ShutdownSignal;
use bootstrap_orchestrator::resilience::RetryPolicy;

use common::{closed_port, start_mock_backend, start_programmable_backend};

fn fast_policy() -> RetryPolicy {
    RetryPolicy::Fixed(Duration::from_millis(50))
}

#[tokio::test]
async fn test_tcp_probe_reaches_listener() {
    let addr = start_mock_backend("ok").await;
    let target = DependencyTarget::new("127.0.0.1", addr.port());

    let ready = ReadinessProber::new(&TcpProbe, fast_policy())
        .wait_until_ready(&target, &ShutdownSignal::never())
        .await
        .unwrap();

    assert_eq!(ready.attempts, 1);
}

#[tokio::test]
async fn test_tcp_probe_gives_up_on_closed_port() {
    let target = DependencyTarget::new("127.0.0.1", closed_port().await);

    let err = ReadinessProber::new(&TcpProbe, fast_policy())
        .with_timeout(Some(Duration::from_millis(300)))
        .wait_until_ready(&target, &ShutdownSignal::never())
        .await
        .unwrap_err();

    match err {
        ReadinessError::Unavailable {
            attempts,
            last_error,
            ..
        } => {
            assert!(attempts >= 2);
            assert!(matches!(last_error, ProbeError::Connect(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_http_probe_retries_until_healthy() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let addr = start_programmable_backend(move || {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        async move {
            if n < 2 {
                (503, "starting".to_string())
            } else {
                (200, "ok".to_string())
            }
        }
    })
    .await;
    let target = DependencyTarget::new("127.0.0.1", addr.port());
    let probe = HttpProbe::new("/health").unwrap();

    let ready = ReadinessProber::new(&probe, fast_policy())
        .with_timeout(Some(Duration::from_secs(10)))
        .wait_until_ready(&target, &ShutdownSignal::never())
        .await
        .unwrap();

    assert_eq!(ready.attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_http_probe_reports_status() {
    let addr = start_programmable_backend(|| async { (500, "broken".to_string()) }).await;
    let target = DependencyTarget::new("127.0.0.1", addr.port());
    let probe = HttpProbe::new("/").unwrap();

    let err = ReadinessProber::new(&probe, fast_policy())
        .with_timeout(Some(Duration::from_millis(200)))
        .wait_until_ready(&target, &ShutdownSignal::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReadinessError::Unavailable {
            last_error: ProbeError::Status(500),
            ..
        }
    ));
}
