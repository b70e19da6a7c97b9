//! Shutdown coordination for the orchestrator.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;

/// Why the orchestrator was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ShutdownReason {
    /// SIGTERM.
    Terminate,
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// Triggered programmatically.
    Requested,
}

impl ShutdownReason {
    /// Conventional `128 + signal` exit status.
    pub fn exit_code(&self) -> u8 {
        match self {
            ShutdownReason::Terminate => 143,
            ShutdownReason::Interrupt | ShutdownReason::Requested => 130,
        }
    }
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ShutdownReason::Terminate => "SIGTERM",
            ShutdownReason::Interrupt => "SIGINT",
            ShutdownReason::Requested => "requested",
        };
        f.write_str(s)
    }
}

/// Coordinator for cancellation.
///
/// Backed by a watch channel, so a subscriber created after the trigger still
/// observes it.
#[derive(Debug, Clone)]
pub struct Shutdown {
    /// Watch channel sender.
    tx: Arc<watch::Sender<Option<ShutdownReason>>>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal. The latest reason wins.
    pub fn trigger(&self, reason: ShutdownReason) {
        self.tx.send_replace(Some(reason));
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half handed to every cancellable phase.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<ShutdownReason>>,
}

impl ShutdownSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        Shutdown::new().subscribe()
    }

    /// The current reason, if shutdown was triggered.
    pub fn reason(&self) -> Option<ShutdownReason> {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is triggered. Pending forever if the
    /// coordinator is dropped without triggering.
    pub async fn cancelled(&self) -> ShutdownReason {
        let mut rx = self.rx.clone();
        let reason = match rx.wait_for(Option::is_some).await {
            Ok(reason) => *reason,
            Err(_) => None,
        };
        match reason {
            Some(reason) => reason,
            None => std::future::pending().await,
        }
    }
}
