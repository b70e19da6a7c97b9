//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use bootstrap_orchestrator::bootstrap::{PreparationStep, StepError};
use bootstrap_orchestrator::config::{BootstrapConfig, HandoffMode};
use bootstrap_orchestrator::handoff::{
    HandoffError, HandoffOutcome, LaunchSpec, Launcher, ProcessHandoff,
};
use bootstrap_orchestrator::health::{DependencyTarget, Probe, ProbeError};
use bootstrap_orchestrator::lifecycle::{Collaborators, ShutdownSignal};

/// Start a mock backend that answers every request with 200 and `body`.
pub async fn start_mock_backend(body: &'static str) -> SocketAddr {
    start_programmable_backend(move || async move { (200, body.to_string()) }).await
}

/// Start a mock backend whose status and body come from `f`, per request.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        let _ = socket.read(&mut buf).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// A port nothing is listening on.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Environment with just the required names set.
pub fn minimal_env() -> HashMap<String, String> {
    env(&[("DB_HOST", "db"), ("DB_PORT", "5432")])
}

pub fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Ordered record of every collaborator call.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count_prefix(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

/// Fails a fixed number of attempts, then succeeds.
pub struct ScriptedProbe {
    remaining_failures: Arc<AtomicU32>,
    journal: Journal,
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn kind(&self) -> &'static str {
        "scripted"
    }

    async fn check(&self, target: &DependencyTarget) -> Result<(), ProbeError> {
        self.journal.push(format!("probe {}", target));
        let failed = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(ProbeError::Connect("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Records its name and optionally fails.
pub struct RecordingStep {
    name: String,
    fail: bool,
    journal: Journal,
}

#[async_trait]
impl PreparationStep for RecordingStep {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self) -> Result<(), StepError> {
        self.journal.push(self.name.clone());
        if self.fail {
            Err(StepError::Exited {
                program: "python".to_string(),
                code: Some(1),
            })
        } else {
            Ok(())
        }
    }
}

/// Records the command it was asked to launch.
pub struct RecordingLauncher {
    exit_code: i32,
    journal: Journal,
}

#[async_trait]
impl Launcher for RecordingLauncher {
    async fn launch(
        &self,
        spec: &LaunchSpec,
        _shutdown: ShutdownSignal,
    ) -> Result<HandoffOutcome, HandoffError> {
        self.journal.push(format!("launch {}", spec));
        Ok(HandoffOutcome {
            exit_code: self.exit_code,
        })
    }
}

/// In-memory collaborators with a shared journal.
#[derive(Clone)]
pub struct FakeSystem {
    pub journal: Journal,
    probe_failures: Arc<AtomicU32>,
    failing_step: Option<&'static str>,
    exit_code: i32,
    spawn_for_real: bool,
}

impl FakeSystem {
    pub fn new() -> Self {
        Self {
            journal: Journal::default(),
            probe_failures: Arc::new(AtomicU32::new(0)),
            failing_step: None,
            exit_code: 0,
            spawn_for_real: false,
        }
    }

    /// Dependency refuses this many attempts before answering.
    pub fn unreachable_for(self, attempts: u32) -> Self {
        self.probe_failures.store(attempts, Ordering::SeqCst);
        self
    }

    pub fn never_reachable(self) -> Self {
        self.unreachable_for(u32::MAX)
    }

    pub fn failing_step(mut self, name: &'static str) -> Self {
        self.failing_step = Some(name);
        self
    }

    pub fn application_exit(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// Launch with a real spawn-mode `ProcessHandoff`.
    pub fn spawn_for_real(mut self) -> Self {
        self.spawn_for_real = true;
        self
    }
}

impl Collaborators for FakeSystem {
    fn probe(&self, _config: &BootstrapConfig) -> Result<Box<dyn Probe>, ProbeError> {
        Ok(Box::new(ScriptedProbe {
            remaining_failures: self.probe_failures.clone(),
            journal: self.journal.clone(),
        }))
    }

    fn steps(&self, _config: &BootstrapConfig) -> Vec<Box<dyn PreparationStep>> {
        ["apply-migrations", "materialize-assets"]
            .into_iter()
            .map(|name| {
                Box::new(RecordingStep {
                    name: name.to_string(),
                    fail: self.failing_step == Some(name),
                    journal: self.journal.clone(),
                }) as Box<dyn PreparationStep>
            })
            .collect()
    }

    fn launcher(&self, _config: &BootstrapConfig) -> Box<dyn Launcher> {
        if self.spawn_for_real {
            Box::new(ProcessHandoff::new(HandoffMode::Spawn))
        } else {
            Box::new(RecordingLauncher {
                exit_code: self.exit_code,
                journal: self.journal.clone(),
            })
        }
    }
}
