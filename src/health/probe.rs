//! Dependency connectivity checks.
//!
//! # Responsibilities
//! - Describe the dependency target
//! - Perform one read-only connectivity check per call
//! - Reclassify platform errors into `ProbeError`
//!
//! # Design Decisions
//! - A TCP probe drops its stream before returning
//! - The HTTP client keeps no idle connections, so nothing outlives an attempt

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpStream;
use url::Url;

use crate::config::{DependencyConfig, ProbeKind};

/// The external dependency to wait for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DependencyTarget {
    pub host: String,
    pub port: u16,
}

impl DependencyTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn from_config(config: &DependencyConfig) -> Self {
        Self::new(config.host.clone(), config.port)
    }
}

impl fmt::Display for DependencyTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Why a single probe attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    /// Connection refused, unreachable, or name resolution failed.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The attempt did not finish within its deadline.
    #[error("attempt timed out after {0:?}")]
    TimedOut(Duration),

    /// The dependency answered but reported itself unhealthy.
    #[error("unhealthy status {0}")]
    Status(u16),

    /// The probe request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),
}

/// A read-only liveness check against a dependency.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Short name used in logs.
    fn kind(&self) -> &'static str;

    /// Perform one attempt. Must release every resource before returning.
    async fn check(&self, target: &DependencyTarget) -> Result<(), ProbeError>;
}

/// Opens and immediately closes a TCP connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

#[async_trait]
impl Probe for TcpProbe {
    fn kind(&self) -> &'static str {
        "tcp"
    }

    async fn check(&self, target: &DependencyTarget) -> Result<(), ProbeError> {
        let stream = TcpStream::connect((target.host.as_str(), target.port))
            .await
            .map_err(|e| ProbeError::Connect(e.to_string()))?;
        drop(stream);
        Ok(())
    }
}

/// Issues `GET http://host:port<path>` and expects a 2xx.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    path: String,
}

impl HttpProbe {
    pub fn new(path: impl Into<String>) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .no_proxy()
            .user_agent(concat!("bootstrap-orchestrator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProbeError::Request(e.to_string()))?;
        Ok(Self {
            client,
            path: path.into(),
        })
    }

    /// URL probed for `target`.
    pub fn url_for(&self, target: &DependencyTarget) -> Result<Url, ProbeError> {
        let base = Url::parse(&format!("http://{}", target))
            .map_err(|e| ProbeError::Request(format!("invalid target '{}': {}", target, e)))?;
        base.join(&self.path)
            .map_err(|e| ProbeError::Request(format!("invalid path '{}': {}", self.path, e)))
    }
}

#[async_trait]
impl Probe for HttpProbe {
    fn kind(&self) -> &'static str {
        "http"
    }

    async fn check(&self, target: &DependencyTarget) -> Result<(), ProbeError> {
        let url = self.url_for(target)?;
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_connect() {
                ProbeError::Connect(e.to_string())
            } else {
                ProbeError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProbeError::Status(status.as_u16()))
        }
    }
}

/// Build the probe selected by configuration.
pub fn probe_from_config(config: &DependencyConfig) -> Result<Box<dyn Probe>, ProbeError> {
    Ok(match config.probe {
        ProbeKind::Tcp => Box::new(TcpProbe),
        ProbeKind::Http => Box::new(HttpProbe::new(config.http_path.clone())?),
    })
}
