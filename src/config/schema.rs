//! Configuration schema definitions.
//!
//! This module declares every environment variable the orchestrator reads and
//! the typed configuration it is coerced into. All types derive `Serialize`
//! so the resolved configuration can be dumped by operators.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::resolver::EnvSchema;

/// Environment variable names.
pub mod env {
    pub const DB_HOST: &str = "DB_HOST";
    pub const DB_PORT: &str = "DB_PORT";

    pub const PORT: &str = "PORT";
    pub const BIND_HOST: &str = "BIND_HOST";
    pub const STATIC_ROOT: &str = "STATIC_ROOT";
    pub const MEDIA_ROOT: &str = "MEDIA_ROOT";
    pub const GUNICORN_WORKERS: &str = "GUNICORN_WORKERS";
    pub const GUNICORN_TIMEOUT: &str = "GUNICORN_TIMEOUT";
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    pub const APP_COMMAND: &str = "APP_COMMAND";
    pub const APP_MODULE: &str = "APP_MODULE";
    pub const HANDOFF_MODE: &str = "HANDOFF_MODE";

    pub const PYTHON_BIN: &str = "PYTHON_BIN";
    pub const MANAGE_PY: &str = "MANAGE_PY";
    pub const STEP_TIMEOUT_SECS: &str = "STEP_TIMEOUT_SECS";

    pub const WAIT_PROBE: &str = "WAIT_PROBE";
    pub const WAIT_HTTP_PATH: &str = "WAIT_HTTP_PATH";
    pub const WAIT_INTERVAL_MS: &str = "WAIT_INTERVAL_MS";
    pub const WAIT_BACKOFF: &str = "WAIT_BACKOFF";
    pub const WAIT_MAX_INTERVAL_MS: &str = "WAIT_MAX_INTERVAL_MS";
    pub const WAIT_TIMEOUT_MS: &str = "WAIT_TIMEOUT_MS";
    pub const WAIT_ATTEMPT_TIMEOUT_MS: &str = "WAIT_ATTEMPT_TIMEOUT_MS";
}

/// The environment schema read at startup.
///
/// Required names come first, in the order they are reported when missing.
/// An empty default means "unset".
pub fn env_schema() -> EnvSchema {
    let app = ApplicationConfig::default();
    let assets = AssetConfig::default();
    let prep = PreparationConfig::default();
    let dep = DependencyConfig::default();

    EnvSchema::new()
        .required(env::DB_HOST)
        .required(env::DB_PORT)
        .optional(env::PORT, app.listen_port.to_string())
        .optional(env::BIND_HOST, app.bind_host)
        .optional(env::STATIC_ROOT, assets.static_root.display().to_string())
        .optional(env::MEDIA_ROOT, assets.media_root.display().to_string())
        .optional(env::GUNICORN_WORKERS, app.workers.to_string())
        .optional(env::GUNICORN_TIMEOUT, app.request_timeout_secs.to_string())
        .optional(env::LOG_LEVEL, app.log_level)
        .optional(env::APP_COMMAND, app.command)
        .optional(env::APP_MODULE, app.module)
        .optional(env::HANDOFF_MODE, app.handoff.as_str())
        .optional(env::PYTHON_BIN, prep.python)
        .optional(env::MANAGE_PY, prep.manage_script)
        .optional(env::STEP_TIMEOUT_SECS, "")
        .optional(env::WAIT_PROBE, dep.probe.as_str())
        .optional(env::WAIT_HTTP_PATH, dep.http_path)
        .optional(env::WAIT_INTERVAL_MS, dep.interval_ms.to_string())
        .optional(env::WAIT_BACKOFF, dep.backoff.as_str())
        .optional(env::WAIT_MAX_INTERVAL_MS, dep.max_interval_ms.to_string())
        .optional(env::WAIT_TIMEOUT_MS, "")
        .optional(env::WAIT_ATTEMPT_TIMEOUT_MS, dep.attempt_timeout_ms.to_string())
}

/// Root configuration for a bootstrap run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootstrapConfig {
    /// External dependency gating the launch.
    pub dependency: DependencyConfig,

    /// Static and media roots handed to the asset step.
    pub assets: AssetConfig,

    /// Preparation command settings.
    pub preparation: PreparationConfig,

    /// The long-running application.
    pub application: ApplicationConfig,
}

/// How the dependency is probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    /// Open and close a TCP connection.
    #[default]
    Tcp,
    /// Issue an HTTP GET and expect a 2xx.
    Http,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::Tcp => "tcp",
            ProbeKind::Http => "http",
        }
    }
}

impl FromStr for ProbeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "tcp" => Ok(ProbeKind::Tcp),
            "http" => Ok(ProbeKind::Http),
            other => Err(format!("unknown probe kind '{}', expected tcp or http", other)),
        }
    }
}

/// Delay strategy between probe attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    Fixed,
    Exponential,
}

impl BackoffKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackoffKind::Fixed => "fixed",
            BackoffKind::Exponential => "exponential",
        }
    }
}

impl FromStr for BackoffKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fixed" => Ok(BackoffKind::Fixed),
            "exponential" => Ok(BackoffKind::Exponential),
            other => Err(format!(
                "unknown backoff '{}', expected fixed or exponential",
                other
            )),
        }
    }
}

/// How control is transferred to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffMode {
    /// Replace the orchestrator's process image.
    Exec,
    /// Run the application as a child, forward signals, exit with its code.
    Spawn,
}

impl Default for HandoffMode {
    fn default() -> Self {
        if cfg!(unix) {
            HandoffMode::Exec
        } else {
            HandoffMode::Spawn
        }
    }
}

impl HandoffMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandoffMode::Exec => "exec",
            HandoffMode::Spawn => "spawn",
        }
    }
}

impl FromStr for HandoffMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "exec" if cfg!(unix) => Ok(HandoffMode::Exec),
            "exec" => Err("exec handoff is only available on unix".to_string()),
            "spawn" => Ok(HandoffMode::Spawn),
            other => Err(format!(
                "unknown handoff mode '{}', expected exec or spawn",
                other
            )),
        }
    }
}

/// Dependency readiness settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyConfig {
    /// Dependency host name or address.
    pub host: String,

    /// Dependency port.
    pub port: u16,

    /// Probe flavour.
    pub probe: ProbeKind,

    /// Path requested by the HTTP probe.
    pub http_path: String,

    /// Delay between attempts in milliseconds (base delay for exponential).
    pub interval_ms: u64,

    /// Delay strategy.
    pub backoff: BackoffKind,

    /// Upper bound on the exponential delay in milliseconds.
    pub max_interval_ms: u64,

    /// Overall readiness deadline in milliseconds. `None` retries forever.
    pub timeout_ms: Option<u64>,

    /// Deadline for a single attempt in milliseconds.
    pub attempt_timeout_ms: u64,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 0,
            probe: ProbeKind::Tcp,
            http_path: "/".to_string(),
            interval_ms: 1000,
            backoff: BackoffKind::Fixed,
            max_interval_ms: 30_000,
            timeout_ms: None,
            attempt_timeout_ms: 2000,
        }
    }
}

impl DependencyConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

/// Asset roots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetConfig {
    pub static_root: PathBuf,
    pub media_root: PathBuf,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            static_root: PathBuf::from("/app/staticfiles"),
            media_root: PathBuf::from("/app/media"),
        }
    }
}

/// Settings for the preparation commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparationConfig {
    /// Interpreter used to run the management script.
    pub python: String,

    /// Management script path.
    pub manage_script: String,

    /// Per-step deadline in seconds. `None` lets steps run to completion.
    pub step_timeout_secs: Option<u64>,
}

impl Default for PreparationConfig {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            manage_script: "manage.py".to_string(),
            step_timeout_secs: None,
        }
    }
}

impl PreparationConfig {
    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_secs.map(Duration::from_secs)
    }
}

/// The long-running application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationConfig {
    /// Executable to hand off to.
    pub command: String,

    /// Entry module passed as the first argument.
    pub module: String,

    /// Bind host.
    pub bind_host: String,

    /// Bind port.
    pub listen_port: u16,

    /// Worker processes.
    pub workers: u32,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Application log level.
    pub log_level: String,

    /// Exec or spawn.
    pub handoff: HandoffMode,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            command: "gunicorn".to_string(),
            module: "backend.wsgi:application".to_string(),
            bind_host: "0.0.0.0".to_string(),
            listen_port: 8000,
            workers: 3,
            request_timeout_secs: 120,
            log_level: "info".to_string(),
            handoff: HandoffMode::default(),
        }
    }
}
