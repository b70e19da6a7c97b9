//! Configuration loading from the environment.

use std::path::PathBuf;

use crate::config::resolver::{resolve, EnvSource, ResolvedEnv};
use crate::config::schema::{
    env, env_schema, ApplicationConfig, AssetConfig, BackoffKind, BootstrapConfig,
    DependencyConfig, HandoffMode, PreparationConfig, ProbeKind,
};
use crate::config::validation::{Coercer, ConfigError};

const LOG_LEVELS: &[&str] = &["debug", "info", "warning", "error", "critical"];

/// Resolve, coerce and validate the bootstrap configuration.
pub fn load_config(source: &dyn EnvSource) -> Result<BootstrapConfig, ConfigError> {
    let resolved = resolve(&env_schema(), source)?;
    from_resolved(&resolved)
}

/// Coerce an already resolved environment.
pub fn from_resolved(resolved: &ResolvedEnv) -> Result<BootstrapConfig, ConfigError> {
    let mut c = Coercer::new(resolved);

    let db_port = c.positive::<u16>(env::DB_PORT);
    let listen_port = c.positive::<u16>(env::PORT);
    let workers = c.positive::<u32>(env::GUNICORN_WORKERS);
    let request_timeout_secs = c.positive::<u64>(env::GUNICORN_TIMEOUT);
    let handoff = c.parse::<HandoffMode>(env::HANDOFF_MODE);
    let step_timeout_secs = c.parse_optional::<u64>(env::STEP_TIMEOUT_SECS);

    let probe = c.parse::<ProbeKind>(env::WAIT_PROBE);
    let interval_ms = c.positive::<u64>(env::WAIT_INTERVAL_MS);
    let backoff = c.parse::<BackoffKind>(env::WAIT_BACKOFF);
    let max_interval_ms = c.positive::<u64>(env::WAIT_MAX_INTERVAL_MS);
    let timeout_ms = c.parse_optional::<u64>(env::WAIT_TIMEOUT_MS);
    let attempt_timeout_ms = c.positive::<u64>(env::WAIT_ATTEMPT_TIMEOUT_MS);

    let log_level = c.string(env::LOG_LEVEL).to_ascii_lowercase();
    c.check(
        env::LOG_LEVEL,
        LOG_LEVELS.contains(&log_level.as_str()),
        "expected one of debug, info, warning, error, critical",
    );

    let http_path = c.string(env::WAIT_HTTP_PATH);
    c.check(env::WAIT_HTTP_PATH, http_path.starts_with('/'), "must start with '/'");

    if let Some(Some(0)) = step_timeout_secs {
        c.check(env::STEP_TIMEOUT_SECS, false, "must be greater than zero");
    }
    if let Some(Some(0)) = timeout_ms {
        c.check(env::WAIT_TIMEOUT_MS, false, "must be greater than zero");
    }

    c.finish()?;

    Ok(BootstrapConfig {
        dependency: DependencyConfig {
            host: resolved.value(env::DB_HOST).trim().to_string(),
            port: db_port.unwrap_or_default(),
            probe: probe.unwrap_or_default(),
            http_path,
            interval_ms: interval_ms.unwrap_or_default(),
            backoff: backoff.unwrap_or_default(),
            max_interval_ms: max_interval_ms.unwrap_or_default(),
            timeout_ms: timeout_ms.flatten(),
            attempt_timeout_ms: attempt_timeout_ms.unwrap_or_default(),
        },
        assets: AssetConfig {
            static_root: PathBuf::from(resolved.value(env::STATIC_ROOT)),
            media_root: PathBuf::from(resolved.value(env::MEDIA_ROOT)),
        },
        preparation: PreparationConfig {
            python: resolved.value(env::PYTHON_BIN).to_string(),
            manage_script: resolved.value(env::MANAGE_PY).to_string(),
            step_timeout_secs: step_timeout_secs.flatten(),
        },
        application: ApplicationConfig {
            command: resolved.value(env::APP_COMMAND).to_string(),
            module: resolved.value(env::APP_MODULE).to_string(),
            bind_host: resolved.value(env::BIND_HOST).trim().to_string(),
            listen_port: listen_port.unwrap_or_default(),
            workers: workers.unwrap_or_default(),
            request_timeout_secs: request_timeout_secs.unwrap_or_default(),
            log_level,
            handoff: handoff.unwrap_or_default(),
        },
    })
}
