//! Preparation steps backed by external commands.
//!
//! # Responsibilities
//! - Create required directories before the command runs
//! - Run the command with inherited stdout/stderr
//! - Surface the exit status through `StepError`
//!
//! # Design Decisions
//! - The child is killed if the step future is dropped (cancellation, timeout)
//! - stdin is closed so a command never waits for a terminal

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::bootstrap::step::{PreparationStep, StepError};
use crate::config::{AssetConfig, PreparationConfig};

/// Name of the schema migration step.
pub const APPLY_MIGRATIONS: &str = "apply-migrations";
/// Name of the static/media staging step.
pub const MATERIALIZE_ASSETS: &str = "materialize-assets";

/// Runs an external program as a preparation step.
#[derive(Debug, Clone)]
pub struct CommandStep {
    name: String,
    program: String,
    args: Vec<String>,
    envs: Vec<(String, String)>,
    ensure_dirs: Vec<PathBuf>,
}

impl CommandStep {
    pub fn new(name: impl Into<String>, program: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            ensure_dirs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Create `dir` (and parents) before running.
    pub fn ensure_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.ensure_dirs.push(dir.into());
        self
    }

    /// `<python> <manage.py> migrate --noinput`
    pub fn migrations(config: &PreparationConfig) -> Self {
        Self::new(APPLY_MIGRATIONS, config.python.clone())
            .arg(config.manage_script.clone())
            .args(["migrate", "--noinput"])
    }

    /// `<python> <manage.py> collectstatic --noinput`, with both asset roots
    /// created and exported.
    pub fn collect_assets(config: &PreparationConfig, assets: &AssetConfig) -> Self {
        Self::new(MATERIALIZE_ASSETS, config.python.clone())
            .arg(config.manage_script.clone())
            .args(["collectstatic", "--noinput"])
            .env("STATIC_ROOT", assets.static_root.display().to_string())
            .env("MEDIA_ROOT", assets.media_root.display().to_string())
            .ensure_dir(assets.static_root.clone())
            .ensure_dir(assets.media_root.clone())
    }

}

#[async_trait]
impl PreparationStep for CommandStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn describe(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run(&self) -> Result<(), StepError> {
        for dir in &self.ensure_dirs {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| StepError::Io {
                    context: format!("failed to create {}", dir.display()),
                    source,
                })?;
        }

        tracing::debug!(step = %self.name, command = %self.describe(), "Running command");

        let status = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| StepError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(StepError::Exited {
                program: self.program.clone(),
                code: status.code(),
            })
        }
    }
}
