use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use bootstrap_orchestrator::config::{load_config, BootstrapConfig, ProcessEnv};
use bootstrap_orchestrator::error::BootstrapError;
use bootstrap_orchestrator::handoff::LaunchSpec;
use bootstrap_orchestrator::health::{DependencyTarget, ReadinessProber};
use bootstrap_orchestrator::lifecycle::{signals, Collaborators, Shutdown, SystemCollaborators};
use bootstrap_orchestrator::observability::logging::{self, LogFormat};
use bootstrap_orchestrator::resilience::RetryPolicy;

#[derive(Parser)]
#[command(name = "bootstrap-ctl")]
#[command(about = "Inspect the bootstrap configuration and dependency without starting the application", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and validate the environment, then print the configuration
    Check,
    /// Wait for the configured dependency once
    Probe {
        /// Overall timeout, overriding WAIT_TIMEOUT_MS
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Print the preparation steps and the launch command
    Plan,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_with_writer(LogFormat::from_env(), std::io::stderr);

    let result = match cli.command {
        Commands::Check => check(),
        Commands::Probe { timeout_ms } => probe(timeout_ms).await,
        Commands::Plan => plan(),
    };

    match result {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(text) => {
                println!("{}", text);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: failed to render output: {}", e);
                ExitCode::FAILURE
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn config() -> Result<BootstrapConfig, BootstrapError> {
    Ok(load_config(&ProcessEnv)?)
}

fn check() -> Result<Value, BootstrapError> {
    Ok(json!(config()?))
}

async fn probe(timeout_ms: Option<u64>) -> Result<Value, BootstrapError> {
    let config = config()?;
    let timeout = timeout_ms
        .map(Duration::from_millis)
        .or_else(|| config.dependency.timeout());

    let shutdown = Shutdown::new();
    if let Err(e) = signals::listen(shutdown.clone()) {
        tracing::warn!(error = %e, "Signal handlers unavailable");
    }

    let probe = SystemCollaborators
        .probe(&config)
        .map_err(BootstrapError::Probe)?;
    let target = DependencyTarget::from_config(&config.dependency);
    let ready = ReadinessProber::new(probe.as_ref(), RetryPolicy::from_config(&config.dependency))
        .with_timeout(timeout)
        .with_attempt_timeout(config.dependency.attempt_timeout())
        .wait_until_ready(&target, &shutdown.subscribe())
        .await?;

    Ok(json!({
        "target": target.to_string(),
        "probe": probe.kind(),
        "ready": ready,
    }))
}

fn plan() -> Result<Value, BootstrapError> {
    let config = config()?;
    let steps: Vec<Value> = SystemCollaborators
        .steps(&config)
        .iter()
        .map(|step| {
            json!({
                "name": step.name(),
                "command": step.describe(),
                "idempotency": step.idempotency(),
            })
        })
        .collect();

    Ok(json!({
        "dependency": DependencyTarget::from_config(&config.dependency).to_string(),
        "steps": steps,
        "launch": {
            "command": LaunchSpec::from_config(&config.application).to_string(),
            "handoff": config.application.handoff.as_str(),
        },
    }))
}
