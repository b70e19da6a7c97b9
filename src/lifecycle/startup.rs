//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve and validate configuration before anything else runs
//! - Block until the dependency is reachable
//! - Run preparation steps in order
//! - Hand control to the application
//!
//! # Design Decisions
//! - Fail fast: any phase error is terminal and logged once as FAILED
//! - Phases run in order, never concurrently
//! - HANDED_OFF is entered immediately before the launcher runs, since an
//!   exec handoff never returns to log it
//! - External effects come from `Collaborators` so the sequence can be
//!   driven with fakes

use tracing::Instrument;

use crate::bootstrap::{BootstrapSequencer, CommandStep, PreparationStep};
use crate::config::{load_config, BootstrapConfig, EnvSource};
use crate::error::BootstrapError;
use crate::handoff::{HandoffOutcome, LaunchSpec, Launcher, ProcessHandoff};
use crate::health::{probe_from_config, DependencyTarget, Probe, ProbeError, ReadinessProber};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::lifecycle::state::{Phase, PhaseTracker};
use crate::observability::span::{new_run_id, run_span};
use crate::resilience::RetryPolicy;

/// Source of the probe, the preparation steps and the launcher.
pub trait Collaborators {
    fn probe(&self, config: &BootstrapConfig) -> Result<Box<dyn Probe>, ProbeError>;

    /// Preparation steps in execution order.
    fn steps(&self, config: &BootstrapConfig) -> Vec<Box<dyn PreparationStep>>;

    fn launcher(&self, config: &BootstrapConfig) -> Box<dyn Launcher>;
}

/// Real network probes, management commands and process handoff.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCollaborators;

impl Collaborators for SystemCollaborators {
    fn probe(&self, config: &BootstrapConfig) -> Result<Box<dyn Probe>, ProbeError> {
        probe_from_config(&config.dependency)
    }

    /// Migrations first, then static/media materialization.
    fn steps(&self, config: &BootstrapConfig) -> Vec<Box<dyn PreparationStep>> {
        vec![
            Box::new(CommandStep::migrations(&config.preparation)),
            Box::new(CommandStep::collect_assets(&config.preparation, &config.assets)),
        ]
    }

    fn launcher(&self, config: &BootstrapConfig) -> Box<dyn Launcher> {
        Box::new(ProcessHandoff::new(config.application.handoff))
    }
}

/// Drives one bootstrap run from configuration to handoff.
pub struct Bootstrap<C> {
    collaborators: C,
}

impl<C: Collaborators> Bootstrap<C> {
    pub fn new(collaborators: C) -> Self {
        Self { collaborators }
    }

    /// Run every phase in order.
    ///
    /// Returns only if the handoff returned (spawn mode) or a phase failed.
    pub async fn run(
        &self,
        source: &dyn EnvSource,
        shutdown: ShutdownSignal,
    ) -> Result<HandoffOutcome, BootstrapError> {
        let span = run_span(new_run_id());
        async move {
            let mut tracker = PhaseTracker::new();
            let result = self.drive(&mut tracker, source, &shutdown).await;
            if let Err(e) = &result {
                tracker.fail(e);
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn drive(
        &self,
        tracker: &mut PhaseTracker,
        source: &dyn EnvSource,
        shutdown: &ShutdownSignal,
    ) -> Result<HandoffOutcome, BootstrapError> {
        let config = load_config(source)?;
        tracker.advance(Phase::ConfigResolved);
        tracing::info!(
            dependency = %DependencyTarget::from_config(&config.dependency),
            probe = config.dependency.probe.as_str(),
            handoff = config.application.handoff.as_str(),
            "Configuration resolved"
        );
        checkpoint(tracker, shutdown)?;

        tracker.advance(Phase::WaitingForDependency);
        let probe = self
            .collaborators
            .probe(&config)
            .map_err(BootstrapError::Probe)?;
        let target = DependencyTarget::from_config(&config.dependency);
        ReadinessProber::new(probe.as_ref(), RetryPolicy::from_config(&config.dependency))
            .with_timeout(config.dependency.timeout())
            .with_attempt_timeout(config.dependency.attempt_timeout())
            .wait_until_ready(&target, shutdown)
            .await?;
        tracker.advance(Phase::DependencyReady);
        checkpoint(tracker, shutdown)?;

        tracker.advance(Phase::RunningSteps);
        let steps = self.collaborators.steps(&config);
        BootstrapSequencer::new()
            .with_step_timeout(config.preparation.step_timeout())
            .run(&steps, shutdown)
            .await?;
        tracker.advance(Phase::StepsComplete);
        checkpoint(tracker, shutdown)?;

        let spec = LaunchSpec::from_config(&config.application);
        let launcher = self.collaborators.launcher(&config);
        tracker.advance(Phase::HandedOff);
        tracing::info!(command = %spec, "Handing off to application");
        let outcome = launcher.launch(&spec, shutdown.clone()).await?;
        Ok(outcome)
    }
}

fn checkpoint(tracker: &PhaseTracker, shutdown: &ShutdownSignal) -> Result<(), BootstrapError> {
    match shutdown.reason() {
        Some(reason) => Err(BootstrapError::Cancelled {
            phase: tracker.current(),
            reason,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::env;
    use crate::config::{ConfigError, HandoffMode, ProbeKind};
    use crate::lifecycle::shutdown::{Shutdown, ShutdownReason};
    use std::collections::HashMap;

    fn minimal_env() -> HashMap<String, String> {
        HashMap::from([
            (env::DB_HOST.to_string(), "db".to_string()),
            (env::DB_PORT.to_string(), "5432".to_string()),
        ])
    }

    #[test]
    fn test_system_steps_are_ordered() {
        let mut source = minimal_env();
        source.insert(env::HANDOFF_MODE.to_string(), "spawn".to_string());
        let config = load_config(&source).unwrap();

        let steps = SystemCollaborators.steps(&config);
        let names: Vec<_> = steps.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["apply-migrations", "materialize-assets"]);
        assert_eq!(config.application.handoff, HandoffMode::Spawn);
        assert_eq!(SystemCollaborators.probe(&config).unwrap().kind(), ProbeKind::Tcp.as_str());
    }

    #[tokio::test]
    async fn test_missing_config_fails_before_probing() {
        let err = Bootstrap::new(SystemCollaborators)
            .run(&HashMap::<String, String>::new(), ShutdownSignal::never())
            .await
            .unwrap_err();

        match err {
            BootstrapError::Config(ConfigError::Missing(names)) => {
                assert_eq!(names, vec!["DB_HOST", "DB_PORT"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_cancel_before_start_stops_at_config() {
        let shutdown = Shutdown::new();
        shutdown.trigger(ShutdownReason::Interrupt);

        let err = Bootstrap::new(SystemCollaborators)
            .run(&minimal_env(), shutdown.subscribe())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BootstrapError::Cancelled {
                phase: Phase::ConfigResolved,
                reason: ShutdownReason::Interrupt
            }
        ));
        assert_eq!(err.exit_code(), 130);
    }
}
