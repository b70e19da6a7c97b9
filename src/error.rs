//! Top-level bootstrap error and process exit codes.

use thiserror::Error;

use crate::bootstrap::{SequenceError, StepFailure};
use crate::config::ConfigError;
use crate::handoff::HandoffError;
use crate::health::{ProbeError, ReadinessError};
use crate::lifecycle::{Phase, ShutdownReason};

/// Exit status for an invalid or incomplete configuration.
pub const EXIT_CONFIG: u8 = 1;
/// Exit status when the dependency never became reachable.
pub const EXIT_DEPENDENCY: u8 = 2;
/// Exit status when a preparation step failed.
pub const EXIT_STEP: u8 = 3;
/// Exit status when the application could not be started.
pub const EXIT_HANDOFF: u8 = 4;

/// Terminal failure of a bootstrap run.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The probe could not be constructed.
    #[error("dependency probe unusable: {0}")]
    Probe(#[source] ProbeError),

    #[error("{0}")]
    DependencyUnavailable(#[source] ReadinessError),

    #[error(transparent)]
    Step(StepFailure),

    #[error("handoff failed: {0}")]
    Handoff(#[from] HandoffError),

    #[error("cancelled by {reason} during {phase}")]
    Cancelled { phase: Phase, reason: ShutdownReason },
}

impl BootstrapError {
    /// Phase in which the run failed.
    pub fn phase(&self) -> Phase {
        match self {
            BootstrapError::Config(_) => Phase::Init,
            BootstrapError::Probe(_) | BootstrapError::DependencyUnavailable(_) => {
                Phase::WaitingForDependency
            }
            BootstrapError::Step(_) => Phase::RunningSteps,
            BootstrapError::Handoff(_) => Phase::HandedOff,
            BootstrapError::Cancelled { phase, .. } => *phase,
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            BootstrapError::Config(_) => EXIT_CONFIG,
            BootstrapError::Probe(_) | BootstrapError::DependencyUnavailable(_) => EXIT_DEPENDENCY,
            BootstrapError::Step(_) => EXIT_STEP,
            BootstrapError::Handoff(_) => EXIT_HANDOFF,
            BootstrapError::Cancelled { reason, .. } => reason.exit_code(),
        }
    }
}

impl From<ReadinessError> for BootstrapError {
    fn from(err: ReadinessError) -> Self {
        match err {
            ReadinessError::Cancelled { reason, .. } => BootstrapError::Cancelled {
                phase: Phase::WaitingForDependency,
                reason,
            },
            other => BootstrapError::DependencyUnavailable(other),
        }
    }
}

impl From<SequenceError> for BootstrapError {
    fn from(err: SequenceError) -> Self {
        match err {
            SequenceError::Failed(failure) => BootstrapError::Step(failure),
            SequenceError::Cancelled { reason, .. } => BootstrapError::Cancelled {
                phase: Phase::RunningSteps,
                reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::StepError;
    use crate::health::DependencyTarget;
    use std::time::Duration;

    #[test]
    fn test_exit_codes() {
        let config: BootstrapError = ConfigError::Missing(vec!["DB_HOST".into()]).into();
        assert_eq!(config.exit_code(), 1);
        assert_eq!(config.phase(), Phase::Init);

        let unavailable: BootstrapError = ReadinessError::Unavailable {
            target: DependencyTarget::new("db", 5432),
            elapsed: Duration::from_secs(5),
            attempts: 5,
            last_error: ProbeError::Connect("refused".into()),
        }
        .into();
        assert_eq!(unavailable.exit_code(), 2);

        let step: BootstrapError = SequenceError::Failed(StepFailure {
            step: "b".into(),
            cause: StepError::Failed("boom".into()),
            records: Vec::new(),
        })
        .into();
        assert_eq!(step.exit_code(), 3);
        assert_eq!(step.phase(), Phase::RunningSteps);

        assert_eq!(BootstrapError::Handoff(HandoffError::EmptyCommand).exit_code(), 4);
    }

    #[test]
    fn test_cancellation_keeps_phase_and_signal() {
        let err: BootstrapError = ReadinessError::Cancelled {
            reason: ShutdownReason::Terminate,
            attempts: 2,
        }
        .into();
        assert_eq!(err.phase(), Phase::WaitingForDependency);
        assert_eq!(err.exit_code(), 143);

        let err: BootstrapError = SequenceError::Cancelled {
            step: "a".into(),
            reason: ShutdownReason::Interrupt,
            records: Vec::new(),
        }
        .into();
        assert_eq!(err.phase(), Phase::RunningSteps);
        assert_eq!(err.exit_code(), 130);
    }
}
