use super::alert::AlertId;
use super::state::ExecutionStatus;
use crate::rotation::RotationError;
use crate::session::ProjectionError;
use crate::validation::ValidationReport;
use thiserror::Error;

/// Options du moteur
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Seuil (secondes restantes) de l'alerte `transition_warning`, testé par égalité.
    pub warning_threshold_secs: i64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            warning_threshold_secs: 30,
        }
    }
}

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("schedule is invalid: {0}")]
    Validation(ValidationReport),
    #[error("invalid state transition: cannot {operation} while {status:?}")]
    InvalidStateTransition {
        operation: &'static str,
        status: ExecutionStatus,
    },
    #[error("unknown alert: {0}")]
    UnknownAlert(AlertId),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error(transparent)]
    Rotation(#[from] RotationError),
}
