use super::alert::Alert;
use crate::model::ScheduleId;
use crate::rotation::Positions;
use crate::session::{SessionId, SessionRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Preparing,
    Active,
    Transitioning,
    Paused,
    Completed,
    Errored,
}

impl ExecutionStatus {
    /// Plus aucune commande de progression n'est acceptée.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Errored)
    }

    /// Le minuteur décompte dans cet état.
    pub fn is_ticking(&self) -> bool {
        matches!(self, ExecutionStatus::Active | ExecutionStatus::Transitioning)
    }
}

/// Séances archivées d'une rotation terminée.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationRecord {
    pub rotation_index: usize,
    pub sessions: Vec<SessionRecord>,
}

/// État d'exécution d'un planning. Seul le coordinateur le modifie ; les
/// observateurs en reçoivent des copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub schedule_id: ScheduleId,
    pub status: ExecutionStatus,
    pub current_rotation_index: usize,
    pub total_rotations: usize,
    /// Secondes restantes dans la phase courante (rotation ou transition).
    pub time_remaining: i64,
    pub group_positions: Positions,
    pub alerts: Vec<Alert>,
    pub session_history: Vec<RotationRecord>,
    pub active_session_ids: Vec<SessionId>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}
