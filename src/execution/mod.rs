//! Coordinateur d'exécution : minuteur, machine à états, alertes et séances.
//!
//! ```text
//! Preparing → Active ⇄ Paused
//! Active → Transitioning → Active   (une fois par rotation)
//! Active/Transitioning → Completed
//! * → Errored                       (faute structurelle)
//! ```
//!
//! Toutes les mutations passent par `&mut self` : un coordinateur n'a qu'un
//! seul écrivain. Voir [`runner::ScheduleRunner`] pour l'exécution en tâche
//! de fond.

mod alert;
pub mod runner;
mod state;
mod types;

pub use alert::{Alert, AlertId, AlertKind, AlertPriority};
pub use runner::ScheduleRunner;
pub use state::{ExecutionState, ExecutionStatus, RotationRecord};
pub use types::{EngineOptions, ExecError};

use crate::clock::{Clock, SystemClock};
use crate::events::{ExecutionEvent, ExecutionObserver};
use crate::model::RotationSchedule;
use crate::rotation;
use crate::session::{self, SessionRecord, SessionStatus};
use crate::validation;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ExecutionCoordinator {
    schedule: RotationSchedule,
    options: EngineOptions,
    clock: Arc<dyn Clock>,
    observers: Vec<Box<dyn ExecutionObserver>>,
    state: ExecutionState,
    /// Séances de la rotation courante (en attente pendant une transition).
    sessions: Vec<SessionRecord>,
    /// Sous-phase à restaurer au `resume`.
    resume_to: Option<ExecutionStatus>,
    warned: bool,
    /// Ticks actifs écoulés dans la rotation courante.
    elapsed: i64,
    alert_seq: u64,
}

impl fmt::Debug for ExecutionCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionCoordinator")
            .field("schedule", &self.schedule.id)
            .field("state", &self.state)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl ExecutionCoordinator {
    /// Valide le planning et prépare la rotation 0 (horloge système, sans observateur).
    pub fn initialize(schedule: RotationSchedule) -> Result<Self, ExecError> {
        Self::initialize_with(
            schedule,
            EngineOptions::default(),
            Arc::new(SystemClock),
            Vec::new(),
        )
    }

    /// Comme [`initialize`](Self::initialize), avec options, horloge et
    /// observateurs injectés. Les observateurs reçoivent le `SessionsCreated`
    /// de la rotation 0.
    pub fn initialize_with(
        schedule: RotationSchedule,
        options: EngineOptions,
        clock: Arc<dyn Clock>,
        observers: Vec<Box<dyn ExecutionObserver>>,
    ) -> Result<Self, ExecError> {
        let report = validation::validate(&schedule);
        if !report.is_valid {
            warn!(schedule = %schedule.id, errors = report.errors.len(), "schedule rejected");
            return Err(ExecError::Validation(report));
        }
        for warning in &report.warnings {
            warn!(schedule = %schedule.id, "{warning}");
        }

        let group_positions = rotation::positions_for(&schedule, 0)?;
        let sessions = session::project_rotation(&schedule, 0)?;

        let state = ExecutionState {
            schedule_id: schedule.id.clone(),
            status: ExecutionStatus::Preparing,
            current_rotation_index: 0,
            total_rotations: schedule.total_rotations(),
            time_remaining: schedule.rotation_duration,
            group_positions,
            alerts: Vec::new(),
            session_history: Vec::new(),
            active_session_ids: Vec::new(),
            started_at: None,
            completed_at: None,
        };

        info!(
            schedule = %schedule.id,
            rotations = state.total_rotations,
            groups = schedule.groups.len(),
            "execution prepared"
        );

        let coordinator = Self {
            schedule,
            options,
            clock,
            observers,
            state,
            sessions,
            resume_to: None,
            warned: false,
            elapsed: 0,
            alert_seq: 0,
        };
        coordinator.emit(ExecutionEvent::SessionsCreated(coordinator.sessions.clone()));
        Ok(coordinator)
    }

    /// Ajoute un observateur. Avant `start`, il reçoit aussitôt le
    /// `SessionsCreated` de la rotation 0.
    pub fn subscribe(&mut self, observer: Box<dyn ExecutionObserver>) {
        if self.state.status == ExecutionStatus::Preparing {
            observer.notify(&ExecutionEvent::SessionsCreated(self.sessions.clone()));
        }
        self.observers.push(observer);
    }

    pub fn schedule(&self) -> &RotationSchedule {
        &self.schedule
    }

    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    pub fn snapshot(&self) -> ExecutionState {
        self.state.clone()
    }

    pub fn status(&self) -> ExecutionStatus {
        self.state.status
    }

    pub fn total_rotations(&self) -> usize {
        self.state.total_rotations
    }

    pub fn is_terminal(&self) -> bool {
        self.state.status.is_terminal()
    }

    pub fn is_ticking(&self) -> bool {
        self.state.status.is_ticking()
    }

    /// Séances de la rotation courante, quel que soit leur statut.
    pub fn current_sessions(&self) -> &[SessionRecord] {
        &self.sessions
    }

    /// Séances projetées mais pas encore démarrées.
    pub fn pending_sessions(&self) -> Vec<&SessionRecord> {
        self.sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Pending)
            .collect()
    }

    pub fn unacknowledged_alerts(&self) -> Vec<&Alert> {
        self.state.alerts.iter().filter(|a| !a.acknowledged).collect()
    }

    /// Preparing → Active : démarre les séances de la rotation 0.
    pub fn start(&mut self) -> Result<(), ExecError> {
        if self.state.status != ExecutionStatus::Preparing {
            return Err(self.rejected("start"));
        }
        let now = self.clock.now();
        self.state.started_at = Some(now);
        self.activate_sessions();
        self.state.status = ExecutionStatus::Active;
        info!(schedule = %self.schedule.id, "execution started");
        self.emit(ExecutionEvent::RotationStarted(self.snapshot()));
        Ok(())
    }

    /// Un tick = une seconde de planning.
    pub fn tick(&mut self) -> Result<(), ExecError> {
        match self.state.status {
            ExecutionStatus::Active => {
                self.state.time_remaining = (self.state.time_remaining - 1).max(0);
                self.elapsed += 1;

                let threshold = self.options.warning_threshold_secs;
                if self.state.time_remaining == threshold && !self.warned {
                    self.warned = true;
                    debug!(
                        schedule = %self.schedule.id,
                        rotation = self.state.current_rotation_index,
                        "transition warning"
                    );
                    let message = format!(
                        "{}s until the end of rotation {}",
                        self.state.time_remaining,
                        self.state.current_rotation_index + 1
                    );
                    self.push_alert(AlertKind::TransitionWarning, AlertPriority::High, message);
                }

                if self.state.time_remaining == 0 {
                    self.advance_rotation()?;
                }
                Ok(())
            }
            ExecutionStatus::Transitioning => {
                self.state.time_remaining = (self.state.time_remaining - 1).max(0);
                if self.state.time_remaining == 0 {
                    self.finish_transition();
                }
                Ok(())
            }
            _ => Err(self.rejected("tick")),
        }
    }

    /// Clôt la rotation courante et passe à la suivante (ou termine).
    ///
    /// La rotation suivante est entièrement calculée avant toute mutation :
    /// soit tous les groupes bougent, soit aucun.
    pub fn advance_rotation(&mut self) -> Result<(), ExecError> {
        if self.state.status != ExecutionStatus::Active {
            return Err(self.rejected("advance rotation"));
        }

        let next = self.state.current_rotation_index + 1;
        if next >= self.state.total_rotations {
            return self.complete();
        }

        let prepared = rotation::positions_for(&self.schedule, next as i64)
            .map_err(ExecError::from)
            .and_then(|positions| {
                session::project_rotation(&self.schedule, next)
                    .map(|sessions| (positions, sessions))
                    .map_err(ExecError::from)
            });
        let (positions, sessions) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                self.fail(&err);
                return Err(err);
            }
        };

        self.archive_sessions();
        self.sessions = sessions;
        self.state.group_positions = positions;
        self.state.current_rotation_index = next;
        self.state.status = ExecutionStatus::Transitioning;
        self.state.time_remaining = self.schedule.transition_time;
        self.warned = false;
        self.elapsed = 0;

        info!(
            schedule = %self.schedule.id,
            rotation = next,
            transition = self.schedule.transition_time,
            "rotation transition"
        );

        self.emit(ExecutionEvent::SessionsCreated(self.sessions.clone()));
        self.emit(ExecutionEvent::RotationTransition(self.snapshot()));
        let message = format!("move to rotation {} now", next + 1);
        self.push_alert(AlertKind::TransitionNow, AlertPriority::Critical, message);

        if self.state.time_remaining == 0 {
            self.finish_transition();
        }
        Ok(())
    }

    /// Active/Transitioning → Paused, sous-phase mémorisée.
    pub fn pause(&mut self) -> Result<(), ExecError> {
        if !self.state.status.is_ticking() {
            return Err(self.rejected("pause"));
        }
        self.resume_to = Some(self.state.status);
        self.state.status = ExecutionStatus::Paused;
        info!(schedule = %self.schedule.id, remaining = self.state.time_remaining, "paused");
        Ok(())
    }

    /// Paused → sous-phase mémorisée ; `time_remaining` repart d'où il était.
    pub fn resume(&mut self) -> Result<(), ExecError> {
        if self.state.status != ExecutionStatus::Paused {
            return Err(self.rejected("resume"));
        }
        let Some(previous) = self.resume_to.take() else {
            return Err(self.rejected("resume"));
        };
        self.state.status = previous;
        info!(schedule = %self.schedule.id, status = ?previous, "resumed");
        Ok(())
    }

    /// Arrêt d'urgence : passe en Paused sans toucher à la progression.
    pub fn emergency_stop(&mut self) -> Result<(), ExecError> {
        if self.state.status.is_terminal() {
            return Err(self.rejected("emergency stop"));
        }
        if self.state.status != ExecutionStatus::Paused {
            self.resume_to = Some(self.state.status);
            self.state.status = ExecutionStatus::Paused;
        }
        warn!(
            schedule = %self.schedule.id,
            rotation = self.state.current_rotation_index,
            "emergency stop"
        );
        let message = format!(
            "emergency stop during rotation {}",
            self.state.current_rotation_index + 1
        );
        self.push_alert(AlertKind::EmergencyStop, AlertPriority::Critical, message);
        Ok(())
    }

    /// Termine l'exécution. État terminal.
    pub fn complete(&mut self) -> Result<(), ExecError> {
        if !self.state.status.is_ticking() {
            return Err(self.rejected("complete"));
        }
        self.archive_sessions();
        self.sessions.clear();
        self.resume_to = None;
        self.state.status = ExecutionStatus::Completed;
        self.state.completed_at = Some(self.clock.now());

        info!(
            schedule = %self.schedule.id,
            rotations = self.state.session_history.len(),
            "execution completed"
        );
        let message = format!("all {} rotations completed", self.state.total_rotations);
        self.push_alert(AlertKind::Completion, AlertPriority::Medium, message);
        self.emit(ExecutionEvent::RotationComplete(self.snapshot()));
        Ok(())
    }

    /// Acquitte une alerte ; aucun autre effet.
    pub fn acknowledge(&mut self, alert_id: &AlertId) -> Result<(), ExecError> {
        let alert = self
            .state
            .alerts
            .iter_mut()
            .find(|a| &a.id == alert_id)
            .ok_or_else(|| ExecError::UnknownAlert(alert_id.clone()))?;
        alert.acknowledged = true;
        Ok(())
    }

    fn finish_transition(&mut self) {
        self.activate_sessions();
        self.state.status = ExecutionStatus::Active;
        self.state.time_remaining = self.schedule.rotation_duration;
        info!(
            schedule = %self.schedule.id,
            rotation = self.state.current_rotation_index,
            "rotation started"
        );
        self.emit(ExecutionEvent::RotationStarted(self.snapshot()));
    }

    fn activate_sessions(&mut self) {
        let now = self.clock.now();
        for s in self.sessions.iter_mut() {
            s.status = SessionStatus::Active;
            s.started_at = Some(now);
        }
        self.state.active_session_ids = self.sessions.iter().map(|s| s.id.clone()).collect();
    }

    /// Archive les séances démarrées de la rotation courante.
    fn archive_sessions(&mut self) {
        let now = self.clock.now();
        let mut archived: Vec<SessionRecord> = self
            .sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Active)
            .cloned()
            .collect();
        for s in archived.iter_mut() {
            s.status = SessionStatus::Completed;
            s.ended_at = Some(now);
            s.actual_duration = Some(self.elapsed);
        }
        self.state.active_session_ids.clear();
        if !archived.is_empty() {
            self.state.session_history.push(RotationRecord {
                rotation_index: self.state.current_rotation_index,
                sessions: archived,
            });
        }
    }

    /// Faute structurelle : Errored, minuteur arrêté, alerte de diagnostic.
    fn fail(&mut self, err: &ExecError) {
        warn!(schedule = %self.schedule.id, error = %err, "execution errored");
        self.state.status = ExecutionStatus::Errored;
        self.resume_to = None;
        self.push_alert(AlertKind::Error, AlertPriority::Critical, err.to_string());
    }

    fn rejected(&self, operation: &'static str) -> ExecError {
        warn!(
            schedule = %self.schedule.id,
            operation,
            status = ?self.state.status,
            "command rejected"
        );
        ExecError::InvalidStateTransition {
            operation,
            status: self.state.status,
        }
    }

    fn push_alert(&mut self, kind: AlertKind, priority: AlertPriority, message: String) -> AlertId {
        self.alert_seq += 1;
        let alert = Alert {
            id: AlertId::new(format!("{}-alert-{}", self.schedule.id, self.alert_seq)),
            kind,
            message,
            timestamp: self.clock.now(),
            priority,
            acknowledged: false,
        };
        let id = alert.id.clone();
        self.state.alerts.push(alert.clone());
        self.emit(ExecutionEvent::Alert(alert));
        id
    }

    fn emit(&self, event: ExecutionEvent) {
        for observer in &self.observers {
            observer.notify(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::events::EventLog;
    use crate::model::{Group, Station, StationId, Strategy};
    use chrono::{TimeZone, Utc};

    fn two_station_schedule(rotation_duration: i64, transition_time: i64) -> RotationSchedule {
        let order: Vec<StationId> = vec!["a".into(), "b".into()];
        RotationSchedule {
            id: "unit".into(),
            name: "unit".into(),
            stations: vec![Station::new("a", "A", 8), Station::new("b", "B", 8)],
            groups: vec![
                Group::new("g1", "G1", "a".into(), order.clone())
                    .with_players(vec!["p1".into(), "p2".into()]),
                Group::new("g2", "G2", "b".into(), order.clone())
                    .with_players(vec!["p3".into(), "p4".into()]),
            ],
            rotation_duration,
            transition_time,
            rotation_order: order,
            start_time: None,
            strategy: Strategy::Sequential,
        }
    }

    fn coordinator(schedule: RotationSchedule) -> (ExecutionCoordinator, EventLog) {
        let log = EventLog::new();
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap(),
        ));
        let c = ExecutionCoordinator::initialize_with(
            schedule,
            EngineOptions::default(),
            clock,
            vec![Box::new(log.clone())],
        )
        .unwrap();
        (c, log)
    }

    #[test]
    fn late_subscriber_still_sees_rotation_zero_sessions() {
        let mut c = ExecutionCoordinator::initialize(two_station_schedule(3, 0)).unwrap();
        let early = EventLog::new();
        c.subscribe(Box::new(early.clone()));
        assert_eq!(early.count("sessions_created"), 1);

        c.start().unwrap();
        let late = EventLog::new();
        c.subscribe(Box::new(late.clone()));
        assert_eq!(late.count("sessions_created"), 0);
        assert_eq!(early.count("rotation_started"), 1);
    }

    #[test]
    fn zero_transition_time_starts_next_rotation_immediately() {
        let (mut c, log) = coordinator(two_station_schedule(3, 0));
        c.start().unwrap();
        for _ in 0..3 {
            c.tick().unwrap();
        }
        assert_eq!(c.status(), ExecutionStatus::Active);
        assert_eq!(c.state().current_rotation_index, 1);
        assert_eq!(c.state().time_remaining, 3);
        assert_eq!(log.count("rotation_transition"), 1);
        assert_eq!(log.count("rotation_started"), 2);
    }

    #[test]
    fn transition_countdown_is_independent() {
        let (mut c, _) = coordinator(two_station_schedule(5, 2));
        c.start().unwrap();
        for _ in 0..5 {
            c.tick().unwrap();
        }
        assert_eq!(c.status(), ExecutionStatus::Transitioning);
        assert_eq!(c.state().time_remaining, 2);
        assert!(c.state().active_session_ids.is_empty());
        assert_eq!(c.pending_sessions().len(), 2);
        c.tick().unwrap();
        c.tick().unwrap();
        assert_eq!(c.status(), ExecutionStatus::Active);
        assert_eq!(c.state().time_remaining, 5);
        assert_eq!(c.state().active_session_ids.len(), 2);
    }

    #[test]
    fn archived_sessions_carry_elapsed_ticks() {
        let (mut c, _) = coordinator(two_station_schedule(4, 1));
        c.start().unwrap();
        for _ in 0..4 {
            c.tick().unwrap();
        }
        let history = &c.state().session_history;
        assert_eq!(history.len(), 1);
        assert!(history[0]
            .sessions
            .iter()
            .all(|s| s.status == SessionStatus::Completed && s.actual_duration == Some(4)));
    }

    #[test]
    fn missing_station_mid_run_errors_without_partial_move() {
        let (mut c, log) = coordinator(two_station_schedule(2, 0));
        c.start().unwrap();
        let before = c.state().group_positions.clone();
        c.schedule.stations.retain(|s| s.id.as_str() != "b");

        c.tick().unwrap();
        let err = c.tick().unwrap_err();
        assert!(matches!(err, ExecError::Projection(_)));
        assert_eq!(c.status(), ExecutionStatus::Errored);
        assert_eq!(c.state().group_positions, before);
        assert_eq!(c.state().current_rotation_index, 0);
        let last = c.state().alerts.last().unwrap();
        assert_eq!(last.kind, AlertKind::Error);
        assert_eq!(last.priority, AlertPriority::Critical);
        assert_eq!(log.count("alert"), 1);
        assert!(c.tick().is_err());
        assert!(c.emergency_stop().is_err());
    }

    #[test]
    fn emergency_stop_from_preparing_resumes_to_preparing() {
        let (mut c, _) = coordinator(two_station_schedule(10, 0));
        c.emergency_stop().unwrap();
        assert_eq!(c.status(), ExecutionStatus::Paused);
        c.resume().unwrap();
        assert_eq!(c.status(), ExecutionStatus::Preparing);
        c.start().unwrap();
        assert_eq!(c.status(), ExecutionStatus::Active);
    }

    #[test]
    fn acknowledge_unknown_alert_fails() {
        let (mut c, _) = coordinator(two_station_schedule(10, 0));
        let err = c.acknowledge(&AlertId::new("nope")).unwrap_err();
        assert!(matches!(err, ExecError::UnknownAlert(_)));
    }
}
