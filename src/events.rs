use crate::execution::{Alert, ExecutionState};
use crate::session::SessionRecord;
use parking_lot::Mutex;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::info;

/// Événement émis par le coordinateur vers l'extérieur.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    SessionsCreated(Vec<SessionRecord>),
    RotationStarted(ExecutionState),
    RotationTransition(ExecutionState),
    RotationComplete(ExecutionState),
    Alert(Alert),
}

impl ExecutionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutionEvent::SessionsCreated(_) => "sessions_created",
            ExecutionEvent::RotationStarted(_) => "rotation_started",
            ExecutionEvent::RotationTransition(_) => "rotation_transition",
            ExecutionEvent::RotationComplete(_) => "rotation_complete",
            ExecutionEvent::Alert(_) => "alert",
        }
    }
}

/// Permet de brancher n'importe quel consommateur (UI, API, journal...).
pub trait ExecutionObserver: Send {
    fn notify(&self, event: &ExecutionEvent);
}

impl<F> ExecutionObserver for F
where
    F: Fn(&ExecutionEvent) + Send,
{
    fn notify(&self, event: &ExecutionEvent) {
        self(event)
    }
}

/// Journal d'événements partagé, clonable (tests, relecture).
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<ExecutionEvent>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| e.name() == name).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl ExecutionObserver for EventLog {
    fn notify(&self, event: &ExecutionEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Relaie les événements sur un canal ; un récepteur fermé est ignoré.
#[derive(Debug, Clone)]
pub struct ChannelObserver {
    tx: Sender<ExecutionEvent>,
}

impl ChannelObserver {
    pub fn new(tx: Sender<ExecutionEvent>) -> Self {
        Self { tx }
    }
}

impl ExecutionObserver for ChannelObserver {
    fn notify(&self, event: &ExecutionEvent) {
        let _ = self.tx.send(event.clone());
    }
}

/// Trace chaque événement via `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn notify(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::SessionsCreated(sessions) => {
                info!(event = event.name(), sessions = sessions.len());
            }
            ExecutionEvent::RotationStarted(state)
            | ExecutionEvent::RotationTransition(state)
            | ExecutionEvent::RotationComplete(state) => {
                info!(
                    event = event.name(),
                    rotation = state.current_rotation_index,
                    status = ?state.status
                );
            }
            ExecutionEvent::Alert(alert) => {
                info!(
                    event = event.name(),
                    kind = ?alert.kind,
                    priority = ?alert.priority,
                    "{}",
                    alert.message
                );
            }
        }
    }
}
