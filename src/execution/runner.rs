use super::{AlertId, ExecError, ExecutionCoordinator, ExecutionState};
use crate::clock::{TickSignal, TickSource};
use parking_lot::Mutex;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// Exécute un coordinateur sur son propre fil, cadencé par une [`TickSource`].
///
/// Chaque commande prend le verrou du coordinateur : un `tick` (et donc une
/// éventuelle `advance_rotation`) se termine toujours avant qu'un
/// `emergency_stop` ne soit appliqué. L'arrêt (`abort` ou `Drop`) ferme le
/// canal d'arrêt et attend la fin du fil.
pub struct ScheduleRunner {
    coordinator: Arc<Mutex<ExecutionCoordinator>>,
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduleRunner {
    pub fn spawn<T>(coordinator: ExecutionCoordinator, ticks: T) -> Self
    where
        T: TickSource + 'static,
    {
        let coordinator = Arc::new(Mutex::new(coordinator));
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let shared = Arc::clone(&coordinator);
        let mut ticks = ticks;

        let handle = thread::spawn(move || loop {
            if ticks.wait(&stop_rx) == TickSignal::Stop {
                break;
            }
            let mut c = shared.lock();
            if c.is_terminal() {
                break;
            }
            // pause : le minuteur est figé, le tick est perdu
            if !c.is_ticking() {
                continue;
            }
            if let Err(err) = c.tick() {
                warn!(schedule = %c.schedule().id, error = %err, "tick failed");
            }
            if c.is_terminal() {
                debug!(schedule = %c.schedule().id, "ticker finished");
                break;
            }
        });

        Self {
            coordinator,
            stop: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn start(&self) -> Result<(), ExecError> {
        self.coordinator.lock().start()
    }

    pub fn pause(&self) -> Result<(), ExecError> {
        self.coordinator.lock().pause()
    }

    pub fn resume(&self) -> Result<(), ExecError> {
        self.coordinator.lock().resume()
    }

    pub fn emergency_stop(&self) -> Result<(), ExecError> {
        self.coordinator.lock().emergency_stop()
    }

    pub fn acknowledge(&self, alert_id: &AlertId) -> Result<(), ExecError> {
        self.coordinator.lock().acknowledge(alert_id)
    }

    pub fn snapshot(&self) -> ExecutionState {
        self.coordinator.lock().snapshot()
    }

    /// Accès direct sous verrou (lecture ou commande composée).
    pub fn with<R>(&self, f: impl FnOnce(&mut ExecutionCoordinator) -> R) -> R {
        f(&mut self.coordinator.lock())
    }

    /// Le fil de cadence s'est arrêté.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Attend l'arrêt naturel du fil (planning terminé ou source épuisée).
    pub fn join(mut self) -> ExecutionState {
        self.wait_thread();
        self.snapshot()
    }

    /// Arrête le minuteur immédiatement et rend le dernier état.
    pub fn abort(mut self) -> ExecutionState {
        self.shutdown();
        self.snapshot()
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        self.wait_thread();
    }

    fn wait_thread(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("ticker thread panicked");
            }
        }
    }
}

impl Drop for ScheduleRunner {
    fn drop(&mut self) {
        self.shutdown();
    }
}
