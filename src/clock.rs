//! Horloges injectables.
//!
//! - [`Clock`] fournit l'horodatage (alertes, séances).
//! - [`TickSource`] fournit la cadence ; un tick vaut une seconde de planning.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};

/// Source d'horodatage.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Horloge manuelle pour les tests et les simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickSignal {
    Tick,
    Stop,
}

/// Cadence du moteur. `stop` est le canal d'arrêt du runner : toute
/// implémentation doit rendre `Stop` dès qu'il reçoit un message ou se ferme.
pub trait TickSource: Send {
    fn wait(&mut self, stop: &Receiver<()>) -> TickSignal;
}

/// Tick en temps réel toutes les `period`.
#[derive(Debug, Clone, Copy)]
pub struct IntervalTicker {
    period: std::time::Duration,
}

impl IntervalTicker {
    pub fn new(period: std::time::Duration) -> Self {
        Self { period }
    }

    pub fn every_second() -> Self {
        Self::new(std::time::Duration::from_secs(1))
    }
}

impl TickSource for IntervalTicker {
    fn wait(&mut self, stop: &Receiver<()>) -> TickSignal {
        match stop.recv_timeout(self.period) {
            Err(RecvTimeoutError::Timeout) => TickSignal::Tick,
            Ok(()) | Err(RecvTimeoutError::Disconnected) => TickSignal::Stop,
        }
    }
}

/// Rend `remaining` ticks sans délai, puis `Stop`.
#[derive(Debug, Clone, Copy)]
pub struct BurstTicker {
    remaining: u64,
}

impl BurstTicker {
    pub fn new(ticks: u64) -> Self {
        Self { remaining: ticks }
    }
}

impl TickSource for BurstTicker {
    fn wait(&mut self, stop: &Receiver<()>) -> TickSignal {
        match stop.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return TickSignal::Stop,
            Err(TryRecvError::Empty) => {}
        }
        if self.remaining == 0 {
            return TickSignal::Stop;
        }
        self.remaining -= 1;
        TickSignal::Tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::mpsc;

    #[test]
    fn manual_clock_advances() {
        let t0 = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let clock = ManualClock::new(t0);
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), t0 + Duration::seconds(90));
    }

    #[test]
    fn burst_ticker_counts_down_then_stops() {
        let (_tx, rx) = mpsc::channel();
        let mut ticker = BurstTicker::new(2);
        assert_eq!(ticker.wait(&rx), TickSignal::Tick);
        assert_eq!(ticker.wait(&rx), TickSignal::Tick);
        assert_eq!(ticker.wait(&rx), TickSignal::Stop);
    }

    #[test]
    fn interval_ticker_stops_on_signal() {
        let (tx, rx) = mpsc::channel();
        let mut ticker = IntervalTicker::new(std::time::Duration::from_secs(30));
        tx.send(()).unwrap();
        assert_eq!(ticker.wait(&rx), TickSignal::Stop);
        drop(tx);
        assert_eq!(ticker.wait(&rx), TickSignal::Stop);
    }
}
