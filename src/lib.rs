#![forbid(unsafe_code)]
//! Tournus : moteur de rotation par ateliers (sans UI ni base de données).
//!
//! - Calcul cyclique des postes par groupe et par rotation.
//! - Validation structurelle et de capacité d'un planning.
//! - Coordinateur à états : minuteur, transitions, pauses, arrêt d'urgence, alertes.
//! - Projection des séances consommées ailleurs.
//! - Horloges injectables ; un tick = une seconde.

pub mod builder;
pub mod clock;
pub mod events;
pub mod execution;
pub mod model;
pub mod rotation;
pub mod session;
pub mod storage;
pub mod validation;

pub use builder::{build_schedule, distribute_players, BuildError, BuildRequest};
pub use clock::{
    BurstTicker, Clock, IntervalTicker, ManualClock, SystemClock, TickSignal, TickSource,
};
pub use events::{ChannelObserver, EventLog, ExecutionEvent, ExecutionObserver, TracingObserver};
pub use execution::{
    Alert, AlertId, AlertKind, AlertPriority, EngineOptions, ExecError, ExecutionCoordinator,
    ExecutionState, ExecutionStatus, RotationRecord, ScheduleRunner,
};
pub use model::{
    Group, GroupId, PlayerId, RotationSchedule, ScheduleId, Station, StationId, Strategy, Workout,
};
pub use rotation::{next_station_for, previous_station_for, station_for, RotationError};
pub use session::{SessionId, SessionRecord, SessionStatus};
pub use storage::{JsonStorage, Storage};
pub use validation::{validate, ValidationIssue, ValidationReport};
