//! Calcul des rotations : arithmétique cyclique pure sur l'ordre de chaque groupe.

mod calculator;
mod plan;
mod types;

pub use calculator::{next_station_for, previous_station_for, station_for};
pub use plan::{plan, positions_for, render_plan, Positions, RotationStep};
pub use types::RotationError;
