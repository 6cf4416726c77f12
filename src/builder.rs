//! Construction d'un planning : répartition des joueurs et ateliers de départ
//! selon la stratégie choisie. Le moteur n'utilise jamais la stratégie.

use crate::model::{Group, PlayerId, RotationSchedule, ScheduleId, Station, StationId, Strategy};
use crate::validation::{self, ValidationReport};
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("at least one station is required")]
    NoStations,
    #[error("group count must be > 0")]
    NoGroups,
    #[error("custom strategy needs {expected} starting stations, got {got}")]
    MissingCustomStarts { expected: usize, got: usize },
    #[error("unknown starting station: {0}")]
    UnknownStartingStation(StationId),
    #[error("built schedule is invalid: {0}")]
    Invalid(ValidationReport),
}

/// Demande de construction d'un planning
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub id: Option<ScheduleId>,
    pub name: String,
    pub stations: Vec<Station>,
    pub group_count: usize,
    pub players: Vec<PlayerId>,
    pub strategy: Strategy,
    /// Ateliers de départ explicites, un par groupe (stratégie `Custom`).
    pub custom_starts: Vec<StationId>,
    pub rotation_duration: i64,
    pub transition_time: i64,
    pub start_time: Option<DateTime<Utc>>,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            id: None,
            name: String::new(),
            stations: Vec::new(),
            group_count: 1,
            players: Vec::new(),
            strategy: Strategy::Sequential,
            custom_starts: Vec::new(),
            rotation_duration: 900,
            transition_time: 120,
            start_time: None,
        }
    }
}

/// Répartit les joueurs en round-robin dans `group_count` groupes.
pub fn distribute_players(players: &[PlayerId], group_count: usize) -> Vec<Vec<PlayerId>> {
    let mut groups = vec![Vec::new(); group_count];
    if group_count == 0 {
        return groups;
    }
    let mut cursor = 0usize;
    for player in players {
        groups[cursor].push(player.clone());
        cursor = (cursor + 1) % group_count;
    }
    groups
}

/// Index de l'atelier de départ de chaque groupe.
///
/// - `Sequential` : groupe i → atelier i mod n
/// - `Staggered` : groupe i → atelier (i * pas) mod n, pas = max(1, n / groupes)
/// - `Custom` : ateliers fournis, vérifiés
pub fn starting_stations(
    stations: &[StationId],
    group_count: usize,
    strategy: Strategy,
    custom: &[StationId],
) -> Result<Vec<StationId>, BuildError> {
    if stations.is_empty() {
        return Err(BuildError::NoStations);
    }
    if group_count == 0 {
        return Err(BuildError::NoGroups);
    }
    let n = stations.len();
    match strategy {
        Strategy::Sequential => Ok((0..group_count)
            .map(|i| stations[i % n].clone())
            .collect()),
        Strategy::Staggered => {
            let step = (n / group_count).max(1);
            Ok((0..group_count)
                .map(|i| stations[(i * step) % n].clone())
                .collect())
        }
        Strategy::Custom => {
            if custom.len() != group_count {
                return Err(BuildError::MissingCustomStarts {
                    expected: group_count,
                    got: custom.len(),
                });
            }
            if let Some(unknown) = custom.iter().find(|s| !stations.contains(s)) {
                return Err(BuildError::UnknownStartingStation(unknown.clone()));
            }
            Ok(custom.to_vec())
        }
    }
}

/// Construit et valide un planning complet.
pub fn build_schedule(req: BuildRequest) -> Result<RotationSchedule, BuildError> {
    let order: Vec<StationId> = req.stations.iter().map(|s| s.id.clone()).collect();
    let starts = starting_stations(&order, req.group_count, req.strategy, &req.custom_starts)?;
    let rosters = distribute_players(&req.players, req.group_count);

    let groups = starts
        .into_iter()
        .zip(rosters)
        .enumerate()
        .map(|(i, (start, players))| {
            Group::new(format!("g{}", i + 1), format!("Groupe {}", i + 1), start, order.clone())
                .with_players(players)
        })
        .collect();

    let schedule = RotationSchedule {
        id: req.id.unwrap_or_else(ScheduleId::random),
        name: req.name,
        stations: req.stations,
        groups,
        rotation_duration: req.rotation_duration,
        transition_time: req.transition_time,
        rotation_order: order,
        start_time: req.start_time,
        strategy: req.strategy,
    };

    let report = validation::validate(&schedule);
    if !report.is_valid {
        return Err(BuildError::Invalid(report));
    }
    Ok(schedule)
}
