//! Validation structurelle et de capacité d'un planning, avant exécution.
//!
//! Déterministe et sans effet de bord : les erreurs bloquent l'exécution,
//! les avertissements sont seulement rapportés.

use crate::model::{GroupId, RotationSchedule, StationId};
use crate::rotation;
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    // erreurs
    #[error("schedule needs at least 2 stations, found {0}")]
    TooFewStations(usize),
    #[error("schedule has no group")]
    NoGroups,
    #[error("duplicate station id: {0}")]
    DuplicateStation(StationId),
    #[error("duplicate group id: {0}")]
    DuplicateGroup(GroupId),
    #[error("station {0} must have a positive capacity")]
    StationCapacity(StationId),
    #[error("group {0} has an empty rotation order")]
    EmptyRotationOrder(GroupId),
    #[error("group {0} rotation order needs at least 2 stations")]
    RotationOrderTooShort(GroupId),
    #[error("group {group} visits station {station} more than once")]
    RepeatedStation { group: GroupId, station: StationId },
    #[error("group {0} starting station is not in its rotation order")]
    StartingStationNotInOrder(GroupId),
    #[error("group {group} references unknown station {station}")]
    UnknownStation { group: GroupId, station: StationId },
    #[error("global rotation order references unknown station {0}")]
    UnknownGlobalStation(StationId),
    #[error("rotation duration must be > 0 (got {0}s)")]
    RotationDuration(i64),
    #[error("transition time must be >= 0 (got {0}s)")]
    TransitionTime(i64),

    // avertissements
    #[error("group {group} has only {players} player(s)")]
    SmallGroup { group: GroupId, players: usize },
    #[error("{players} players assigned for a total station capacity of {capacity}")]
    OverCapacity { players: usize, capacity: u64 },
    #[error("group {group} ({players} players) exceeds capacity {capacity} of station {station}")]
    GroupExceedsStation {
        group: GroupId,
        station: StationId,
        players: usize,
        capacity: i64,
    },
    #[error("transition time ({transition}s) is not shorter than rotation duration ({rotation}s)")]
    TransitionTooLong { transition: i64, rotation: i64 },
}

/// Résultat de `validate`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub warnings: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.errors.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

pub fn validate(schedule: &RotationSchedule) -> ValidationReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    if schedule.stations.len() < 2 {
        errors.push(ValidationIssue::TooFewStations(schedule.stations.len()));
    }
    if schedule.groups.is_empty() {
        errors.push(ValidationIssue::NoGroups);
    }

    let mut known: HashSet<&StationId> = HashSet::new();
    for station in &schedule.stations {
        if !known.insert(&station.id) {
            errors.push(ValidationIssue::DuplicateStation(station.id.clone()));
        }
        if station.capacity <= 0 {
            errors.push(ValidationIssue::StationCapacity(station.id.clone()));
        }
    }

    let mut group_ids: HashSet<&GroupId> = HashSet::new();
    for group in &schedule.groups {
        if !group_ids.insert(&group.id) {
            errors.push(ValidationIssue::DuplicateGroup(group.id.clone()));
        }
        check_group_structure(group, &known, &mut errors);
    }

    for station in &schedule.rotation_order {
        if !known.contains(station) {
            errors.push(ValidationIssue::UnknownGlobalStation(station.clone()));
        }
    }

    if schedule.rotation_duration <= 0 {
        errors.push(ValidationIssue::RotationDuration(schedule.rotation_duration));
    }
    if schedule.transition_time < 0 {
        errors.push(ValidationIssue::TransitionTime(schedule.transition_time));
    }

    collect_warnings(schedule, &mut warnings);

    ValidationReport {
        is_valid: errors.is_empty(),
        errors,
        warnings,
    }
}

fn check_group_structure(
    group: &crate::model::Group,
    known: &HashSet<&StationId>,
    errors: &mut Vec<ValidationIssue>,
) {
    if group.rotation_order.is_empty() {
        errors.push(ValidationIssue::EmptyRotationOrder(group.id.clone()));
        return;
    }
    if group.rotation_order.len() < 2 {
        errors.push(ValidationIssue::RotationOrderTooShort(group.id.clone()));
    }

    let mut seen = HashSet::new();
    for station in &group.rotation_order {
        if !seen.insert(station) {
            errors.push(ValidationIssue::RepeatedStation {
                group: group.id.clone(),
                station: station.clone(),
            });
        }
        if !known.contains(station) {
            errors.push(ValidationIssue::UnknownStation {
                group: group.id.clone(),
                station: station.clone(),
            });
        }
    }

    if !known.contains(&group.starting_station) {
        errors.push(ValidationIssue::UnknownStation {
            group: group.id.clone(),
            station: group.starting_station.clone(),
        });
    } else if !group.rotation_order.contains(&group.starting_station) {
        errors.push(ValidationIssue::StartingStationNotInOrder(group.id.clone()));
    }
}

fn collect_warnings(schedule: &RotationSchedule, warnings: &mut Vec<ValidationIssue>) {
    for group in &schedule.groups {
        if group.players.len() <= 1 {
            warnings.push(ValidationIssue::SmallGroup {
                group: group.id.clone(),
                players: group.players.len(),
            });
        }
    }

    let players = schedule.total_players();
    let capacity = schedule.total_capacity();
    if players as u64 > capacity {
        warnings.push(ValidationIssue::OverCapacity { players, capacity });
    }

    let total = schedule.total_rotations() as i64;
    for group in &schedule.groups {
        let mut visited: Vec<&StationId> = Vec::new();
        for k in 0..total {
            // ordre invalide : déjà signalé en erreur
            let Ok(id) = rotation::station_for(group, k) else {
                break;
            };
            if visited.contains(&id) {
                continue;
            }
            visited.push(id);
            if let Some(station) = schedule.find_station(id) {
                if group.players.len() as i64 > station.capacity {
                    warnings.push(ValidationIssue::GroupExceedsStation {
                        group: group.id.clone(),
                        station: id.clone(),
                        players: group.players.len(),
                        capacity: station.capacity,
                    });
                }
            }
        }
    }

    if schedule.rotation_duration > 0 && schedule.transition_time >= schedule.rotation_duration {
        warnings.push(ValidationIssue::TransitionTooLong {
            transition: schedule.transition_time,
            rotation: schedule.rotation_duration,
        });
    }
}
