//! Projection des séances : atelier + groupe → enregistrement de séance éphémère.

use crate::model::{
    string_id, Group, GroupId, PlayerId, RotationSchedule, ScheduleId, Station, StationId, Workout,
};
use crate::rotation::{self, RotationError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

string_id!(
    /// Identifiant d'une séance projetée
    SessionId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Active,
    Completed,
}

/// Contexte de rotation recopié dans chaque séance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationContext {
    pub schedule_id: ScheduleId,
    pub station_id: StationId,
    pub group_id: GroupId,
    pub rotation_index: usize,
    pub next_station_id: StationId,
    pub previous_station_id: StationId,
    /// Secondes avant la prochaine rotation.
    pub time_until_rotation: i64,
}

/// Séance d'entraînement d'un groupe sur un atelier, pour une rotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub station_name: String,
    pub group_name: String,
    pub players: Vec<PlayerId>,
    pub workout: Workout,
    pub status: SessionStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Secondes effectivement écoulées (ticks), pauses exclues.
    pub actual_duration: Option<i64>,
    pub rotation_context: RotationContext,
}

/// Paramètres communs à toutes les séances d'une rotation.
#[derive(Debug, Clone)]
pub struct ProjectionContext<'a> {
    pub schedule_id: &'a ScheduleId,
    pub rotation_index: usize,
    pub time_until_rotation: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    #[error(transparent)]
    Rotation(#[from] RotationError),
    #[error("unknown station: {0}")]
    UnknownStation(StationId),
}

/// Projette une séance. Fonction pure : aucun état du moteur n'est touché,
/// la séance démarre `Pending`.
pub fn project(
    group: &Group,
    station: &Station,
    ctx: &ProjectionContext<'_>,
) -> Result<SessionRecord, RotationError> {
    let index = ctx.rotation_index as i64;
    let next = rotation::next_station_for(group, index)?;
    let previous = rotation::previous_station_for(group, index)?;

    Ok(SessionRecord {
        id: SessionId::new(format!(
            "{}-r{}-{}",
            ctx.schedule_id, ctx.rotation_index, group.id
        )),
        station_name: station.name.clone(),
        group_name: group.name.clone(),
        players: group.players.clone(),
        workout: station.workout.clone(),
        status: SessionStatus::Pending,
        started_at: None,
        ended_at: None,
        actual_duration: None,
        rotation_context: RotationContext {
            schedule_id: ctx.schedule_id.clone(),
            station_id: station.id.clone(),
            group_id: group.id.clone(),
            rotation_index: ctx.rotation_index,
            next_station_id: next.clone(),
            previous_station_id: previous.clone(),
            time_until_rotation: ctx.time_until_rotation,
        },
    })
}

/// Projette les séances de tous les groupes pour `rotation_index`.
pub fn project_rotation(
    schedule: &RotationSchedule,
    rotation_index: usize,
) -> Result<Vec<SessionRecord>, ProjectionError> {
    let ctx = ProjectionContext {
        schedule_id: &schedule.id,
        rotation_index,
        time_until_rotation: schedule.rotation_duration,
    };
    schedule
        .groups
        .iter()
        .map(|group| -> Result<SessionRecord, ProjectionError> {
            let station_id = rotation::station_for(group, rotation_index as i64)?;
            let station = schedule
                .find_station(station_id)
                .ok_or_else(|| ProjectionError::UnknownStation(station_id.clone()))?;
            Ok(project(group, station, &ctx)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Strategy;

    fn schedule() -> RotationSchedule {
        let order: Vec<StationId> = vec!["a".into(), "b".into(), "c".into()];
        RotationSchedule {
            id: "sched".into(),
            name: "Circuit".into(),
            stations: vec![
                Station::new("a", "Squat", 6)
                    .with_workout(Workout::Strength(serde_json::json!({ "sets": 5 }))),
                Station::new("b", "Sprint", 6),
                Station::new("c", "Mobilité", 6),
            ],
            groups: vec![
                Group::new("g1", "Rouges", "a".into(), order.clone())
                    .with_players(vec!["p1".into(), "p2".into()]),
                Group::new("g2", "Bleus", "c".into(), order.clone()),
            ],
            rotation_duration: 600,
            transition_time: 60,
            rotation_order: order,
            start_time: None,
            strategy: Strategy::Staggered,
        }
    }

    #[test]
    fn copies_payload_players_and_context() {
        let s = schedule();
        let ctx = ProjectionContext {
            schedule_id: &s.id,
            rotation_index: 0,
            time_until_rotation: 600,
        };
        let rec = project(&s.groups[0], &s.stations[0], &ctx).unwrap();
        assert_eq!(rec.status, SessionStatus::Pending);
        assert_eq!(rec.players, s.groups[0].players);
        assert_eq!(rec.workout, s.stations[0].workout);
        assert_eq!(rec.rotation_context.next_station_id.as_str(), "b");
        assert_eq!(rec.rotation_context.previous_station_id.as_str(), "c");
        assert_eq!(rec.rotation_context.time_until_rotation, 600);
        assert!(rec.started_at.is_none());
    }

    #[test]
    fn rotation_projection_follows_calculator() {
        let s = schedule();
        let sessions = project_rotation(&s, 1).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].rotation_context.station_id.as_str(), "b");
        assert_eq!(sessions[1].rotation_context.station_id.as_str(), "a");
        assert_eq!(sessions[1].id.as_str(), "sched-r1-g2");
    }

    #[test]
    fn missing_station_is_reported() {
        let mut s = schedule();
        s.stations.retain(|st| st.id.as_str() != "b");
        let err = project_rotation(&s, 1).unwrap_err();
        assert_eq!(err, ProjectionError::UnknownStation("b".into()));
    }
}
