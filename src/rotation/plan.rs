use super::{calculator, RotationError};
use crate::model::{GroupId, RotationSchedule, StationId};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Affectation groupe → atelier pour une rotation donnée.
pub type Positions = BTreeMap<GroupId, StationId>;

/// Une ligne du plan de rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RotationStep {
    pub index: usize,
    pub positions: Positions,
}

/// Calcule toutes les positions pour `rotation_index`. Tout ou rien : une
/// seule erreur et aucune position n'est rendue.
pub fn positions_for(
    schedule: &RotationSchedule,
    rotation_index: i64,
) -> Result<Positions, RotationError> {
    schedule
        .groups
        .iter()
        .map(|g| {
            calculator::station_for(g, rotation_index).map(|s| (g.id.clone(), s.clone()))
        })
        .collect()
}

/// Plan complet, une entrée par rotation.
pub fn plan(schedule: &RotationSchedule) -> Result<Vec<RotationStep>, RotationError> {
    (0..schedule.total_rotations())
        .map(|index| {
            positions_for(schedule, index as i64).map(|positions| RotationStep { index, positions })
        })
        .collect()
}

/// Rendu texte compact du plan (une ligne par rotation, numérotée à partir de 1).
pub fn render_plan(schedule: &RotationSchedule) -> Result<String, RotationError> {
    let steps = plan(schedule)?;
    let mut out = String::new();
    for (n, step) in steps.iter().enumerate() {
        if n > 0 {
            out.push('\n');
        }
        let _ = write!(out, "rotation {}", step.index + 1);
        for (group, station) in &step.positions {
            let _ = write!(out, " | {group} -> {station}");
        }
    }
    Ok(out)
}
