use super::RotationError;
use crate::model::{Group, StationId};

/// Position de `starting_station` dans l'ordre de rotation du groupe.
fn starting_index(group: &Group) -> Result<usize, RotationError> {
    if group.rotation_order.is_empty() {
        return Err(RotationError::InvalidRotationOrder(group.id.clone()));
    }
    group
        .rotation_order
        .iter()
        .position(|s| s == &group.starting_station)
        .ok_or_else(|| RotationError::InvalidRotationOrder(group.id.clone()))
}

/// Atelier occupé par `group` à la rotation `rotation_index` (négatif accepté).
pub fn station_for(group: &Group, rotation_index: i64) -> Result<&StationId, RotationError> {
    let start = starting_index(group)?;
    let len = group.rotation_order.len() as i64;
    // rem_euclid : jamais de modulo négatif
    let idx = (start as i64 + rotation_index.rem_euclid(len)).rem_euclid(len);
    Ok(&group.rotation_order[idx as usize])
}

pub fn next_station_for(group: &Group, rotation_index: i64) -> Result<&StationId, RotationError> {
    station_for(group, rotation_index.saturating_add(1))
}

pub fn previous_station_for(
    group: &Group,
    rotation_index: i64,
) -> Result<&StationId, RotationError> {
    station_for(group, rotation_index.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Group;

    fn group(start: &str, order: &[&str]) -> Group {
        Group::new(
            "g",
            "G",
            StationId::new(start),
            order.iter().map(|s| StationId::new(s)).collect(),
        )
    }

    #[test]
    fn follows_rotation_order_from_start() {
        let g = group("c", &["a", "b", "c", "d"]);
        let seen: Vec<&str> = (0..6)
            .map(|k| station_for(&g, k).unwrap().as_str())
            .collect();
        assert_eq!(seen, ["c", "d", "a", "b", "c", "d"]);
    }

    #[test]
    fn negative_indices_wrap() {
        let g = group("a", &["a", "b", "c"]);
        assert_eq!(station_for(&g, -1).unwrap().as_str(), "c");
        assert_eq!(station_for(&g, -4).unwrap().as_str(), "c");
        assert_eq!(previous_station_for(&g, 0).unwrap().as_str(), "c");
        assert_eq!(next_station_for(&g, 2).unwrap().as_str(), "a");
    }

    #[test]
    fn matches_modulo_formula_for_all_k() {
        let order = ["a", "b", "c", "d", "e"];
        for (i0, start) in order.iter().enumerate() {
            let g = group(start, &order);
            for k in -12i64..12 {
                let expected = order[(i0 as i64 + k).rem_euclid(order.len() as i64) as usize];
                assert_eq!(station_for(&g, k).unwrap().as_str(), expected);
            }
        }
    }

    #[test]
    fn rejects_broken_orders() {
        let empty = group("a", &[]);
        assert!(matches!(
            station_for(&empty, 0),
            Err(RotationError::InvalidRotationOrder(_))
        ));
        let missing = group("z", &["a", "b"]);
        assert!(station_for(&missing, 0).is_err());
    }
}
