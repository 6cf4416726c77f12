use serde::{Deserialize, Serialize};

/// Déclare un identifiant fort (newtype sur `String`).
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(::uuid::Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }
    };
}
pub(crate) use string_id;

string_id!(
    /// Identifiant d'un atelier
    StationId
);
string_id!(
    /// Identifiant d'un groupe
    GroupId
);
string_id!(
    /// Identifiant d'un joueur (le roster est géré ailleurs)
    PlayerId
);
string_id!(
    /// Identifiant d'un planning de rotation
    ScheduleId
);

/// Contenu d'entraînement d'un atelier. Opaque pour le moteur : il est
/// seulement recopié dans les séances projetées.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Workout {
    Interval(serde_json::Value),
    Strength(serde_json::Value),
    Freeform(serde_json::Value),
    Rest,
}

/// Atelier (poste fixe par lequel passent les groupes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    #[serde(default)]
    pub equipment: String,
    /// Places simultanées ; doit être > 0 (vérifié par `validate`).
    pub capacity: i64,
    pub workout: Workout,
    /// Durée indicative en secondes, ignorée par le moteur.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    /// Couleur d'affichage, ignorée par le moteur.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Station {
    pub fn new<S: AsRef<str>, N: Into<String>>(id: S, name: N, capacity: i64) -> Self {
        Self {
            id: StationId::new(id),
            name: name.into(),
            equipment: String::new(),
            capacity,
            workout: Workout::Rest,
            duration_secs: None,
            color: None,
        }
    }

    pub fn with_workout(mut self, workout: Workout) -> Self {
        self.workout = workout;
        self
    }
}

/// Groupe de joueurs qui se déplace d'un atelier à l'autre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub players: Vec<PlayerId>,
    pub starting_station: StationId,
    /// Cycle d'ateliers ; contient `starting_station` exactement une fois.
    pub rotation_order: Vec<StationId>,
}

impl Group {
    pub fn new<S: AsRef<str>, N: Into<String>>(
        id: S,
        name: N,
        starting_station: StationId,
        rotation_order: Vec<StationId>,
    ) -> Self {
        Self {
            id: GroupId::new(id),
            name: name.into(),
            players: Vec::new(),
            starting_station,
            rotation_order,
        }
    }

    pub fn with_players(mut self, players: Vec<PlayerId>) -> Self {
        self.players = players;
        self
    }
}

/// Stratégie d'affectation des ateliers de départ. N'influence que le
/// builder, jamais l'exécution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    #[default]
    Sequential,
    Staggered,
    Custom,
}

/// Planning de rotation complet, immuable une fois remis au moteur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationSchedule {
    pub id: ScheduleId,
    pub name: String,
    pub stations: Vec<Station>,
    pub groups: Vec<Group>,
    /// Durée d'une rotation, en secondes.
    pub rotation_duration: i64,
    /// Temps de transition entre deux rotations, en secondes.
    #[serde(default)]
    pub transition_time: i64,
    /// Ordre global ; sa longueur donne le nombre de rotations. Vide = ordre
    /// des ateliers.
    #[serde(default)]
    pub rotation_order: Vec<StationId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub strategy: Strategy,
}

impl RotationSchedule {
    pub fn find_station(&self, id: &StationId) -> Option<&Station> {
        self.stations.iter().find(|s| &s.id == id)
    }
    pub fn find_group(&self, id: &GroupId) -> Option<&Group> {
        self.groups.iter().find(|g| &g.id == id)
    }

    /// Nombre total de rotations à exécuter.
    pub fn total_rotations(&self) -> usize {
        if self.rotation_order.is_empty() {
            self.stations.len()
        } else {
            self.rotation_order.len()
        }
    }

    pub fn total_capacity(&self) -> u64 {
        self.stations
            .iter()
            .map(|s| u64::try_from(s.capacity).unwrap_or(0))
            .sum()
    }

    pub fn total_players(&self) -> usize {
        self.groups.iter().map(|g| g.players.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_rotations_falls_back_to_station_count() {
        let mut schedule = RotationSchedule {
            id: ScheduleId::new("s"),
            name: "s".into(),
            stations: vec![Station::new("a", "A", 4), Station::new("b", "B", 4)],
            groups: vec![],
            rotation_duration: 60,
            transition_time: 0,
            rotation_order: vec![],
            start_time: None,
            strategy: Strategy::Sequential,
        };
        assert_eq!(schedule.total_rotations(), 2);
        schedule.rotation_order = vec!["a".into(), "b".into(), "a".into(), "b".into()];
        assert_eq!(schedule.total_rotations(), 4);
        assert_eq!(schedule.total_capacity(), 8);
    }

    #[test]
    fn workout_payload_is_tagged() {
        let w = Workout::Interval(serde_json::json!({ "rounds": 3 }));
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["type"], "interval");
        assert_eq!(json["data"]["rounds"], 3);
    }
}
