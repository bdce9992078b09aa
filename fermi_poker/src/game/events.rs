use serde::{Deserialize, Serialize};
use std::fmt::{self};

/// Which table of the game's data a [`Change`] touched.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Game,
    Question,
    Player,
    Hint,
    Bet,
    Guess,
    Standing,
    Prediction,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Game => "game",
            Self::Question => "question",
            Self::Player => "player",
            Self::Hint => "hint",
            Self::Bet => "bet",
            Self::Guess => "guess",
            Self::Standing => "standing",
            Self::Prediction => "prediction",
        };
        write!(f, "{repr}")
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
}

/// One mutation the engine performed, published so connected clients know
/// to refresh. Guesses, standings, and predictions are keyed by the
/// owning player's id; everything else by its own row id.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Change {
    pub entity: EntityKind,
    pub entity_id: i64,
    pub kind: ChangeKind,
}

impl Change {
    #[must_use]
    pub fn inserted(entity: EntityKind, entity_id: i64) -> Self {
        Self {
            entity,
            entity_id,
            kind: ChangeKind::Inserted,
        }
    }

    #[must_use]
    pub fn updated(entity: EntityKind, entity_id: i64) -> Self {
        Self {
            entity,
            entity_id,
            kind: ChangeKind::Updated,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ChangeKind::Inserted => "inserted",
            ChangeKind::Updated => "updated",
        };
        write!(f, "{} {} {}", self.entity, self.entity_id, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_constructors() {
        let change = Change::inserted(EntityKind::Bet, 42);
        assert_eq!(change.kind, ChangeKind::Inserted);
        assert_eq!(change.to_string(), "bet 42 inserted");

        let change = Change::updated(EntityKind::Player, 7);
        assert_eq!(change.kind, ChangeKind::Updated);
        assert_eq!(change.to_string(), "player 7 updated");
    }

    #[test]
    fn test_change_wire_shape() {
        let json = serde_json::to_value(Change::updated(EntityKind::Question, 3)).unwrap();
        assert_eq!(json["entity"], "question");
        assert_eq!(json["entity_id"], 3);
        assert_eq!(json["kind"], "updated");
    }
}
