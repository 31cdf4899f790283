//! Player registry entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a player in [`BoardState::players`](super::BoardState::players).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u16);

impl PlayerId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// A player. Adjudication compares identities only; name and color are
/// carried for the collaborators that render and report results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub color: String,
    /// The player this one is vassal to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liege: Option<PlayerId>,
}

impl Player {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        Player {
            name: name.into(),
            color: color.into(),
            liege: None,
        }
    }
}
