//! Per-player state inside a room.

use spyline_protocol::{PlayerId, PlayerSummary, Role};

/// A player's record in a room. Created on join, destroyed on
/// disconnect or room teardown.
#[derive(Debug, Clone)]
pub struct Player {
    /// Connection-scoped identity.
    pub id: PlayerId,

    /// Display name, already trimmed and non-empty.
    pub name: String,

    /// Session score. Monotonically non-decreasing.
    pub score: u32,

    /// Hidden role for the current round, `None` in the lobby and
    /// between rounds.
    pub role: Option<Role>,

    /// The location this player was told — possibly the decoy.
    pub location: Option<String>,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            role: None,
            location: None,
        }
    }

    /// Clears round-scoped state, keeping the score.
    pub fn clear_round(&mut self) {
        self.role = None;
        self.location = None;
    }

    /// The wire-visible view of this player.
    pub fn summary(&self, host_id: PlayerId) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            name: self.name.clone(),
            score: self.score,
            is_host: self.id == host_id,
        }
    }
}
