//! Game configuration.

use std::time::Duration;

/// Tunable timing and sizing for a room.
///
/// One config is shared by every room the registry creates. The
/// defaults match the published rules of the game.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Minimum players required to start a round. A two-player room
    /// cannot support a meaningful vote.
    pub min_players: usize,

    /// Spies dealt per round. Clamped so at least two non-spies remain.
    pub spy_count: usize,

    /// Open discussion window in classic mode.
    pub discussion_window: Duration,

    /// Per-player speaking window in lightning mode.
    pub turn_window: Duration,

    /// How many full rotations over the player list lightning mode runs
    /// before voting opens.
    pub rotations: u8,

    /// How long voting stays open before resolving with whatever votes
    /// were cast.
    pub voting_window: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: 3,
            spy_count: 1,
            discussion_window: Duration::from_secs(8 * 60),
            turn_window: Duration::from_secs(10),
            rotations: 2,
            voting_window: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_game_rules() {
        let config = GameConfig::default();
        assert_eq!(config.min_players, 3);
        assert_eq!(config.spy_count, 1);
        assert_eq!(config.discussion_window, Duration::from_secs(480));
        assert_eq!(config.turn_window, Duration::from_secs(10));
        assert_eq!(config.rotations, 2);
        assert_eq!(config.voting_window, Duration::from_secs(30));
    }
}
