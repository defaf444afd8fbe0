//! Scoring policy.

use std::collections::HashSet;

use spyline_protocol::PlayerId;

use crate::Player;

/// Points a civilian earns when the spy is caught.
const CIVILIAN_REWARD: u32 = 1;
/// Points a spy earns when the room fails to catch them.
const SPY_REWARD: u32 = 2;

/// Applies one round's score deltas in place.
///
/// Spy caught: every non-spy gains one point. Spy evades: every spy
/// gains two. Scores never decrease.
pub fn apply(players: &mut [Player], spies: &HashSet<PlayerId>, spy_caught: bool) {
    for player in players {
        let is_spy = spies.contains(&player.id);
        if spy_caught && !is_spy {
            player.score += CIVILIAN_REWARD;
        } else if !spy_caught && is_spy {
            player.score += SPY_REWARD;
        }
    }
}
