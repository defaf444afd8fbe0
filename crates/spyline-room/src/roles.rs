//! Role assignment engine.
//!
//! Picks a real location, deals out spies without replacement, and
//! hands every spy a decoy location guaranteed to differ from the real
//! one. The handouts are unicast material — the caller must never
//! broadcast them.

use std::collections::HashSet;

use rand::Rng;
use rand::seq::index;
use spyline_protocol::{PlayerId, Role};

use crate::catalog;

/// The result of dealing one round.
#[derive(Debug, Clone)]
pub struct Assignment {
    /// The round's real location, kept on the room for the final
    /// outcome broadcast.
    pub location: &'static str,

    /// Who the spies are this round.
    pub spies: HashSet<PlayerId>,

    /// Per-player role and visible location, in player order.
    pub handouts: Vec<(PlayerId, Role, &'static str)>,
}

/// Deals roles and locations for one round.
///
/// `spy_count` is clamped so at least two civilians remain — a round
/// where (almost) everyone is a spy has no meaningful vote. Callers
/// guarantee `players.len() >= 3`.
pub fn assign(
    players: &[PlayerId],
    spy_count: usize,
    rng: &mut impl Rng,
) -> Assignment {
    let spy_count = spy_count.clamp(1, players.len().saturating_sub(2));

    let location = catalog::pick_real(rng);
    let spy_indices: HashSet<usize> =
        index::sample(rng, players.len(), spy_count).into_iter().collect();

    let mut spies = HashSet::with_capacity(spy_count);
    let mut handouts = Vec::with_capacity(players.len());
    for (i, &id) in players.iter().enumerate() {
        if spy_indices.contains(&i) {
            spies.insert(id);
            handouts.push((id, Role::Spy, catalog::pick_decoy(rng, location)));
        } else {
            handouts.push((id, Role::Civilian, location));
        }
    }

    Assignment {
        location,
        spies,
        handouts,
    }
}
