//! Vote tally engine: plurality with a uniform random tie-break.

use std::collections::{HashMap, HashSet};

use rand::Rng;
use spyline_protocol::PlayerId;

/// The result of resolving one round's votes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// The player the room selected, if any votes were cast.
    pub selected: Option<PlayerId>,
    /// Whether the selected player was one of the round's spies.
    pub spy_caught: bool,
}

/// Resolves a votes map (voter → target, `None` = abstention).
///
/// The target with the most votes is selected; a tie at the maximum is
/// broken uniformly at random — deliberate policy, not an error. If no
/// votes were cast at all, nobody is selected and the spies evade.
pub fn tally(
    votes: &HashMap<PlayerId, Option<PlayerId>>,
    spies: &HashSet<PlayerId>,
    rng: &mut impl Rng,
) -> Outcome {
    let mut counts: HashMap<PlayerId, usize> = HashMap::new();
    for target in votes.values().flatten() {
        *counts.entry(*target).or_default() += 1;
    }

    let Some(&max) = counts.values().max() else {
        return Outcome {
            selected: None,
            spy_caught: false,
        };
    };

    let tied: Vec<PlayerId> = counts
        .iter()
        .filter(|(_, count)| **count == max)
        .map(|(id, _)| *id)
        .collect();
    let selected = tied[rng.random_range(0..tied.len())];

    Outcome {
        selected: Some(selected),
        spy_caught: spies.contains(&selected),
    }
}
