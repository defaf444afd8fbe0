//! Static location catalog.
//!
//! Pure lookup, no state. Civilians are told the round's real location;
//! each spy is handed a decoy drawn from the same list, resampled until
//! it differs from the real one.

use rand::Rng;

/// Every location a round can be set in.
pub const LOCATIONS: &[&str] = &[
    "Airport",
    "Amusement Park",
    "Beach",
    "Casino",
    "Cinema",
    "Cruise Ship",
    "Hospital",
    "Hotel",
    "Library",
    "Military Base",
    "Museum",
    "Night Club",
    "Office",
    "Police Station",
    "Restaurant",
    "School",
    "Shopping Mall",
    "Sports Stadium",
    "Train Station",
    "Zoo",
];

/// Picks the round's real location uniformly at random.
pub fn pick_real(rng: &mut impl Rng) -> &'static str {
    LOCATIONS[rng.random_range(0..LOCATIONS.len())]
}

/// Picks a decoy location guaranteed to differ from `real`.
///
/// Resamples on collision; with a catalog this size the loop is all but
/// guaranteed to terminate on the first or second draw.
pub fn pick_decoy(rng: &mut impl Rng, real: &str) -> &'static str {
    loop {
        let candidate = LOCATIONS[rng.random_range(0..LOCATIONS.len())];
        if candidate != real {
            return candidate;
        }
    }
}
