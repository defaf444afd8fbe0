//! Room lifecycle and game logic for Spyline.
//!
//! Each room runs as an isolated Tokio task (actor model) owning its
//! phase machine, membership, votes, and the single pending phase
//! deadline. The registry is the only shared structure.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates/destroys rooms, routes players
//! - [`Room`] — one session's state and phase machine
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`GameCommand`] — in-room commands, already decoded
//! - [`GameConfig`] — timing and sizing knobs

mod actor;
mod catalog;
mod config;
mod error;
mod player;
mod registry;
mod roles;
mod room;
mod scoring;
mod tally;

pub use actor::{PlayerSender, RoomHandle, RoomStatus, spawn_room};
pub use config::GameConfig;
pub use error::RoomError;
pub use player::Player;
pub use registry::RoomRegistry;
pub use room::{GameCommand, Outgoing, Phase, Room};
