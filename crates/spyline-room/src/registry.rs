//! The room registry: the server's front door.
//!
//! Owns the `code → handle` table and the `player → code` index. The
//! gateway holds the registry behind a single async mutex; everything
//! past `RoomHandle` runs inside per-room actor tasks, so registry
//! operations only do cheap map work plus one channel round-trip.

use std::collections::HashMap;

use rand::Rng;
use spyline_protocol::{Mode, PlayerId, RoomCode};

use crate::actor::{spawn_room, PlayerSender, RoomHandle, RoomStatus};
use crate::room::{clean_name, GameCommand, Room};
use crate::{GameConfig, RoomError};

/// Length of a generated room code.
const CODE_LEN: usize = 5;
/// Room-code alphabet. Lowercase so codes read unambiguously in chat.
const CODE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Command-channel depth for each room actor.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Registry of all live rooms.
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, RoomHandle>,
    player_rooms: HashMap<PlayerId, RoomCode>,
    config: GameConfig,
}

impl RoomRegistry {
    pub fn new(config: GameConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            config,
        }
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// The room a player is currently in, if any.
    pub fn player_room(&self, player: PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(&player)
    }

    /// Creates a room with a fresh code and the caller as host.
    ///
    /// A caller already in another room is implicitly removed from it
    /// first, so the player index never points two ways.
    pub async fn create_room(
        &mut self,
        host: PlayerId,
        name: &str,
        mode: Mode,
        sender: PlayerSender,
    ) -> Result<RoomCode, RoomError> {
        // Validate the name before touching any membership state.
        clean_name(name)?;
        self.disconnect(host).await;

        let code = self.generate_code();
        let room = Room::new(code.clone(), mode, self.config.clone(), host, name)?;
        let handle = spawn_room(room, host, sender, DEFAULT_CHANNEL_SIZE);
        self.rooms.insert(code.clone(), handle);
        self.player_rooms.insert(host, code.clone());
        tracing::info!(room = %code, host = %host, ?mode, "room created");
        Ok(code)
    }

    /// Joins an existing room by code.
    pub async fn join_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        name: &str,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        clean_name(name)?;
        if !self.rooms.contains_key(code) {
            return Err(RoomError::RoomNotFound(code.clone()));
        }
        self.disconnect(player).await;

        // Re-fetch: the implicit leave above may have pruned rooms,
        // including (if the player was alone in it) this very one.
        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?
            .clone();
        match handle.join(player, name.to_string(), sender).await {
            Ok(()) => {
                self.player_rooms.insert(player, code.clone());
                Ok(())
            }
            Err(RoomError::Unavailable(_)) => {
                self.prune(code);
                Err(RoomError::RoomNotFound(code.clone()))
            }
            Err(err) => Err(err),
        }
    }

    /// Routes an in-game command to the sender's room.
    pub async fn route_command(
        &mut self,
        player: PlayerId,
        cmd: GameCommand,
    ) -> Result<(), RoomError> {
        let code = self
            .player_rooms
            .get(&player)
            .ok_or(RoomError::NotInRoom(player))?
            .clone();
        let handle = match self.rooms.get(&code) {
            Some(handle) => handle.clone(),
            None => {
                self.player_rooms.remove(&player);
                return Err(RoomError::NotInRoom(player));
            }
        };
        match handle.game(player, cmd).await {
            Ok(RoomStatus::Open) => {}
            Ok(RoomStatus::Closed) | Err(_) => self.prune(&code),
        }
        Ok(())
    }

    /// Removes a player from whatever room they are in. Safe to call
    /// for players in no room; used for both socket teardown and the
    /// implicit leave before creating or joining another room.
    pub async fn disconnect(&mut self, player: PlayerId) {
        let Some(code) = self.player_rooms.remove(&player) else {
            return;
        };
        let Some(handle) = self.rooms.get(&code).cloned() else {
            return;
        };
        match handle.leave(player).await {
            Ok(RoomStatus::Open) => {}
            Ok(RoomStatus::Closed) | Err(_) => self.prune(&code),
        }
    }

    /// Drops a dead room's handle and unindexes its players.
    fn prune(&mut self, code: &RoomCode) {
        self.rooms.remove(code);
        self.player_rooms.retain(|_, c| c != code);
        tracing::info!(room = %code, live = self.rooms.len(), "room closed");
    }

    /// Generates a code no live room is using. Collisions are retried;
    /// with a 36^5 space they are vanishingly rare at any realistic
    /// room count.
    fn generate_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let code: String = (0..CODE_LEN)
                .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
                .collect();
            let code = RoomCode::new(code);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}
