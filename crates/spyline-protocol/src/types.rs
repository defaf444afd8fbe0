//! Wire types for the Spyline protocol.
//!
//! Everything here is what travels between a game client and the server:
//! the inbound [`ClientCommand`] enum, the outbound [`ServerEvent`] enum,
//! and the identity/summary types they carry. Both enums are internally
//! tagged (`{"type": "createRoom", ...}`) with camelCase field names so a
//! browser client can consume them without any mapping layer.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Unique identifier for a connected player.
///
/// Connection-scoped: a new socket gets a new id, and the id dies with
/// the socket. `#[serde(transparent)]` makes `PlayerId(42)` serialize as
/// the plain number `42`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A short, human-typeable room code, unique among live rooms.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps a raw code string.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// The pacing variant a room was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// One long open discussion window before the vote.
    Classic,
    /// Fixed speaking turns, two rotations over all players.
    Lightning,
}

/// A player's hidden role for the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    /// Knows the real location, tries to unmask the spy.
    Civilian,
    /// Sees a decoy location and must bluff.
    Spy,
}

/// Who should receive a server event.
///
/// Room logic returns `(Recipient, ServerEvent)` pairs; the room actor
/// resolves them against its per-player channels. `Player` is the
/// secrecy boundary — role handouts must never use `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    /// Every player currently in the room.
    All,
    /// One specific player.
    Player(PlayerId),
}

// ---------------------------------------------------------------------------
// Wire payload fragments
// ---------------------------------------------------------------------------

/// One row of the full membership snapshot broadcast to a room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub score: u32,
    pub is_host: bool,
}

/// A candidate in the voting phase. Each recipient's list excludes
/// themself — self-voting is never offered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteTarget {
    pub id: PlayerId,
    pub name: String,
}

/// The error taxonomy exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Display name was empty after trimming.
    InvalidName,
    /// No live room has that code.
    RoomNotFound,
    /// The room left the lobby phase; joining is no longer possible.
    RoomAlreadyStarted,
    /// The command is reserved for the room's host.
    NotHost,
    /// Fewer than the minimum players required to start a round.
    InsufficientPlayers,
    /// The connection issued a room command without being in a room.
    NotInRoom,
}

// ---------------------------------------------------------------------------
// Commands and events
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
///
/// A closed enum rather than a string-keyed handler table: an unknown
/// `type` tag is a decode error, and every dispatcher match is checked
/// exhaustively at compile time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientCommand {
    /// Create a room and become its host.
    CreateRoom { name: String, mode: Mode },

    /// Join an existing room that is still in its lobby.
    JoinRoom { room_code: RoomCode, name: String },

    /// Host only: leave the lobby and deal out roles.
    StartGame,

    /// Cast or replace a vote. `None` is an abstention.
    SubmitVote { target_id: Option<PlayerId> },

    /// Host only: start another round, keeping scores.
    NewRound,

    /// Host only: end the session and crown the top scorer.
    EndGame,
}

/// Everything the server can tell clients.
///
/// Broadcast to the room unless documented as unicast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// The room exists; at this point the host is its only member.
    RoomCreated { room_code: RoomCode, mode: Mode },

    /// A player joined the room's lobby.
    RoomJoined { room_code: RoomCode, mode: Mode },

    /// Full membership snapshot — the single source of client-visible
    /// truth, re-sent after every membership or score mutation.
    MembershipUpdated {
        players: Vec<PlayerSummary>,
        host_id: PlayerId,
    },

    /// Unicast: the recipient's own role and location for this round.
    /// Never broadcast — each player learns only their own assignment.
    RoleAssigned { role: Role, location: String },

    /// Lightning mode: the named player holds the speaking turn.
    TurnStarted {
        player_id: PlayerId,
        turn: usize,
        rotation: u8,
    },

    /// Unicast: voting opened; the list excludes the recipient.
    VotingStarted { voteable_players: Vec<VoteTarget> },

    /// The round's outcome, including updated scores.
    RoundResolved {
        spy_caught: bool,
        selected_name: Option<String>,
        players: Vec<PlayerSummary>,
    },

    /// The session is over; the room is gone after this event.
    GameEnded {
        winner_name: String,
        winner_score: u32,
    },

    /// Unicast: the previous command failed and changed nothing.
    Error { kind: ErrorKind },
}

// =========================================================================
// Tests
// =========================================================================
