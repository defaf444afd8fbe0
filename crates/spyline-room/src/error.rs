//! Error types for the room layer.

use spyline_protocol::{ErrorKind, PlayerId, RoomCode};

/// Errors that can occur during room operations.
///
/// All of these are local to one command: they produce an error event
/// for the issuing connection and leave room state untouched.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The display name was empty after trimming.
    #[error("display name is empty")]
    InvalidName,

    /// No live room has this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room already left its lobby; late joins are not allowed.
    #[error("room {0} has already started")]
    RoomAlreadyStarted(RoomCode),

    /// A host-only command was issued by someone else.
    #[error("player {0} is not the host")]
    NotHost(PlayerId),

    /// Too few players to start a round.
    #[error("need at least {required} players, have {present}")]
    InsufficientPlayers { required: usize, present: usize },

    /// The connection is not in any room.
    #[error("player {0} is not in any room")]
    NotInRoom(PlayerId),

    /// The room's command channel is closed — the actor is gone.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

impl RoomError {
    /// The wire-level kind reported to the client.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidName => ErrorKind::InvalidName,
            Self::RoomNotFound(_) => ErrorKind::RoomNotFound,
            Self::RoomAlreadyStarted(_) => ErrorKind::RoomAlreadyStarted,
            Self::NotHost(_) => ErrorKind::NotHost,
            Self::InsufficientPlayers { .. } => ErrorKind::InsufficientPlayers,
            Self::NotInRoom(_) => ErrorKind::NotInRoom,
            // A vanished room looks the same as an unknown one from the
            // client's side.
            Self::Unavailable(_) => ErrorKind::RoomNotFound,
        }
    }
}
