//! Maps decoded client commands onto registry operations.
//!
//! Room-level rejections (wrong phase, not host, too few players) are
//! unicast from inside the room actor; everything surfacing here failed
//! before any room got involved, so the error event is sent straight to
//! the issuing connection.

use spyline_protocol::{ClientCommand, PlayerId, ServerEvent};
use spyline_room::{GameCommand, PlayerSender, RoomError, RoomRegistry};
use tokio::sync::Mutex;

/// Applies one command from a connection.
pub async fn dispatch(
    registry: &Mutex<RoomRegistry>,
    player: PlayerId,
    cmd: ClientCommand,
    sender: &PlayerSender,
) {
    let result = match cmd {
        ClientCommand::CreateRoom { name, mode } => registry
            .lock()
            .await
            .create_room(player, &name, mode, sender.clone())
            .await
            .map(|_| ()),
        ClientCommand::JoinRoom { room_code, name } => {
            registry
                .lock()
                .await
                .join_room(player, &room_code, &name, sender.clone())
                .await
        }
        ClientCommand::StartGame => route(registry, player, GameCommand::Start).await,
        ClientCommand::SubmitVote { target_id } => {
            route(registry, player, GameCommand::Vote { target: target_id }).await
        }
        ClientCommand::NewRound => route(registry, player, GameCommand::NewRound).await,
        ClientCommand::EndGame => route(registry, player, GameCommand::EndGame).await,
    };

    if let Err(err) = result {
        tracing::debug!(%player, error = %err, "command refused");
        let _ = sender.send(ServerEvent::Error { kind: err.kind() });
    }
}

async fn route(
    registry: &Mutex<RoomRegistry>,
    player: PlayerId,
    cmd: GameCommand,
) -> Result<(), RoomError> {
    registry.lock().await.route_command(player, cmd).await
}
