//! The room actor: one tokio task per room.
//!
//! The actor owns the [`Room`] and the outbound senders of everyone in
//! it. Commands arrive on a bounded mpsc channel; the phase timer is
//! folded into the same `select!` loop, so room state is only ever
//! touched from this task and needs no locks.

use std::collections::HashMap;

use spyline_protocol::{PlayerId, Recipient, RoomCode, ServerEvent};
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use crate::room::{GameCommand, Outgoing, Room};
use crate::RoomError;

/// Outbound channel for one player's connection. The gateway drains the
/// other end and writes frames to the socket.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Whether the room survived the command that was just handled.
///
/// `Closed` tells the registry to drop its handle and unindex the
/// room's players; the actor task exits on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Open,
    Closed,
}

/// Messages a room actor accepts.
pub enum RoomCommand {
    Join {
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<RoomStatus>,
    },
    Game {
        sender: PlayerId,
        cmd: GameCommand,
        reply: oneshot::Sender<RoomStatus>,
    },
}

/// A cloneable handle to a running room actor.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Asks the actor to admit a player. The player's events start
    /// flowing on `sender` as soon as the join is accepted.
    pub async fn join(
        &self,
        player_id: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply, response) = oneshot::channel();
        let cmd = RoomCommand::Join {
            player_id,
            name,
            sender,
            reply,
        };
        self.send(cmd, response).await?
    }

    /// Removes a player (disconnect or implicit leave).
    pub async fn leave(&self, player_id: PlayerId) -> Result<RoomStatus, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(RoomCommand::Leave { player_id, reply }, response)
            .await
    }

    /// Forwards an in-game command from a member.
    pub async fn game(
        &self,
        sender: PlayerId,
        cmd: GameCommand,
    ) -> Result<RoomStatus, RoomError> {
        let (reply, response) = oneshot::channel();
        self.send(
            RoomCommand::Game {
                sender,
                cmd,
                reply,
            },
            response,
        )
        .await
    }

    async fn send<R>(
        &self,
        cmd: RoomCommand,
        response: oneshot::Receiver<R>,
    ) -> Result<R, RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        response
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// Spawns the actor task for a freshly created room and returns its
/// handle. The host's outbound sender is preloaded and the room's
/// opening events are delivered before any command is accepted.
pub fn spawn_room(
    room: Room,
    host: PlayerId,
    host_sender: PlayerSender,
    channel_size: usize,
) -> RoomHandle {
    let (sender, receiver) = mpsc::channel(channel_size);
    let handle = RoomHandle {
        code: room.code().clone(),
        sender,
    };
    let mut actor = RoomActor {
        room,
        senders: HashMap::from([(host, host_sender)]),
        receiver,
    };
    tokio::spawn(async move {
        actor.dispatch(actor.room.open_events());
        actor.run().await;
    });
    handle
}

struct RoomActor {
    room: Room,
    /// Outbound senders for everyone currently in the room. Kept in
    /// lockstep with the room's membership.
    senders: HashMap<PlayerId, PlayerSender>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(&mut self) {
        loop {
            // The deadline is re-read every iteration, so a command
            // that rewrites or clears it takes effect immediately.
            let deadline = self.room.deadline();
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if self.handle_command(cmd) == RoomStatus::Closed {
                        break;
                    }
                }
                () = wait_until(deadline) => {
                    let events = {
                        let mut rng = rand::rng();
                        self.room.handle_deadline(&mut rng)
                    };
                    self.dispatch(events);
                }
            }
        }
        tracing::debug!(room = %self.room.code(), "room actor stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) -> RoomStatus {
        match cmd {
            RoomCommand::Join {
                player_id,
                name,
                sender,
                reply,
            } => {
                let result = match self.room.join(player_id, &name) {
                    Ok(events) => {
                        self.senders.insert(player_id, sender);
                        self.dispatch(events);
                        Ok(())
                    }
                    Err(err) => Err(err),
                };
                let _ = reply.send(result);
                RoomStatus::Open
            }
            RoomCommand::Leave { player_id, reply } => {
                // Drop the sender first so the batch below is never
                // addressed to the departing connection.
                self.senders.remove(&player_id);
                let events = {
                    let mut rng = rand::rng();
                    self.room.remove_player(player_id, &mut rng)
                };
                self.dispatch(events);
                let status = self.status();
                let _ = reply.send(status);
                status
            }
            RoomCommand::Game { sender, cmd, reply } => {
                let events = {
                    let mut rng = rand::rng();
                    self.room.handle_command(sender, cmd, &mut rng)
                };
                self.dispatch(events);
                let status = self.status();
                let _ = reply.send(status);
                status
            }
        }
    }

    fn status(&self) -> RoomStatus {
        if self.room.is_empty() || self.room.is_ended() {
            RoomStatus::Closed
        } else {
            RoomStatus::Open
        }
    }

    /// Fans an event batch out to its recipients. A send only fails
    /// when the connection is mid-teardown; the disconnect path cleans
    /// the sender up, so failures here are ignored.
    fn dispatch(&self, events: Vec<Outgoing>) {
        for (recipient, event) in events {
            match recipient {
                Recipient::All => {
                    for sender in self.senders.values() {
                        let _ = sender.send(event.clone());
                    }
                }
                Recipient::Player(id) => {
                    if let Some(sender) = self.senders.get(&id) {
                        let _ = sender.send(event.clone());
                    }
                }
            }
        }
    }
}

/// Sleeps until the deadline, or forever when no timer is armed. The
/// surrounding `select!` wakes on the next command either way.
async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
