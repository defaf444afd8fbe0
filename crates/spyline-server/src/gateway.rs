//! WebSocket gateway: accepts connections and bridges them to rooms.
//!
//! Each accepted socket gets a fresh [`PlayerId`] and its own handler
//! task. A second task per connection drains the player's event channel
//! onto the socket, so a slow reader never blocks a room actor.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use spyline_protocol::{ClientCommand, Codec, JsonCodec, PlayerId, ServerEvent};
use spyline_room::{GameConfig, RoomRegistry};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;

use crate::dispatcher;

/// Counter for handing out connection-scoped player ids.
static NEXT_PLAYER_ID: AtomicU64 = AtomicU64::new(1);

/// A bound Spyline server. Call [`run`](Self::run) to start accepting.
pub struct Server {
    listener: TcpListener,
    registry: Arc<Mutex<RoomRegistry>>,
}

impl Server {
    pub async fn bind(addr: &str, config: GameConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr, "gateway listening");
        Ok(Self {
            listener,
            registry: Arc::new(Mutex::new(RoomRegistry::new(config))),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> std::io::Result<()> {
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let registry = Arc::clone(&self.registry);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, registry).await {
                            tracing::debug!(%addr, error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// Handles one socket from accept to disconnect.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: Arc<Mutex<RoomRegistry>>,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let ws = tokio_tungstenite::accept_async(stream).await?;
    let player = PlayerId(NEXT_PLAYER_ID.fetch_add(1, Ordering::Relaxed));
    tracing::info!(%player, %addr, "connection accepted");

    let (mut write, mut read) = ws.split();
    let (sender, mut events) = mpsc::unbounded_channel::<ServerEvent>();

    // Writer task: the room actor and the dispatcher both feed this
    // channel; only this task touches the socket's write half.
    let writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let bytes = match JsonCodec.encode(&event) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::error!(error = %e, "event encode failed");
                    continue;
                }
            };
            if write.send(Message::Binary(bytes.into())).await.is_err() {
                break;
            }
        }
        let _ = write.close().await;
    });

    while let Some(message) = read.next().await {
        let data = match message {
            Ok(Message::Binary(data)) => data.to_vec(),
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping/pong/frame
            Err(e) => {
                tracing::debug!(%player, error = %e, "socket error");
                break;
            }
        };

        let cmd: ClientCommand = match JsonCodec.decode(&data) {
            Ok(cmd) => cmd,
            Err(e) => {
                tracing::debug!(%player, error = %e, "undecodable command dropped");
                continue;
            }
        };

        dispatcher::dispatch(&registry, player, cmd, &sender).await;
    }

    // Socket gone: leave whatever room the player was in. Once the
    // room drops its sender clone too, the writer drains and exits.
    registry.lock().await.disconnect(player).await;
    drop(sender);
    let _ = writer.await;

    tracing::info!(%player, "connection closed");
    Ok(())
}
