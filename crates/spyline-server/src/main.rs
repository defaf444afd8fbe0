//! Spyline: a hidden-role party game server over WebSockets.
//!
//! Clients speak the JSON protocol from `spyline-protocol`; rooms and
//! game logic live in `spyline-room`. This binary is just the gateway
//! plus process bootstrap.

mod dispatcher;
mod gateway;

use spyline_room::GameConfig;
use tracing_subscriber::EnvFilter;

use crate::gateway::Server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr =
        std::env::var("SPYLINE_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let server = Server::bind(&addr, GameConfig::default()).await?;
    server.run().await?;
    Ok(())
}
