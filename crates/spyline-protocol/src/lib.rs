//! Wire protocol for Spyline, a hidden-role party game server.
//!
//! # Key types
//!
//! - [`ClientCommand`] — everything a client can send
//! - [`ServerEvent`] — everything the server can emit
//! - [`Recipient`] — unicast vs. room broadcast for an event
//! - [`Codec`] / [`JsonCodec`] — byte-level encoding

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ClientCommand, ErrorKind, Mode, PlayerId, PlayerSummary, Recipient, Role,
    RoomCode, ServerEvent, VoteTarget,
};
