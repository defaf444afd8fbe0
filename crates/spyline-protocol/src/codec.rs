//! Codec for turning protocol types into bytes and back.
//!
//! The gateway doesn't care how messages are serialized — it just needs
//! something implementing [`Codec`]. [`JsonCodec`] is the only current
//! implementation; a compact binary codec could be swapped in without
//! touching the rest of the server.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes and decodes protocol messages.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value to bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes a value from bytes.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON codec — human-readable and directly usable from a browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientCommand, Mode};

    #[test]
    fn test_json_codec_round_trips_a_command() {
        let cmd = ClientCommand::CreateRoom {
            name: "amy".into(),
            mode: Mode::Lightning,
        };
        let bytes = JsonCodec.encode(&cmd).unwrap();
        let decoded: ClientCommand = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(cmd, decoded);
    }

    #[test]
    fn test_json_codec_rejects_garbage() {
        let result: Result<ClientCommand, _> = JsonCodec.decode(b"not json");
        assert!(result.is_err());
    }
}
