//! Error type for the protocol layer.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed — malformed JSON, an unknown `type` tag,
    /// or missing fields.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
