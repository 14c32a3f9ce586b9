//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an application payload failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization of an application payload failed.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A frame or payload field ended before its declared length.
    #[error("truncated frame: expected {expected} bytes, got {actual}")]
    Truncated {
        /// How many bytes the frame claimed to carry.
        expected: usize,
        /// How many bytes were actually present.
        actual: usize,
    },

    /// The message is well-formed but violates protocol rules — e.g., a
    /// handshake field with the wrong length or an unexpected opcode.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
