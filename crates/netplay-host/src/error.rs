//! Error types for the host registry.

use netplay_crypto::CryptoError;
use netplay_protocol::ProtocolError;

/// Reasons a joining peer is rejected during admission.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// The first packet from a new peer was not a handshake.
    #[error("expected handshake, got opcode {0}")]
    UnexpectedPacket(u16),

    /// The peer speaks a different protocol version.
    #[error("version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The version this session runs.
        expected: u16,
        /// The version the peer announced.
        actual: u16,
    },

    /// The handshake payload was malformed.
    #[error(transparent)]
    Handshake(#[from] ProtocolError),

    /// The handshake carried key material with the wrong shape.
    #[error(transparent)]
    KeyMaterial(#[from] CryptoError),
}
