//! Unified error type for the Netplay framework.

use netplay_crypto::CryptoError;
use netplay_host::RegistryError;
use netplay_peer::PeerError;
use netplay_protocol::ProtocolError;
use netplay_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `netplay` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NetplayError {
    /// The coordinator is missing required configuration — e.g., no
    /// registry factory was set before `start_session`.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A connection attempt is already in flight; the call was rejected
    /// rather than stacking a second attempt.
    #[error("a connection attempt is already pending")]
    ConnectionPending,

    /// A transport-level error (connect, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (framing, codec).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A crypto-level error (malformed key material).
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// A peer-level error (write without connection, disconnected).
    #[error(transparent)]
    Peer(#[from] PeerError),

    /// A registry-level error (handshake rejection).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

#[cfg(test)]
mod tests {
    use netplay_protocol::PeerKey;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::ConnectionClosed("gone".into());
        let netplay_err: NetplayError = err.into();
        assert!(matches!(netplay_err, NetplayError::Transport(_)));
        assert!(netplay_err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let netplay_err: NetplayError = err.into();
        assert!(matches!(netplay_err, NetplayError::Protocol(_)));
    }

    #[test]
    fn test_from_crypto_error() {
        let err = CryptoError::BadLength {
            field: "dec_key",
            expected: 32,
            actual: 3,
        };
        let netplay_err: NetplayError = err.into();
        assert!(matches!(netplay_err, NetplayError::Crypto(_)));
    }

    #[test]
    fn test_from_peer_error() {
        let err = PeerError::NotConnected(PeerKey(1));
        let netplay_err: NetplayError = err.into();
        assert!(matches!(netplay_err, NetplayError::Peer(_)));
    }

    #[test]
    fn test_from_registry_error() {
        let err = RegistryError::UnexpectedPacket(9);
        let netplay_err: NetplayError = err.into();
        assert!(matches!(netplay_err, NetplayError::Registry(_)));
    }
}
