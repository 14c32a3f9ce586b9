//! Error types for the peer layer.

use netplay_protocol::PeerKey;

/// Errors that can occur on a peer's message paths.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// An outbound write was attempted before a connection was attached.
    #[error("peer {0} has no connection attached")]
    NotConnected(PeerKey),

    /// The peer's connection has gone away (writer task ended).
    #[error("peer {0} is disconnected")]
    Disconnected(PeerKey),
}
