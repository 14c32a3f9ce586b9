//! Session configuration.

/// Configuration for a session coordinator.
///
/// All of these are connection-target parameters: they may be changed
/// freely between sessions, but mutation through the coordinator's
/// setters is ignored while a connection attempt is in flight.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Remote host to connect to (client role).
    pub address: String,

    /// Port to connect to (client role) or listen on (host role).
    /// 0 lets the host pick a free port.
    pub port: u16,

    /// Protocol version stamped on every packet and validated during
    /// the handshake.
    pub version: u16,

    /// Whether this build carries a local participant.
    ///
    /// Headless deployments (dedicated servers) set this to `false`;
    /// the coordinator then has no local peer, and routing paths that
    /// fall back to it become no-ops.
    pub interactive: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7777,
            version: crate::PROTOCOL_VERSION,
            interactive: true,
        }
    }
}
