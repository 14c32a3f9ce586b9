//! # Netplay
//!
//! Session coordination and message routing for small multiplayer
//! topologies.
//!
//! A process owns one [`SessionCoordinator`] and starts it in one of two
//! roles: **host** (the authority, accepting peers into a
//! [`HostRegistry`](netplay_host::HostRegistry)) or **client** (a joining
//! participant with a single outbound connection). The coordinator owns
//! the connection lifecycle, the handshake that bootstraps per-session
//! symmetric encryption, and the routing function that dispatches packets
//! by [`PeerKey`](netplay_protocol::PeerKey) — including the reserved
//! logical addresses for "the server", "myself", "everyone", and
//! "everyone synchronized".
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use netplay::prelude::*;
//!
//! # async fn run() -> Result<(), NetplayError> {
//! let mut session = SessionCoordinator::new(SessionConfig::default());
//! session.set_registry_factory(DefaultRegistryFactory);
//! session.start_session(true)?; // host a session
//!
//! // Once per application tick:
//! session.update();
//!
//! let mut packet = Packet::new(session.version(), 7);
//! packet.put_bytes(b"tick");
//! session.send_to_all(&packet);
//! # Ok(())
//! # }
//! ```

mod config;
mod coordinator;
mod error;

pub use config::SessionConfig;
pub use coordinator::{ConnectionState, Role, SessionCoordinator};
pub use error::NetplayError;

/// The protocol version this build speaks by default.
pub const PROTOCOL_VERSION: u16 = 1;

/// One-stop imports for applications building on Netplay.
pub mod prelude {
    pub use crate::{
        ConnectionState, NetplayError, PROTOCOL_VERSION, Role,
        SessionConfig, SessionCoordinator,
    };
    pub use netplay_crypto::{Cipher, SessionKeys};
    pub use netplay_host::{
        DefaultRegistryFactory, HostRegistry, RegistryFactory,
    };
    pub use netplay_peer::{DefaultPeerFactory, Peer, PeerFactory};
    pub use netplay_protocol::{
        Codec, JsonCodec, OP_HANDSHAKE, Packet, PacketReader, PeerKey,
    };
    pub use netplay_transport::{ConnectEvent, TransportHandle};
}
