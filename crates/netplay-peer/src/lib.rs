//! Participant abstraction for Netplay.
//!
//! A [`Peer`] represents one participant in a session — the local one or a
//! remote one. It owns the participant's stable key, its optional transport
//! wiring, and its optional session cipher, and exposes the two delivery
//! paths the coordinator routes through:
//!
//! - **write** — outbound over the network, payload encrypted once a
//!   cipher is attached (the handshake opcode stays plaintext);
//! - **receive** — in-process delivery, no network round trip, no cipher.
//!
//! # How it fits in the stack
//!
//! ```text
//! Coordinator / Host Registry (above)  ← route packets to peers
//!     ↕
//! Peer (this crate)  ← per-participant state and delivery paths
//!     ↕
//! Transport + Crypto (below)  ← sockets and keystreams
//! ```

mod error;
mod factory;
mod peer;

pub use error::PeerError;
pub use factory::{DefaultPeerFactory, PeerFactory};
pub use peer::Peer;
