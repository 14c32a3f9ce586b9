//! Wire protocol for Netplay.
//!
//! This crate defines the "language" that peers speak:
//!
//! - **Addressing** ([`PeerKey`]) — who a message is for, including the
//!   reserved logical addresses (`ALL`, `SERVER`, `SELF`, `SYNCHRONIZED`).
//! - **Framing** ([`Packet`], [`PacketReader`]) — the binary envelope every
//!   message travels in: protocol version, opcode tag, and a payload of
//!   length-prefixed fields.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how application payloads
//!   are converted to/from bytes. Opaque to the framing layer.
//! - **Errors** ([`ProtocolError`]) — what can go wrong on the way.
//!
//! The protocol layer sits between transport (raw frames) and the session
//! coordinator (peer identity and routing). It doesn't know about
//! connections or ciphers — it only knows the shape of bytes.

mod codec;
mod error;
mod packet;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use packet::{OP_HANDSHAKE, Packet, PacketReader};
pub use types::PeerKey;
