//! Per-session symmetric encryption for Netplay.
//!
//! The joining side of a session generates four independent random buffers
//! ([`SessionKeys`]) and builds a [`Cipher`] from them; the hosting side
//! receives the buffers in the handshake and builds the inverse cipher
//! from [`SessionKeys::mirrored`]. After that, each side's encrypt
//! keystream lines up with the other side's decrypt keystream.
//!
//! This is key exchange by disclosure, not a key-agreement protocol: the
//! handshake carries the raw key material over the still-unencrypted
//! connection, so the very first message has no confidentiality. That
//! weakness is inherited from the wire format and kept for compatibility
//! rather than silently hardened.

mod cipher;
mod error;
mod keys;

pub use cipher::Cipher;
pub use error::CryptoError;
pub use keys::{IV_LEN, KEY_LEN, SessionKeys};
