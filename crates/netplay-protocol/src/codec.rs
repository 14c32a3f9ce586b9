//! Codec trait and implementations for application payloads.
//!
//! A codec converts between application message types and the opaque
//! payload bytes carried inside a [`Packet`](crate::Packet). The framing
//! layer doesn't care how the bytes were produced — it just needs
//! something that implements the [`Codec`] trait, so the serialization
//! format can be swapped without touching routing or transport.
//!
//! Currently we provide [`JsonCodec`] (human-readable, great for
//! debugging). A compact binary codec can be added later without changing
//! any other code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode application messages to bytes and back.
///
/// `Send + Sync + 'static` so a codec can be shared across the async
/// tasks that drive socket I/O.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into payload bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes payload bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use netplay_protocol::{Codec, JsonCodec, Packet};
///
/// let codec = JsonCodec;
/// let mut packet = Packet::new(1, 7);
/// packet.payload = codec.encode(&("chat", "hello")).unwrap();
///
/// let (kind, text): (String, String) =
///     codec.decode(&packet.payload).unwrap();
/// assert_eq!(kind, "chat");
/// assert_eq!(text, "hello");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
