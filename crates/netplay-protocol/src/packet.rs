//! Binary packet framing.
//!
//! Every message on the wire is a [`Packet`]:
//!
//! ```text
//! ┌──────────────┬──────────────┬───────────────────────────┐
//! │ version: u16 │ opcode: u16  │ payload: length-prefixed  │
//! │ (big-endian) │ (big-endian) │ fields or opaque bytes    │
//! └──────────────┴──────────────┴───────────────────────────┘
//! ```
//!
//! The header is always plaintext; the payload may be encrypted by the
//! peer layer once a session cipher is installed. The handshake opcode is
//! reserved and never shares a tag with application traffic.

use bytes::BufMut;

use crate::ProtocolError;

/// Reserved opcode for the session handshake. Application payload tags
/// must be greater than this.
pub const OP_HANDSHAKE: u16 = 0;

/// Size of the fixed packet header in bytes.
const HEADER_LEN: usize = 4;

/// A framed message: protocol version, type tag, and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The session's protocol version, stamped on every message.
    pub version: u16,
    /// The message type tag. [`OP_HANDSHAKE`] is reserved.
    pub opcode: u16,
    /// The message body. Opaque here; the framing below only applies to
    /// fields written through [`put_bytes`](Self::put_bytes).
    pub payload: Vec<u8>,
}

impl Packet {
    /// Creates an empty packet with the given version and type tag.
    pub fn new(version: u16, opcode: u16) -> Self {
        Self {
            version,
            opcode,
            payload: Vec::new(),
        }
    }

    /// Returns `true` if this is a handshake packet.
    pub fn is_handshake(&self) -> bool {
        self.opcode == OP_HANDSHAKE
    }

    /// Appends a length-prefixed field to the payload.
    ///
    /// Fields written this way are read back in order with
    /// [`PacketReader::read_field`].
    ///
    /// # Panics
    ///
    /// Panics if the field is longer than the `u16` length prefix can
    /// carry; truncating the prefix would corrupt every field after it.
    pub fn put_bytes(&mut self, field: &[u8]) {
        assert!(
            field.len() <= u16::MAX as usize,
            "field length {} exceeds the u16 length prefix",
            field.len()
        );
        self.payload.put_u16(field.len() as u16);
        self.payload.put_slice(field);
    }

    /// Serializes the packet into a wire frame.
    pub fn encode(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(HEADER_LEN + self.payload.len());
        frame.put_u16(self.version);
        frame.put_u16(self.opcode);
        frame.put_slice(&self.payload);
        frame
    }

    /// Parses a wire frame back into a packet.
    pub fn decode(frame: &[u8]) -> Result<Self, ProtocolError> {
        if frame.len() < HEADER_LEN {
            return Err(ProtocolError::Truncated {
                expected: HEADER_LEN,
                actual: frame.len(),
            });
        }
        Ok(Self {
            version: u16::from_be_bytes([frame[0], frame[1]]),
            opcode: u16::from_be_bytes([frame[2], frame[3]]),
            payload: frame[HEADER_LEN..].to_vec(),
        })
    }
}

/// Cursor over a packet payload written with length-prefixed fields.
pub struct PacketReader<'a> {
    buf: &'a [u8],
}

impl<'a> PacketReader<'a> {
    /// Creates a reader over the given payload.
    pub fn new(payload: &'a [u8]) -> Self {
        Self { buf: payload }
    }

    /// Reads the next length-prefixed field.
    pub fn read_field(&mut self) -> Result<&'a [u8], ProtocolError> {
        if self.buf.len() < 2 {
            return Err(ProtocolError::Truncated {
                expected: 2,
                actual: self.buf.len(),
            });
        }
        let len = u16::from_be_bytes([self.buf[0], self.buf[1]]) as usize;
        if self.buf.len() < 2 + len {
            return Err(ProtocolError::Truncated {
                expected: 2 + len,
                actual: self.buf.len(),
            });
        }
        let field = &self.buf[2..2 + len];
        self.buf = &self.buf[2 + len..];
        Ok(field)
    }

    /// Returns the number of unread payload bytes.
    pub fn remaining(&self) -> usize {
        self.buf.len()
    }
}
