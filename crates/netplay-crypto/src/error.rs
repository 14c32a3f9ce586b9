//! Error types for the crypto layer.

/// Errors that can occur when handling session key material.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// A key or IV field arrived with the wrong length.
    #[error("bad {field} length: expected {expected} bytes, got {actual}")]
    BadLength {
        /// Which handshake field was malformed.
        field: &'static str,
        /// The required length for that field.
        expected: usize,
        /// The length that actually arrived.
        actual: usize,
    },
}
