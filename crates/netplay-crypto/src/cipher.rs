//! The per-session symmetric cipher.

use chacha20::ChaCha20Legacy;
use chacha20::cipher::{KeyIvInit, StreamCipher};

use crate::{IV_LEN, KEY_LEN, SessionKeys};

/// A paired encrypt/decrypt keystream attached to one peer.
///
/// Uses ChaCha20 with the legacy 64-bit nonce, which matches the wire
/// format's 32-byte keys and 8-byte IVs. Each direction keeps its own
/// keystream position, advancing continuously across messages — both
/// sides must therefore encrypt/decrypt every non-handshake message, in
/// order, or the streams fall out of step.
pub struct Cipher {
    enc: ChaCha20Legacy,
    dec: ChaCha20Legacy,
}

impl Cipher {
    /// Builds a cipher from four raw buffers.
    ///
    /// Argument order matches the handshake construction: the encrypt
    /// pair first, then the decrypt pair.
    pub fn new(
        enc_key: &[u8; KEY_LEN],
        dec_key: &[u8; KEY_LEN],
        enc_iv: &[u8; IV_LEN],
        dec_iv: &[u8; IV_LEN],
    ) -> Self {
        Self {
            enc: ChaCha20Legacy::new(enc_key.into(), enc_iv.into()),
            dec: ChaCha20Legacy::new(dec_key.into(), dec_iv.into()),
        }
    }

    /// Builds a cipher from session key material.
    pub fn from_keys(keys: &SessionKeys) -> Self {
        Self::new(
            &keys.enc_key,
            &keys.dec_key,
            &keys.enc_iv,
            &keys.dec_iv,
        )
    }

    /// Encrypts a buffer in place, advancing the outbound keystream.
    pub fn encrypt(&mut self, data: &mut [u8]) {
        self.enc.apply_keystream(data);
    }

    /// Decrypts a buffer in place, advancing the inbound keystream.
    pub fn decrypt(&mut self, data: &mut [u8]) {
        self.dec.apply_keystream(data);
    }
}
