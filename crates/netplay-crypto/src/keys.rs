//! Session key material.

use rand::Rng;

use crate::CryptoError;

/// Length of each symmetric key, in bytes.
pub const KEY_LEN: usize = 32;

/// Length of each initialization vector, in bytes.
pub const IV_LEN: usize = 8;

/// The four independent random buffers that parameterize one side of a
/// session cipher.
///
/// Naming is from the owner's point of view: the owner encrypts with
/// `enc_key`/`enc_iv` and decrypts with `dec_key`/`dec_iv`. The remote
/// side must use [`mirrored`](Self::mirrored) material, since it encrypts
/// what this side decrypts.
///
/// No `Debug` impl — key material stays out of logs. (Test builds derive
/// `Debug` so `assert_eq!`/`assert_ne!` can report failures.)
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(test, derive(Debug))]
pub struct SessionKeys {
    /// Key the owner decrypts inbound traffic with.
    pub dec_key: [u8; KEY_LEN],
    /// Key the owner encrypts outbound traffic with.
    pub enc_key: [u8; KEY_LEN],
    /// IV paired with `dec_key`.
    pub dec_iv: [u8; IV_LEN],
    /// IV paired with `enc_key`.
    pub enc_iv: [u8; IV_LEN],
}

impl SessionKeys {
    /// Generates fresh key material from a cryptographically secure
    /// source. Each of the four buffers is drawn independently.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut keys = Self {
            dec_key: [0; KEY_LEN],
            enc_key: [0; KEY_LEN],
            dec_iv: [0; IV_LEN],
            enc_iv: [0; IV_LEN],
        };
        rng.fill(&mut keys.dec_key[..]);
        rng.fill(&mut keys.enc_key[..]);
        rng.fill(&mut keys.dec_iv[..]);
        rng.fill(&mut keys.enc_iv[..]);
        keys
    }

    /// Returns the remote side's view of this material: encrypt and
    /// decrypt pairs swapped.
    pub fn mirrored(&self) -> Self {
        Self {
            dec_key: self.enc_key,
            enc_key: self.dec_key,
            dec_iv: self.enc_iv,
            enc_iv: self.dec_iv,
        }
    }

    /// Builds session keys from raw handshake fields, validating lengths.
    pub fn from_fields(
        dec_key: &[u8],
        enc_key: &[u8],
        dec_iv: &[u8],
        enc_iv: &[u8],
    ) -> Result<Self, CryptoError> {
        Ok(Self {
            dec_key: check("dec_key", dec_key)?,
            enc_key: check("enc_key", enc_key)?,
            dec_iv: check("dec_iv", dec_iv)?,
            enc_iv: check("enc_iv", enc_iv)?,
        })
    }
}

fn check<const N: usize>(
    field: &'static str,
    bytes: &[u8],
) -> Result<[u8; N], CryptoError> {
    bytes.try_into().map_err(|_| CryptoError::BadLength {
        field,
        expected: N,
        actual: bytes.len(),
    })
}
