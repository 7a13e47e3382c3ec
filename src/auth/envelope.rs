//! Authenticated transport encryption for tokens.
//!
//! Signed tokens are wrapped in ChaCha20-Poly1305 before they travel in a
//! cookie or bearer header, so the token structure is not visible on the
//! wire. Output layout is `nonce (12 bytes) || ciphertext`, base64url
//! encoded without padding.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use thiserror::Error;

const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("envelope key must be {KEY_LEN} bytes, base64 encoded")]
    InvalidKey,
    #[error("encryption failure")]
    Seal,
    #[error("value is not a valid envelope")]
    Open,
}

/// Symmetric envelope around signed tokens.
pub struct Envelope {
    cipher: ChaCha20Poly1305,
}

impl Envelope {
    #[must_use]
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    /// Build an envelope from a standard base64 encoded 32-byte key.
    ///
    /// # Errors
    /// Returns `EnvelopeError::InvalidKey` on bad base64 or wrong length.
    pub fn from_base64(encoded: &str) -> Result<Self, EnvelopeError> {
        let bytes = Base64::decode_vec(encoded.trim()).map_err(|_| EnvelopeError::InvalidKey)?;
        let key: [u8; KEY_LEN] = bytes.try_into().map_err(|_| EnvelopeError::InvalidKey)?;
        Ok(Self::new(&key))
    }

    /// Encrypt a token for cookie/header transport.
    ///
    /// # Errors
    /// Returns `EnvelopeError::Seal` if encryption fails.
    pub fn seal(&self, token: &str) -> Result<String, EnvelopeError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, token.as_bytes())
            .map_err(|_| EnvelopeError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        Ok(Base64UrlUnpadded::encode_string(&sealed))
    }

    /// Decrypt a transported value back into the signed token.
    ///
    /// Corrupt or foreign input fails with `EnvelopeError::Open`; callers
    /// decide whether to treat that as a verification failure or pass the
    /// raw value through to signature verification.
    ///
    /// # Errors
    /// Returns `EnvelopeError::Open` on any malformed or tampered input.
    pub fn open(&self, value: &str) -> Result<String, EnvelopeError> {
        let sealed = Base64UrlUnpadded::decode_vec(value).map_err(|_| EnvelopeError::Open)?;
        if sealed.len() < NONCE_LEN {
            return Err(EnvelopeError::Open);
        }

        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| EnvelopeError::Open)?;

        String::from_utf8(plaintext).map_err(|_| EnvelopeError::Open)
    }
}
