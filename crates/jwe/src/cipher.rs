//! Content cipher trait for the `enc` algorithms a token may name.

use zeroize::Zeroizing;

use crate::{
    a256gcm::Aes256GcmCipher,
    error::Result,
    header::ContentAlgorithm,
};

/// Output of a detached-tag AEAD encryption.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

/// Authenticated encryption with a detached tag, as the compact token stores
/// IV, ciphertext and tag in separate segments.
pub trait Cipher: Send + Sync {
    /// Encrypt `plaintext` under `cek`, authenticating `aad`. A fresh IV is
    /// generated on every call.
    fn encrypt(&self, cek: &[u8; 32], plaintext: &[u8], aad: &[u8]) -> Result<Sealed>;

    /// Decrypt and verify. Fails with [`JweError::WrongKey`](crate::JweError::WrongKey)
    /// on any authentication failure; engines re-map that to their own error.
    fn decrypt(
        &self,
        cek: &[u8; 32],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>>;
}

/// Resolve the cipher for a header's `enc` value.
pub fn for_algorithm(enc: ContentAlgorithm) -> &'static dyn Cipher {
    match enc {
        ContentAlgorithm::A256Gcm => &Aes256GcmCipher,
    }
}
