//! Key-agreement capability used by the ECDH-ES engine.
//!
//! The engine never needs private key bytes, only the ability to compute a
//! shared secret. That lets a non-exportable device key stand in for an
//! in-memory user key.

use {
    p384::{PublicKey, SecretKey},
    zeroize::Zeroizing,
};

use crate::error::Result;

/// A P-384 private key that can perform ECDH.
pub trait KeyAgreement: Send + Sync {
    /// Public half of the key.
    fn public_key(&self) -> PublicKey;

    /// Raw ECDH shared secret (affine x-coordinate, 48 bytes) with `peer`.
    fn agree(&self, peer: &PublicKey) -> Result<Zeroizing<Vec<u8>>>;
}

impl KeyAgreement for SecretKey {
    fn public_key(&self) -> PublicKey {
        SecretKey::public_key(self)
    }

    fn agree(&self, peer: &PublicKey) -> Result<Zeroizing<Vec<u8>>> {
        let shared = p384::ecdh::diffie_hellman(self.to_nonzero_scalar(), peer.as_affine());
        Ok(Zeroizing::new(shared.raw_secret_bytes().to_vec()))
    }
}
