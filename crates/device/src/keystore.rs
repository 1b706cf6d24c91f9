//! Platform keystore capability traits.
//!
//! A keystore hands out [`DeviceKey`] handles. A handle exposes the public
//! key, ECDH and ECDSA, and nothing else: private key bytes are never
//! observable through this interface, whether the backing store is a
//! hardware keystore, an OS keychain or the software fallback.

use {hubkey_jwe::KeyAgreement, p384::ecdsa::Signature, std::sync::Arc};

use crate::error::Result;

/// Handle to a non-exportable device private key.
pub trait DeviceKey: KeyAgreement {
    /// ECDSA P-384 signature over a caller-computed digest.
    fn sign(&self, digest: &[u8]) -> Result<Signature>;
}

/// Persistent store of device keys addressed by alias.
///
/// Implementations must make `generate` converge: if another writer
/// provisioned `alias` first, return that key rather than a second one.
pub trait DeviceKeyStore: Send + Sync {
    /// Load an existing key, `Ok(None)` if none has been provisioned.
    fn load(&self, alias: &str) -> Result<Option<Arc<dyn DeviceKey>>>;

    /// Generate and persist a key for `alias`.
    fn generate(&self, alias: &str) -> Result<Arc<dyn DeviceKey>>;
}
