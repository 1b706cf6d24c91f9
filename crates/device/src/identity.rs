//! Device identity manager: one long-lived P-384 key per installation.
//!
//! The key is provisioned lazily on first use. The first caller takes the
//! provisioning mutex, loads or generates the key and publishes it in a
//! once-cell; every later call reads the cell without locking.

use std::sync::{Arc, Mutex, OnceLock};

use {
    hubkey_jwe::KeyAgreement,
    p384::{PublicKey, ecdsa::Signature, pkcs8::EncodePublicKey},
    sha2::{Digest, Sha256},
    tracing::{debug, info},
};

use crate::{
    error::{DeviceError, Result},
    keystore::{DeviceKey, DeviceKeyStore},
};

/// Alias under which the device key is stored when none is configured.
pub const DEFAULT_KEY_ALIAS: &str = "hubkey-device";

struct Provisioned {
    key: Arc<dyn DeviceKey>,
    fingerprint: String,
}

pub struct DeviceIdentity<S: DeviceKeyStore> {
    store: S,
    alias: String,
    provisioned: OnceLock<Provisioned>,
    provisioning: Mutex<()>,
}

impl<S: DeviceKeyStore> DeviceIdentity<S> {
    pub fn new(store: S) -> Self {
        Self::with_alias(store, DEFAULT_KEY_ALIAS)
    }

    pub fn with_alias(store: S, alias: impl Into<String>) -> Self {
        Self {
            store,
            alias: alias.into(),
            provisioned: OnceLock::new(),
            provisioning: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load or generate the device key. Idempotent and safe to race: all
    /// callers observe the same key.
    pub fn ensure_device_key_exists(&self) -> Result<()> {
        self.provisioned().map(|_| ())
    }

    /// Public half of the device key.
    pub fn device_public_key(&self) -> Result<PublicKey> {
        Ok(self.provisioned()?.key.public_key())
    }

    /// Stable identifier derived from the device public key.
    pub fn device_fingerprint(&self) -> Result<String> {
        Ok(self.provisioned()?.fingerprint.clone())
    }

    /// Handle for ECDH with the device key.
    pub fn agreement_key(&self) -> Result<Arc<dyn DeviceKey>> {
        Ok(Arc::clone(&self.provisioned()?.key))
    }

    /// ECDSA signature with the device key over `digest`.
    pub fn sign(&self, digest: &[u8]) -> Result<Signature> {
        self.provisioned()?.key.sign(digest)
    }

    fn provisioned(&self) -> Result<&Provisioned> {
        if let Some(p) = self.provisioned.get() {
            return Ok(p);
        }

        let _guard = self
            .provisioning
            .lock()
            .map_err(|_| DeviceError::unavailable("device provisioning lock poisoned"))?;
        if let Some(p) = self.provisioned.get() {
            return Ok(p);
        }

        let key = match self.store.load(&self.alias).map_err(into_unavailable)? {
            Some(key) => {
                debug!(alias = %self.alias, "device key loaded");
                key
            },
            None => {
                info!(alias = %self.alias, "no device key found, generating");
                self.store
                    .generate(&self.alias)
                    .map_err(into_unavailable)?
            },
        };
        let fingerprint = fingerprint(&key.public_key()).map_err(into_unavailable)?;
        info!(alias = %self.alias, fingerprint = %fingerprint, "device identity ready");

        Ok(self
            .provisioned
            .get_or_init(|| Provisioned { key, fingerprint }))
    }
}

/// Any failure to obtain the device key leaves the identity unavailable.
fn into_unavailable(err: DeviceError) -> DeviceError {
    match err {
        DeviceError::Unavailable(_) => err,
        other => DeviceError::Unavailable(other.to_string()),
    }
}

/// Uppercase hex SHA-256 of the DER `SubjectPublicKeyInfo` of `public`.
pub fn fingerprint(public: &PublicKey) -> Result<String> {
    let spki = public
        .to_public_key_der()
        .map_err(|e| DeviceError::Crypto(format!("encode public key: {e}")))?;
    Ok(format!("{:X}", Sha256::digest(spki.as_bytes())))
}
