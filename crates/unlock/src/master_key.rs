//! Vault master key: 32 bytes of encryption key followed by 32 bytes of MAC key.

use std::fmt;

use {
    sha2::{Digest, Sha256},
    zeroize::Zeroizing,
};

use crate::error::{Result, UnlockError};

pub const SUBKEY_LEN: usize = 32;
pub const MASTER_KEY_LEN: usize = 2 * SUBKEY_LEN;

pub struct MasterKey(Zeroizing<[u8; MASTER_KEY_LEN]>);

impl MasterKey {
    /// Build from the raw 64 bytes carried in a vault-key payload.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() != MASTER_KEY_LEN {
            return Err(UnlockError::payload(format!(
                "vault key must be {MASTER_KEY_LEN} bytes, got {}",
                raw.len()
            )));
        }
        let mut bytes = Zeroizing::new([0u8; MASTER_KEY_LEN]);
        bytes.copy_from_slice(raw);
        Ok(Self(bytes))
    }

    pub fn from_parts(encryption: &[u8; SUBKEY_LEN], mac: &[u8; SUBKEY_LEN]) -> Self {
        let mut bytes = Zeroizing::new([0u8; MASTER_KEY_LEN]);
        bytes[..SUBKEY_LEN].copy_from_slice(encryption);
        bytes[SUBKEY_LEN..].copy_from_slice(mac);
        Self(bytes)
    }

    pub fn encryption_key(&self) -> &[u8] {
        &self.0[..SUBKEY_LEN]
    }

    pub fn mac_key(&self) -> &[u8] {
        &self.0[SUBKEY_LEN..]
    }

    pub fn as_bytes(&self) -> &[u8; MASTER_KEY_LEN] {
        &self.0
    }

    /// Short digest for confirming two parties hold the same key without
    /// revealing it: first 8 bytes of SHA-256, uppercase hex.
    pub fn key_check(&self) -> String {
        let digest = Sha256::digest(self.0.as_slice());
        digest[..8].iter().map(|b| format!("{b:02X}")).collect()
    }

    /// Drop the key material immediately.
    pub fn lock(self) {}
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey")
            .field("key_check", &self.key_check())
            .finish_non_exhaustive()
    }
}
