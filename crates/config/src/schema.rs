//! Config schema: device keystore, wrap work factor and keystore KDF cost.
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HubkeyConfig {
    pub device: DeviceConfig,
    pub wrap: WrapConfig,
    pub keystore_kdf: KeystoreKdfConfig,
}

/// Where and how the device key is kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Directory holding sealed key files. Defaults to the platform data dir.
    pub keystore_dir: Option<PathBuf>,
    /// Alias of the device key inside the keystore.
    pub key_alias: String,
    /// Passphrase sealing the device key. Usually supplied through
    /// `HUBKEY_KEYSTORE_PASSPHRASE` rather than written to disk.
    #[serde(
        default,
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub keystore_passphrase: Option<Secret<String>>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            keystore_dir: None,
            key_alias: "hubkey-device".into(),
            keystore_passphrase: None,
        }
    }
}

/// Parameters for password-wraps this installation produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapConfig {
    /// PBKDF2 iteration count for new setup-code wraps.
    pub pbes2_iterations: u32,
}

impl Default for WrapConfig {
    fn default() -> Self {
        Self {
            pbes2_iterations: 1_000_000,
        }
    }
}

/// Argon2id cost for sealing the device key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeystoreKdfConfig {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for KeystoreKdfConfig {
    fn default() -> Self {
        Self {
            memory_kib: 65536,
            iterations: 3,
            parallelism: 1,
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}
