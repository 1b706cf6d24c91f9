//! Device identity for hub vault unlock.
//!
//! Each installation owns one P-384 keypair whose private half stays inside
//! a keystore and is reachable only through agreement and signing. The
//! [`DeviceIdentity`] manager provisions it lazily and derives a stable
//! fingerprint from the public key.

pub mod error;
pub mod identity;
pub mod keystore;
pub mod local_key;
pub mod memory;
pub mod seal;
pub mod software;

pub use {
    error::DeviceError,
    identity::{DEFAULT_KEY_ALIAS, DeviceIdentity, fingerprint},
    keystore::{DeviceKey, DeviceKeyStore},
    memory::MemoryKeyStore,
    seal::KdfParams,
    software::SoftwareKeyStore,
};
