//! Unlock of hub-managed vaults.
//!
//! Combines the wrap engines from `hubkey-jwe` with the device identity from
//! `hubkey-device` into the setup-code and device-key unlock flows. Every
//! failure maps onto [`UnlockError`].

pub mod error;
pub mod master_key;
pub mod payload;
pub mod protocol;
pub mod user_key;

pub use {
    error::{Result, UnlockError},
    master_key::{MASTER_KEY_LEN, MasterKey},
    protocol::{VaultUnlock, decrypt_vault_key, encrypt_user_key, encrypt_vault_key},
    user_key::UserKey,
};
