//! Configuration loading and env substitution.
//!
//! Config files: `hubkey.toml`, `hubkey.yaml`, or `hubkey.json`
//! Searched in `./` then `~/.config/hubkey/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values, and `HUBKEY_*`
//! environment overrides for the device keystore.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{
        ENV_KEY_ALIAS, ENV_KEYSTORE_DIR, ENV_KEYSTORE_PASSPHRASE, apply_env_overrides, config_dir,
        default_keystore_dir, discover_and_load, load_config,
    },
    schema::{DeviceConfig, HubkeyConfig, KeystoreKdfConfig, WrapConfig},
};
