//! Vault unlock flows.
//!
//! The hub stores three kinds of token for a user:
//!
//! - the user's private key wrapped with their setup code (password-wrap),
//! - the same private key wrapped for each registered device (agreement-wrap),
//! - each vault's master key wrapped for the user's public key (agreement-wrap).
//!
//! A first unlock on a new device uses the setup code and re-wraps the user
//! key for the device. Later unlocks need only the device key.

use std::sync::Arc;

use {
    hubkey_device::{DeviceIdentity, DeviceKeyStore},
    hubkey_jwe::{KeyAgreement, Pbes2Params, ecdh_es, pbes2},
    p384::PublicKey,
    secrecy::{ExposeSecret, Secret},
    tracing::{debug, info},
};

use crate::{
    error::Result,
    master_key::MasterKey,
    payload,
    user_key::UserKey,
};

pub struct VaultUnlock<S: DeviceKeyStore> {
    device: Arc<DeviceIdentity<S>>,
    pbes2: Pbes2Params,
}

impl<S: DeviceKeyStore> VaultUnlock<S> {
    pub fn new(device: Arc<DeviceIdentity<S>>) -> Self {
        Self {
            device,
            pbes2: Pbes2Params::default(),
        }
    }

    /// Work factor used when this instance produces password-wraps.
    pub fn with_pbes2_params(mut self, params: Pbes2Params) -> Self {
        self.pbes2 = params;
        self
    }

    pub fn device(&self) -> &DeviceIdentity<S> {
        &self.device
    }

    pub fn device_public_key(&self) -> Result<PublicKey> {
        Ok(self.device.device_public_key()?)
    }

    pub fn device_fingerprint(&self) -> Result<String> {
        Ok(self.device.device_fingerprint()?)
    }

    /// Recover the user key from its password-wrap.
    pub fn decrypt_user_key_with_setup_code(
        &self,
        token: &str,
        setup_code: &Secret<String>,
    ) -> Result<UserKey> {
        let plaintext = pbes2::unwrap(token, setup_code.expose_secret())?;
        let key = user_key_from_payload(&plaintext)?;
        debug!("user key recovered with setup code");
        Ok(key)
    }

    /// Recover the user key from a token wrapped for this device.
    pub fn decrypt_user_key_with_device(&self, token: &str) -> Result<UserKey> {
        let device_key = self.device.agreement_key()?;
        let plaintext = ecdh_es::unwrap(token, &*device_key)?;
        let key = user_key_from_payload(&plaintext)?;
        debug!("user key recovered with device key");
        Ok(key)
    }

    /// Re-wrap a setup-code-protected user key for this device, so later
    /// unlocks can skip the setup code.
    pub fn re_encrypt_user_key(&self, token: &str, setup_code: &Secret<String>) -> Result<String> {
        let user_key = self.decrypt_user_key_with_setup_code(token, setup_code)?;
        let device_public = self.device.device_public_key()?;
        let wrapped = encrypt_user_key(&user_key, &device_public)?;
        info!(
            device = %self.device.device_fingerprint()?,
            "user key re-wrapped for device"
        );
        Ok(wrapped)
    }

    /// Password-wrap a user key under `setup_code`.
    pub fn protect_user_key(
        &self,
        user_key: &UserKey,
        setup_code: &Secret<String>,
    ) -> Result<String> {
        let payload = payload::encode(&user_key.to_pkcs8_der()?)?;
        Ok(pbes2::wrap(&payload, setup_code.expose_secret(), &self.pbes2)?)
    }

    /// Setup-code path: user key from its password-wrap, then the vault key.
    pub fn unlock_with_setup_code(
        &self,
        user_token: &str,
        vault_token: &str,
        setup_code: &Secret<String>,
    ) -> Result<MasterKey> {
        let user_key = self.decrypt_user_key_with_setup_code(user_token, setup_code)?;
        let master_key = decrypt_vault_key(vault_token, &user_key)?;
        info!(key_check = %master_key.key_check(), "vault unlocked with setup code");
        Ok(master_key)
    }

    /// Device path: user key from its device-wrap, then the vault key.
    pub fn unlock_with_device(&self, device_token: &str, vault_token: &str) -> Result<MasterKey> {
        let user_key = self.decrypt_user_key_with_device(device_token)?;
        let master_key = decrypt_vault_key(vault_token, &user_key)?;
        info!(key_check = %master_key.key_check(), "vault unlocked with device key");
        Ok(master_key)
    }
}

/// Unwrap a vault master key with the holder's agreement key.
pub fn decrypt_vault_key<K>(token: &str, recipient: &K) -> Result<MasterKey>
where
    K: KeyAgreement + ?Sized,
{
    let plaintext = ecdh_es::unwrap(token, recipient)?;
    let raw = payload::decode(&plaintext)?;
    MasterKey::from_bytes(&raw)
}

/// Agreement-wrap a vault master key for `recipient`.
pub fn encrypt_vault_key(master_key: &MasterKey, recipient: &PublicKey) -> Result<String> {
    let payload = payload::encode(master_key.as_bytes())?;
    Ok(ecdh_es::wrap(&payload, recipient)?)
}

/// Agreement-wrap a user key for `recipient`, typically a device.
pub fn encrypt_user_key(user_key: &UserKey, recipient: &PublicKey) -> Result<String> {
    let payload = payload::encode(&user_key.to_pkcs8_der()?)?;
    Ok(ecdh_es::wrap(&payload, recipient)?)
}

fn user_key_from_payload(plaintext: &[u8]) -> Result<UserKey> {
    let der = payload::decode(plaintext)?;
    UserKey::from_pkcs8_der(&der)
}
