//! Passphrase sealing for the software keystore.
//!
//! Argon2id turns the keystore passphrase into a 256-bit sealing key;
//! XChaCha20-Poly1305 seals the key file contents with the alias as
//! associated data, so a sealed key cannot be moved to another alias.
//! Sealed layout: `nonce (24) || ciphertext || tag (16)`.

use {
    argon2::{Algorithm, Argon2, Params, Version},
    chacha20poly1305::{
        AeadCore, XChaCha20Poly1305, XNonce,
        aead::{Aead, KeyInit, OsRng, Payload},
    },
    rand::RngCore,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
    zeroize::Zeroizing,
};

use crate::error::{DeviceError, Result};

pub const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 24;
const TAG_LEN: usize = 16;

/// Argon2id cost, stored next to each sealed key so that changing the
/// configured cost never strands an existing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdfParams {
    /// Memory cost in KiB.
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 1,
        }
    }
}

pub struct SealingKey(Zeroizing<[u8; 32]>);

impl SealingKey {
    pub fn derive(passphrase: &Secret<String>, salt: &[u8], params: &KdfParams) -> Result<Self> {
        let argon2_params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(32))
            .map_err(|e| DeviceError::Crypto(format!("invalid keystore KDF params: {e}")))?;

        let mut key = Zeroizing::new([0u8; 32]);
        Argon2::new(Algorithm::Argon2id, Version::V0x13, argon2_params)
            .hash_password_into(passphrase.expose_secret().as_bytes(), salt, key.as_mut())
            .map_err(|e| DeviceError::Crypto(format!("keystore KDF: {e}")))?;
        Ok(Self(key))
    }

    #[allow(deprecated)] // generic-array 0.x
    pub fn seal(&self, plaintext: &[u8], alias: &str) -> Result<Vec<u8>> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher()
            .encrypt(&nonce, Payload {
                msg: plaintext,
                aad: alias.as_bytes(),
            })
            .map_err(|e| DeviceError::Crypto(format!("seal device key: {e}")))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// A wrong passphrase and a corrupted file are indistinguishable here;
    /// both make the device identity unavailable.
    #[allow(deprecated)] // generic-array 0.x
    pub fn open(&self, sealed: &[u8], alias: &str) -> Result<Zeroizing<Vec<u8>>> {
        if sealed.len() < NONCE_LEN + TAG_LEN {
            return Err(DeviceError::unavailable("sealed device key is truncated"));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher()
            .decrypt(XNonce::from_slice(nonce), Payload {
                msg: ciphertext,
                aad: alias.as_bytes(),
            })
            .map(Zeroizing::new)
            .map_err(|_| {
                DeviceError::unavailable(
                    "cannot open device key: wrong keystore passphrase or corrupted file",
                )
            })
    }

    #[allow(deprecated)]
    fn cipher(&self) -> XChaCha20Poly1305 {
        XChaCha20Poly1305::new((&*self.0).into())
    }
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    salt
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    const CHEAP: KdfParams = KdfParams {
        m_cost: 256,
        t_cost: 1,
        p_cost: 1,
    };

    fn key(passphrase: &str, salt: &[u8]) -> SealingKey {
        SealingKey::derive(&Secret::new(passphrase.to_string()), salt, &CHEAP).unwrap()
    }

    #[test]
    fn same_inputs_same_key() {
        let a = key("passphrase", b"salt-aaaaaaaaaaa");
        let b = key("passphrase", b"salt-aaaaaaaaaaa");
        assert_eq!(*a.0, *b.0);
    }

    #[rstest]
    #[case::passphrase("other passphrase", b"salt-aaaaaaaaaaa".as_slice())]
    #[case::salt("passphrase", b"salt-bbbbbbbbbbb".as_slice())]
    fn inputs_change_the_key(#[case] passphrase: &str, #[case] salt: &[u8]) {
        let base = key("passphrase", b"salt-aaaaaaaaaaa");
        assert_ne!(*base.0, *key(passphrase, salt).0);
    }

    #[test]
    fn invalid_cost_is_a_crypto_error() {
        let params = KdfParams {
            m_cost: 1,
            t_cost: 0,
            p_cost: 1,
        };
        let result = SealingKey::derive(&Secret::new("p".into()), &[0u8; SALT_LEN], &params);
        assert!(matches!(result, Err(DeviceError::Crypto(_))));
    }

    #[test]
    fn seal_then_open() {
        let k = key("passphrase", &generate_salt());
        let sealed = k.seal(b"pkcs8 bytes", "hubkey-device").unwrap();
        assert_eq!(sealed.len(), NONCE_LEN + 11 + TAG_LEN);
        assert_eq!(
            k.open(&sealed, "hubkey-device").unwrap().as_slice(),
            b"pkcs8 bytes"
        );
    }

    #[test]
    fn sealed_key_is_bound_to_its_alias() {
        let k = key("passphrase", &generate_salt());
        let sealed = k.seal(b"pkcs8 bytes", "laptop").unwrap();
        assert!(matches!(
            k.open(&sealed, "desktop"),
            Err(DeviceError::Unavailable(_))
        ));
    }

    #[test]
    fn wrong_passphrase_or_tampering_is_unavailable() {
        let salt = generate_salt();
        let sealed = key("right", &salt).seal(b"pkcs8 bytes", "a").unwrap();
        assert!(key("wrong", &salt).open(&sealed, "a").is_err());

        let mut tampered = sealed.clone();
        tampered[NONCE_LEN] ^= 0x01;
        assert!(key("right", &salt).open(&tampered, "a").is_err());
        assert!(key("right", &salt).open(&sealed[..30], "a").is_err());
    }
}
