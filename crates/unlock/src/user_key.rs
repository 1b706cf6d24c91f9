//! The user's long-term P-384 key pair.

use std::fmt;

use {
    hubkey_jwe::KeyAgreement,
    p384::{
        PublicKey, SecretKey,
        elliptic_curve::rand_core::OsRng,
        pkcs8::{DecodePrivateKey, EncodePrivateKey},
    },
    zeroize::Zeroizing,
};

use crate::error::{Result, UnlockError};

pub struct UserKey {
    secret: SecretKey,
}

impl UserKey {
    pub fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    /// Parse the PKCS#8 DER carried in a user-key payload.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        SecretKey::from_pkcs8_der(der)
            .map(|secret| Self { secret })
            .map_err(|e| UnlockError::payload(format!("user key is not P-384 PKCS#8: {e}")))
    }

    pub fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let doc = self
            .secret
            .to_pkcs8_der()
            .map_err(|e| UnlockError::Encryption(format!("encode user key: {e}")))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }

    pub fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }
}

impl From<SecretKey> for UserKey {
    fn from(secret: SecretKey) -> Self {
        Self { secret }
    }
}

impl KeyAgreement for UserKey {
    fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    fn agree(&self, peer: &PublicKey) -> hubkey_jwe::Result<Zeroizing<Vec<u8>>> {
        self.secret.agree(peer)
    }
}

impl fmt::Debug for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserKey").finish_non_exhaustive()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pkcs8_round_trip_preserves_key() {
        let key = UserKey::generate();
        let der = key.to_pkcs8_der().unwrap();
        let parsed = UserKey::from_pkcs8_der(&der).unwrap();
        assert_eq!(parsed.public_key(), key.public_key());
        assert_eq!(parsed.to_pkcs8_der().unwrap(), der);
    }

    #[test]
    fn garbage_der_is_malformed_payload() {
        let err = UserKey::from_pkcs8_der(&[0x30, 0x03, 0x02, 0x01, 0x00]).unwrap_err();
        assert!(matches!(err, UnlockError::MalformedPayload(_)));
    }

    #[test]
    fn agreement_is_symmetric() {
        let a = UserKey::generate();
        let b = UserKey::generate();
        let ab = a.agree(&b.public_key()).unwrap();
        let ba = b.agree(&a.public_key()).unwrap();
        assert_eq!(ab, ba);
    }
}
