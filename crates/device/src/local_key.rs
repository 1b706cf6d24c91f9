//! In-process device key handle shared by the software and memory keystores.

use {
    hubkey_jwe::KeyAgreement,
    p384::{
        PublicKey, SecretKey,
        ecdsa::{Signature, SigningKey, signature::hazmat::PrehashSigner},
        elliptic_curve::rand_core::OsRng,
        pkcs8::{DecodePrivateKey, EncodePrivateKey},
    },
    zeroize::Zeroizing,
};

use crate::{
    error::{DeviceError, Result},
    keystore::DeviceKey,
};

/// Device key held in process memory. The secret is zeroized on drop and no
/// accessor returns it; only the keystore module can serialize it.
pub struct LocalKey {
    secret: SecretKey,
}

impl LocalKey {
    pub(crate) fn generate() -> Self {
        Self {
            secret: SecretKey::random(&mut OsRng),
        }
    }

    pub(crate) fn from_pkcs8_der(der: &[u8]) -> Result<Self> {
        let secret = SecretKey::from_pkcs8_der(der)
            .map_err(|e| DeviceError::Crypto(format!("stored device key: {e}")))?;
        Ok(Self { secret })
    }

    pub(crate) fn to_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>> {
        let doc = self
            .secret
            .to_pkcs8_der()
            .map_err(|e| DeviceError::Crypto(format!("encode device key: {e}")))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }
}

impl KeyAgreement for LocalKey {
    fn public_key(&self) -> PublicKey {
        self.secret.public_key()
    }

    fn agree(&self, peer: &PublicKey) -> hubkey_jwe::Result<Zeroizing<Vec<u8>>> {
        self.secret.agree(peer)
    }
}

impl DeviceKey for LocalKey {
    fn sign(&self, digest: &[u8]) -> Result<Signature> {
        SigningKey::from(&self.secret)
            .sign_prehash(digest)
            .map_err(|e| DeviceError::Crypto(format!("sign: {e}")))
    }
}
