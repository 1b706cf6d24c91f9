//! AES-256-GCM implementation of the [`Cipher`] trait (`enc = "A256GCM"`).

#[allow(deprecated)] // upstream generic-array 0.x deprecation
use aes_gcm::{
    Aes256Gcm, Nonce, Tag,
    aead::{AeadInPlace, KeyInit},
};
use {rand::RngCore, zeroize::Zeroizing};

use crate::{
    cipher::{Cipher, Sealed},
    error::{JweError, Result},
};

/// IV size for AES-GCM (96 bits).
const IV_LEN: usize = 12;

/// Authentication tag size (128 bits).
const TAG_LEN: usize = 16;

pub struct Aes256GcmCipher;

impl Cipher for Aes256GcmCipher {
    #[allow(deprecated)]
    fn encrypt(&self, cek: &[u8; 32], plaintext: &[u8], aad: &[u8]) -> Result<Sealed> {
        let cipher = Aes256Gcm::new(cek.into());

        let mut iv = [0u8; IV_LEN];
        rand::rng().fill_bytes(&mut iv);

        let mut buffer = plaintext.to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&iv), aad, &mut buffer)
            .map_err(|e| JweError::Encryption(e.to_string()))?;

        Ok(Sealed {
            iv: iv.to_vec(),
            ciphertext: buffer,
            tag: tag.to_vec(),
        })
    }

    #[allow(deprecated)]
    fn decrypt(
        &self,
        cek: &[u8; 32],
        iv: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>> {
        if iv.len() != IV_LEN || tag.len() != TAG_LEN {
            return Err(JweError::WrongKey);
        }

        let cipher = Aes256Gcm::new(cek.into());
        let mut buffer = Zeroizing::new(ciphertext.to_vec());
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(iv),
                aad,
                &mut *buffer,
                Tag::from_slice(tag),
            )
            .map_err(|_| JweError::WrongKey)?;
        Ok(buffer)
    }
}
