//! CEK wrapping with AES Key Wrap (RFC 3394), the `A256KW` half of PBES2.

use {aes_kw::KekAes256, zeroize::Zeroizing};

use crate::error::{JweError, Result};

/// Size of a wrapped 256-bit CEK: the key plus the 64-bit integrity block.
pub const WRAPPED_CEK_LEN: usize = 40;

/// Wrap a CEK under a KEK.
pub fn wrap_cek(kek: &[u8; 32], cek: &[u8; 32]) -> Result<[u8; WRAPPED_CEK_LEN]> {
    let mut wrapped = [0u8; WRAPPED_CEK_LEN];
    KekAes256::new(kek.into())
        .wrap(cek, &mut wrapped)
        .map_err(|e| JweError::Encryption(format!("key wrap: {e}")))?;
    Ok(wrapped)
}

/// Unwrap a CEK. A failing integrity check is reported as
/// [`JweError::WrongSetupCode`] since the KEK comes from the setup code.
pub fn unwrap_cek(kek: &[u8; 32], wrapped: &[u8]) -> Result<Zeroizing<[u8; 32]>> {
    if wrapped.len() != WRAPPED_CEK_LEN {
        return Err(JweError::WrongSetupCode);
    }

    let mut cek = Zeroizing::new([0u8; 32]);
    KekAes256::new(kek.into())
        .unwrap(wrapped, cek.as_mut())
        .map_err(|_| JweError::WrongSetupCode)?;
    Ok(cek)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let kek = [0xAA; 32];
        let cek = [0xBB; 32];

        let wrapped = wrap_cek(&kek, &cek).unwrap();
        let unwrapped = unwrap_cek(&kek, &wrapped).unwrap();
        assert_eq!(*unwrapped, cek);
    }

    #[test]
    fn wrong_kek_fails() {
        let wrapped = wrap_cek(&[0xAA; 32], &[0xBB; 32]).unwrap();
        let result = unwrap_cek(&[0xCC; 32], &wrapped);
        assert!(matches!(result, Err(JweError::WrongSetupCode)));
    }

    #[test]
    fn tampered_wrapped_fails() {
        let kek = [0xAA; 32];
        let mut wrapped = wrap_cek(&kek, &[0xBB; 32]).unwrap();
        wrapped[WRAPPED_CEK_LEN - 1] ^= 0x01;
        assert!(unwrap_cek(&kek, &wrapped).is_err());
    }

    #[test]
    fn truncated_wrapped_fails() {
        let kek = [0xAA; 32];
        let wrapped = wrap_cek(&kek, &[0xBB; 32]).unwrap();
        assert!(unwrap_cek(&kek, &wrapped[..32]).is_err());
    }

    // RFC 3394 §4.6: 256-bit key data wrapped with a 256-bit KEK.
    #[test]
    fn rfc3394_vector() {
        let kek: [u8; 32] = core::array::from_fn(|i| i as u8);
        let cek: [u8; 32] = [
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xAA, 0xBB, 0xCC, 0xDD,
            0xEE, 0xFF, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B,
            0x0C, 0x0D, 0x0E, 0x0F,
        ];
        let expected: [u8; 40] = [
            0x28, 0xC9, 0xF4, 0x04, 0xC4, 0xB8, 0x10, 0xF4, 0xCB, 0xCC, 0xB3, 0x5C, 0xFB, 0x87,
            0xF8, 0x26, 0x3F, 0x57, 0x86, 0xE2, 0xD8, 0x0E, 0xD3, 0x26, 0xCB, 0xC7, 0xF0, 0xE7,
            0x1A, 0x99, 0xF4, 0x3B, 0xFB, 0x98, 0x8B, 0x9B, 0x7A, 0x02, 0xDD, 0x21,
        ];
        assert_eq!(wrap_cek(&kek, &cek).unwrap(), expected);
    }
}
