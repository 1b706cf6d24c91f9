//! PBES2 key derivation: setup code → KEK via PBKDF2-HMAC-SHA512.

use {
    base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD},
    rand::RngCore,
    sha2::Sha512,
    zeroize::Zeroizing,
};

use crate::error::{JweError, Result};

/// Lowest iteration count accepted when reading a token.
pub const MIN_ITERATIONS: u32 = 1_000;

/// Highest iteration count accepted when reading a token.
pub const MAX_ITERATIONS: u32 = 10_000_000;

/// Length of the random salt input (`p2s`) in bytes.
pub const SALT_LEN: usize = 16;

/// PBES2 work factor used when producing new tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Pbes2Params {
    /// PBKDF2 iteration count (`p2c`).
    pub iterations: u32,
}

impl Default for Pbes2Params {
    fn default() -> Self {
        Self {
            iterations: 1_000_000,
        }
    }
}

impl Pbes2Params {
    pub fn validate(&self) -> Result<()> {
        check_iterations(self.iterations).map_err(|_| {
            JweError::InvalidParams(format!(
                "iterations must be within {MIN_ITERATIONS}..={MAX_ITERATIONS}, got {}",
                self.iterations
            ))
        })
    }
}

/// Reject iteration counts a well-behaved writer would never produce.
pub fn check_iterations(iterations: u32) -> Result<()> {
    if (MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) {
        Ok(())
    } else {
        Err(JweError::malformed(format!(
            "p2c {iterations} outside {MIN_ITERATIONS}..={MAX_ITERATIONS}"
        )))
    }
}

/// Derive the 256-bit KEK. The PBKDF2 salt is `alg || 0x00 || p2s`.
pub fn derive_kek(
    setup_code: &[u8],
    alg: &str,
    p2s: &[u8],
    iterations: u32,
) -> Zeroizing<[u8; 32]> {
    let mut salt = Vec::with_capacity(alg.len() + 1 + p2s.len());
    salt.extend_from_slice(alg.as_bytes());
    salt.push(0x00);
    salt.extend_from_slice(p2s);

    let mut output = Zeroizing::new([0u8; 32]);
    pbkdf2::pbkdf2_hmac::<Sha512>(setup_code, &salt, iterations, output.as_mut());
    output
}

/// Generate a random salt input and return it base64url-encoded.
pub fn generate_salt() -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::rng().fill_bytes(&mut salt);
    URL_SAFE_NO_PAD.encode(salt)
}
