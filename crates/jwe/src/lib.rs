//! Key wrapping in JWE compact form for hub-managed vault keys.
//!
//! Two wrap kinds are supported, both with AES-256-GCM content encryption:
//!
//! - **password-wrap** (`PBES2-HS512+A256KW`): a setup code protects the
//!   user's long-term private key.
//! - **ec-agreement-wrap** (`ECDH-ES` on P-384): a recipient's public key
//!   protects a user key (for a device) or a vault master key (for a user).
//!
//! The header, including every wrap parameter, is bound to the ciphertext as
//! AEAD associated data. All operations are synchronous and stateless.

pub mod a256gcm;
pub mod agreement;
pub mod cipher;
pub mod compact;
pub mod ecdh_es;
pub mod error;
pub mod header;
pub mod kdf;
pub mod key_wrap;
pub mod pbes2;

pub use {
    agreement::KeyAgreement,
    cipher::Cipher,
    compact::{CompactJwe, ProtectedHeader},
    error::{JweError, Result},
    header::{ContentAlgorithm, WrapHeader, WrapKind},
    kdf::Pbes2Params,
};

/// Report which unwrap path a token needs without verifying it.
pub fn wrap_kind(token: &str) -> Result<WrapKind> {
    Ok(CompactJwe::decode(token)?.header().kind())
}
