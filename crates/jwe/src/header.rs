//! Protected JWE header, modelled as a tagged union over the two wrap kinds.
//!
//! The JOSE `alg` member selects the variant, so decoding a header either
//! yields a fully-typed [`WrapHeader::Password`] / [`WrapHeader::Agreement`]
//! or fails. Unknown members are ignored.

use {
    p384::elliptic_curve::JwkEcKey,
    serde::{Deserialize, Serialize},
};

/// JOSE `alg` identifier for password-based wraps.
pub const PBES2_ALG: &str = "PBES2-HS512+A256KW";

/// JOSE `alg` identifier for direct ECDH-ES key agreement.
pub const ECDH_ES_ALG: &str = "ECDH-ES";

/// Content-encryption (`enc`) algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentAlgorithm {
    /// AES-256-GCM with a 96-bit IV and a 128-bit tag.
    #[serde(rename = "A256GCM")]
    A256Gcm,
}

impl ContentAlgorithm {
    /// JOSE identifier, also used as the Concat KDF `AlgorithmID`.
    pub fn id(self) -> &'static str {
        match self {
            Self::A256Gcm => "A256GCM",
        }
    }

    /// Content-encryption key length in bits.
    pub fn key_bits(self) -> u32 {
        match self {
            Self::A256Gcm => 256,
        }
    }
}

/// Which unwrap path a token requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapKind {
    Password,
    Agreement,
}

impl std::fmt::Display for WrapKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password => f.write_str("password-wrap"),
            Self::Agreement => f.write_str("ec-agreement-wrap"),
        }
    }
}

/// Decoded protected header.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "alg")]
pub enum WrapHeader {
    #[serde(rename = "PBES2-HS512+A256KW")]
    Password(PasswordParams),
    #[serde(rename = "ECDH-ES")]
    Agreement(AgreementParams),
}

impl WrapHeader {
    pub fn kind(&self) -> WrapKind {
        match self {
            Self::Password(_) => WrapKind::Password,
            Self::Agreement(_) => WrapKind::Agreement,
        }
    }

    pub fn enc(&self) -> ContentAlgorithm {
        match self {
            Self::Password(p) => p.enc,
            Self::Agreement(p) => p.enc,
        }
    }
}

/// PBES2 header members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordParams {
    pub enc: ContentAlgorithm,
    /// Base64url-encoded salt input.
    pub p2s: String,
    /// PBKDF2 iteration count.
    pub p2c: u32,
}

/// ECDH-ES header members.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgreementParams {
    pub enc: ContentAlgorithm,
    /// Sender's ephemeral public key.
    pub epk: JwkEcKey,
    /// Agreement PartyUInfo (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apu: Option<String>,
    /// Agreement PartyVInfo (base64url).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apv: Option<String>,
}
