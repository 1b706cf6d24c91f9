//! Compact serialization: `header.params.iv.ciphertext.tag`.
//!
//! Pure framing. Nothing here checks authenticity; that is left to the
//! unwrap engines, which feed [`ProtectedHeader::aad`] into the AEAD.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

use crate::{
    error::{JweError, Result},
    header::WrapHeader,
};

const SEGMENTS: usize = 5;

/// A header together with the exact base64url text it was read from (or
/// encoded to). The encoded form is the associated data of the AEAD.
#[derive(Debug, Clone)]
pub struct ProtectedHeader {
    header: WrapHeader,
    encoded: String,
}

impl ProtectedHeader {
    /// Serialize and encode a header.
    pub fn new(header: WrapHeader) -> Result<Self> {
        let json = serde_json::to_vec(&header)
            .map_err(|e| JweError::Encryption(format!("header serialization: {e}")))?;
        let encoded = URL_SAFE_NO_PAD.encode(json);
        Ok(Self { header, encoded })
    }

    fn parse(encoded: &str) -> Result<Self> {
        let json = URL_SAFE_NO_PAD.decode(encoded)?;
        let header = serde_json::from_slice(&json)
            .map_err(|e| JweError::malformed(format!("header: {e}")))?;
        Ok(Self {
            header,
            encoded: encoded.to_string(),
        })
    }

    pub fn header(&self) -> &WrapHeader {
        &self.header
    }

    pub fn aad(&self) -> &[u8] {
        self.encoded.as_bytes()
    }
}

/// A decoded (not yet verified) token.
#[derive(Debug, Clone)]
pub struct CompactJwe {
    pub protected: ProtectedHeader,
    /// Wrap-specific parameters: the wrapped CEK for PBES2, empty for ECDH-ES.
    pub encrypted_key: Vec<u8>,
    pub iv: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub tag: Vec<u8>,
}

impl CompactJwe {
    /// Split and decode a token.
    pub fn decode(token: &str) -> Result<Self> {
        let parts: Vec<&str> = token.trim().split('.').collect();
        if parts.len() != SEGMENTS {
            return Err(JweError::malformed(format!(
                "expected {SEGMENTS} segments, found {}",
                parts.len()
            )));
        }

        let protected = ProtectedHeader::parse(parts[0])?;
        Ok(Self {
            protected,
            encrypted_key: URL_SAFE_NO_PAD.decode(parts[1])?,
            iv: URL_SAFE_NO_PAD.decode(parts[2])?,
            ciphertext: URL_SAFE_NO_PAD.decode(parts[3])?,
            tag: URL_SAFE_NO_PAD.decode(parts[4])?,
        })
    }

    pub fn header(&self) -> &WrapHeader {
        self.protected.header()
    }
}

/// Join an already-encoded header with the binary parts of a token.
pub fn encode(
    protected: &ProtectedHeader,
    encrypted_key: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> String {
    [
        protected.encoded.clone(),
        URL_SAFE_NO_PAD.encode(encrypted_key),
        URL_SAFE_NO_PAD.encode(iv),
        URL_SAFE_NO_PAD.encode(ciphertext),
        URL_SAFE_NO_PAD.encode(tag),
    ]
    .join(".")
}
