//! Key wrapping error types.

/// Errors produced while encoding, decoding, wrapping or unwrapping tokens.
#[derive(Debug, thiserror::Error)]
pub enum JweError {
    /// Token framing is invalid: wrong segment count, bad base64url, or a
    /// header that does not describe a supported wrap.
    #[error("malformed wrapped key: {0}")]
    MalformedWrap(String),

    /// Password-based authentication failed (wrong setup code or tampered token).
    #[error("incorrect setup code")]
    WrongSetupCode,

    /// Agreement-based authentication failed (wrong key, tampered token or
    /// foreign curve).
    #[error("wrapped key does not belong to this key")]
    WrongKey,

    /// The private key could not perform the agreement (e.g. its keystore is
    /// gone).
    #[error("key agreement unavailable: {0}")]
    KeyUnavailable(String),

    /// Producing a token failed.
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Wrap parameters are out of the accepted range.
    #[error("invalid wrap parameters: {0}")]
    InvalidParams(String),
}

impl JweError {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedWrap(message.into())
    }
}

impl From<base64::DecodeError> for JweError {
    fn from(err: base64::DecodeError) -> Self {
        Self::MalformedWrap(format!("base64url: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, JweError>;
