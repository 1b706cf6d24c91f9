//! Unlock failure taxonomy.
//!
//! Nothing in this crate retries; every failure goes back to the caller,
//! which decides whether to re-prompt or abort.

use {hubkey_device::DeviceError, hubkey_jwe::JweError};

#[derive(Debug, thiserror::Error)]
pub enum UnlockError {
    /// Token framing is invalid. Never recoverable.
    #[error("malformed wrapped key: {0}")]
    MalformedWrap(String),

    /// Setup code rejected. The user may try again with another code.
    #[error("incorrect setup code")]
    WrongSetupCode,

    /// The token was not wrapped for this key, or was tampered with.
    #[error("wrapped key does not belong to this key")]
    WrongKey,

    /// Authentication succeeded but the plaintext is not a valid key payload.
    #[error("malformed key payload: {0}")]
    MalformedPayload(String),

    /// The device keystore cannot be used on this device.
    #[error("device identity unavailable: {0}")]
    DeviceIdentityUnavailable(String),

    /// Producing a token failed.
    #[error("encryption failed: {0}")]
    Encryption(String),
}

impl UnlockError {
    /// Whether prompting the user again can resolve the failure.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(self, Self::WrongSetupCode)
    }

    pub(crate) fn payload(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }
}

impl From<JweError> for UnlockError {
    fn from(err: JweError) -> Self {
        match err {
            JweError::MalformedWrap(m) => Self::MalformedWrap(m),
            JweError::WrongSetupCode => Self::WrongSetupCode,
            JweError::WrongKey => Self::WrongKey,
            JweError::KeyUnavailable(m) => Self::DeviceIdentityUnavailable(m),
            JweError::Encryption(m) | JweError::InvalidParams(m) => Self::Encryption(m),
        }
    }
}

impl From<DeviceError> for UnlockError {
    fn from(err: DeviceError) -> Self {
        match err {
            DeviceError::Unavailable(message) => Self::DeviceIdentityUnavailable(message),
            other => Self::DeviceIdentityUnavailable(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, UnlockError>;
