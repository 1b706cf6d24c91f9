//! Device identity error types.

/// Errors produced by keystores and the device identity manager.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// The keystore cannot be used or the device key cannot be created.
    #[error("device identity unavailable: {0}")]
    Unavailable(String),

    /// A cryptographic operation with the device key failed.
    #[error("device key operation failed: {0}")]
    Crypto(String),

    /// Keystore I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Keystore file could not be (de)serialized.
    #[error("keystore file: {0}")]
    Json(#[from] serde_json::Error),
}

impl DeviceError {
    pub(crate) fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}

pub type Result<T> = std::result::Result<T, DeviceError>;
