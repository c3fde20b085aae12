//! Storage error types.

use thiserror::Error;

use super::names::InvalidName;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Object not found in storage.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Authorization failure reported by the backend.
    #[error("permission denied: {key}")]
    PermissionDenied {
        /// Storage key the backend refused access to.
        key: String,
    },

    /// Bucket or object name failed the backend naming rules.
    #[error(transparent)]
    InvalidName(#[from] InvalidName),

    /// Presign operation not supported by provider.
    #[error("presign operation not supported by storage provider")]
    PresignNotSupported,

    /// Operation has no counterpart in the configured provider.
    #[error("operation not supported by storage provider: {0}")]
    Unsupported(&'static str),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// Backend operation error.
    #[error("storage operation failed: {0}")]
    Operation(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a permission denied error.
    #[must_use]
    pub fn permission_denied(key: impl Into<String>) -> Self {
        Self::PermissionDenied { key: key.into() }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create an operation error.
    #[must_use]
    pub fn operation(msg: impl Into<String>) -> Self {
        Self::Operation(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound {
                key: err.to_string(),
            },
            opendal::ErrorKind::PermissionDenied => Self::PermissionDenied {
                key: err.to_string(),
            },
            opendal::ErrorKind::Unsupported => Self::PresignNotSupported,
            _ => Self::Operation(err.to_string()),
        }
    }
}
