//! Transfer error types.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::storage::{InvalidName, StorageError};

/// Errors surfaced by the resumable download protocol.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Bucket or object name failed the backend naming rules. No network
    /// call was made.
    #[error(transparent)]
    InvalidName(#[from] InvalidName),

    /// The remote object does not exist.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The backend refused access to the object.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The destination path is occupied by a directory.
    #[error("destination path is a directory: {0}")]
    DestinationConflict(PathBuf),

    /// The byte stream ended early, failed mid-flight, or disagreed with
    /// the size reported by the last stat. The partial file is preserved
    /// so a later call can resume.
    #[error("transfer interrupted: {0}")]
    Interrupted(String),

    /// The completed partial file could not be renamed into place. The
    /// partial file is preserved so a later call can retry the commit.
    #[error("failed to commit completed download: {0}")]
    CommitFailed(String),

    /// The caller cancelled the transfer. The partial file is preserved.
    #[error("transfer cancelled")]
    Cancelled,

    /// A local filesystem operation failed outside the streaming phase.
    #[error("local I/O error at {path}: {source}")]
    LocalIo {
        /// Path of the failing filesystem operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Any other backend error, surfaced verbatim.
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl TransferError {
    /// Create a destination conflict error.
    #[must_use]
    pub fn destination_conflict(path: &Path) -> Self {
        Self::DestinationConflict(path.to_path_buf())
    }

    /// Create an interrupted-transfer error.
    #[must_use]
    pub fn interrupted(msg: impl Into<String>) -> Self {
        Self::Interrupted(msg.into())
    }

    /// Create a commit failure error.
    #[must_use]
    pub fn commit_failed(msg: impl Into<String>) -> Self {
        Self::CommitFailed(msg.into())
    }

    /// Create a local I/O error tied to `path`.
    #[must_use]
    pub fn local_io(path: &Path, source: std::io::Error) -> Self {
        Self::LocalIo {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Whether the partial file must be left on disk for a later resume.
    ///
    /// Interruptions, cancellations, and failed commits are resumable
    /// states; every other failure deletes the partial file.
    #[must_use]
    pub fn preserves_partial(&self) -> bool {
        matches!(
            self,
            Self::Interrupted(_) | Self::Cancelled | Self::CommitFailed(_)
        )
    }
}

impl From<opendal::Error> for TransferError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            opendal::ErrorKind::PermissionDenied => Self::PermissionDenied(err.to_string()),
            _ => Self::Backend(err.to_string()),
        }
    }
}

impl From<StorageError> for TransferError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { key } => Self::NotFound(key),
            StorageError::PermissionDenied { key } => Self::PermissionDenied(key),
            StorageError::InvalidName(e) => Self::InvalidName(e),
            other => Self::Backend(other.to_string()),
        }
    }
}
