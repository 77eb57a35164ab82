//! Sync error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while pulling or pushing a collection.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The document store could not be reached or refused the read
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// A batch commit was rejected by the document store
    #[error("Remote write failed: {0}")]
    RemoteWriteFailed(String),

    /// Filesystem failure on a mirror path
    #[error("I/O error for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A local mirror file is not a valid level record
    #[error("Malformed record {}: {reason}", .path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    /// A post-write count or existence check came up short
    #[error("Verification mismatch: expected {expected}, found {found}")]
    VerificationMismatch { expected: usize, found: usize },
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SyncError::MalformedRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code reported for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SyncError::RemoteUnavailable(_) => 2,
            SyncError::RemoteWriteFailed(_) => 3,
            SyncError::Io { .. } => 4,
            SyncError::MalformedRecord { .. } => 5,
            SyncError::VerificationMismatch { .. } => 6,
        }
    }
}
