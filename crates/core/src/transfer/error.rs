//! Error types for the transfer module.

use std::path::PathBuf;
use thiserror::Error;

use super::types::TransferKind;

/// Errors that can occur while transferring an extra file.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Source file vanished before it could be processed.
    #[error("Source file not found: {path}")]
    SourceNotFound { path: PathBuf },

    /// Destination already exists and is a different file.
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    /// Failed to create the destination directory.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The underlying filesystem operation failed.
    #[error("{kind} failed from {from} to {to}")]
    Failed {
        kind: TransferKind,
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

impl TransferError {
    /// Creates an operation failed error.
    pub fn failed(kind: TransferKind, from: PathBuf, to: PathBuf, error: std::io::Error) -> Self {
        Self::Failed {
            kind,
            from,
            to,
            error,
        }
    }

    /// Whether this error means the entry was skipped rather than attempted.
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::SourceNotFound { .. } | Self::DestinationExists { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_failed_carries_kind_and_paths() {
        let err = TransferError::failed(
            TransferKind::Hardlink,
            PathBuf::from("/src/a.log"),
            PathBuf::from("/dst/a.log"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "HARDLINK failed from /src/a.log to /dst/a.log");
        assert!(err.source().is_some());
        assert!(!err.is_skip());
    }

    #[test]
    fn test_skip_classification() {
        let err = TransferError::SourceNotFound {
            path: PathBuf::from("/gone"),
        };
        assert!(err.is_skip());
    }
}
