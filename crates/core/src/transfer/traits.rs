//! Trait definitions for the transfer module.

use async_trait::async_trait;
use std::path::Path;

use super::error::TransferError;
use super::types::{TransferKind, TransferOutcome};

/// Something that can carry out a filesystem operation on one extra file or
/// directory tree.
///
/// Callers have already checked that the source exists, picked a
/// destination, and created its parent directory.
#[async_trait]
pub trait FileTransfer: Send + Sync {
    /// Returns the name of this implementation.
    fn name(&self) -> &str;

    /// Applies `kind` to `from`, producing `to`.
    async fn transfer(
        &self,
        kind: TransferKind,
        from: &Path,
        to: &Path,
    ) -> Result<TransferOutcome, TransferError>;
}
