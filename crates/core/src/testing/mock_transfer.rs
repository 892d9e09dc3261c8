//! Mock transfer for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::transfer::{FileTransfer, TransferError, TransferKind, TransferOutcome};

/// A recorded transfer for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTransfer {
    pub kind: TransferKind,
    pub from: PathBuf,
    pub to: PathBuf,
    /// Whether the transfer succeeded.
    pub success: bool,
}

/// Mock implementation of the [`FileTransfer`] trait.
///
/// Records every request without touching the filesystem. Clones share
/// their recorded state, so a clone can be handed to the batch context and
/// inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct MockTransfer {
    transfers: Arc<RwLock<Vec<RecordedTransfer>>>,
    /// Sources whose next transfer fails.
    failing: Arc<RwLock<HashSet<PathBuf>>>,
    /// Sources reported as the same file as their destination.
    same_file: Arc<RwLock<HashSet<PathBuf>>>,
}

impl MockTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded transfers.
    pub async fn recorded_transfers(&self) -> Vec<RecordedTransfer> {
        self.transfers.read().await.clone()
    }

    /// Get the number of transfers requested.
    pub async fn transfer_count(&self) -> usize {
        self.transfers.read().await.len()
    }

    /// Make the next transfer of `source` fail.
    pub async fn fail_on(&self, source: impl Into<PathBuf>) {
        self.failing.write().await.insert(source.into());
    }

    /// Report `source` as already being its destination.
    pub async fn same_file_on(&self, source: impl Into<PathBuf>) {
        self.same_file.write().await.insert(source.into());
    }

    async fn record(&self, kind: TransferKind, from: &Path, to: &Path, success: bool) {
        self.transfers.write().await.push(RecordedTransfer {
            kind,
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            success,
        });
    }
}

#[async_trait]
impl FileTransfer for MockTransfer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transfer(
        &self,
        kind: TransferKind,
        from: &Path,
        to: &Path,
    ) -> Result<TransferOutcome, TransferError> {
        if self.failing.write().await.remove(from) {
            self.record(kind, from, to, false).await;
            return Err(TransferError::failed(
                kind,
                from.to_path_buf(),
                to.to_path_buf(),
                std::io::Error::other("mock failure"),
            ));
        }

        self.record(kind, from, to, true).await;
        if self.same_file.read().await.contains(from) {
            Ok(TransferOutcome::SameFile)
        } else {
            Ok(TransferOutcome::Done)
        }
    }
}
