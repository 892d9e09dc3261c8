//! File system transfer implementation.

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;
use walkdir::WalkDir;

use super::error::TransferError;
use super::traits::FileTransfer;
use super::types::{TransferKind, TransferOutcome};

/// Applies transfers directly to the local file system.
#[derive(Debug, Clone, Default)]
pub struct FsTransfer;

impl FsTransfer {
    pub fn new() -> Self {
        Self
    }

    /// Attempts to move a file or directory atomically (rename).
    ///
    /// Returns `Ok(false)` when source and destination live on different
    /// filesystems.
    async fn try_atomic_move(source: &Path, destination: &Path) -> Result<bool, io::Error> {
        match fs::rename(source, destination).await {
            Ok(()) => Ok(true),
            Err(e) => {
                // EXDEV is 18 on Linux
                if e.kind() == io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                    Ok(false)
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Moves a single file, falling back to copy and delete across devices.
    async fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
        if Self::try_atomic_move(source, destination).await? {
            return Ok(());
        }

        fs::copy(source, destination).await?;
        fs::remove_file(source).await
    }

    #[cfg(unix)]
    async fn symlink(source: &Path, destination: &Path) -> io::Result<()> {
        fs::symlink(source, destination).await
    }

    #[cfg(windows)]
    async fn symlink(source: &Path, destination: &Path) -> io::Result<()> {
        if fs::metadata(source).await?.is_dir() {
            fs::symlink_dir(source, destination).await
        } else {
            fs::symlink_file(source, destination).await
        }
    }

    async fn reflink(source: &Path, destination: &Path) -> io::Result<()> {
        let source = source.to_path_buf();
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || {
            reflink_copy::reflink_or_copy(&source, &destination).map(|_| ())
        })
        .await
        .map_err(io::Error::other)?
    }

    /// Applies `kind` to a single, non-directory file.
    async fn transfer_file(kind: TransferKind, source: &Path, destination: &Path) -> io::Result<()> {
        match kind {
            TransferKind::Move => Self::move_file(source, destination).await,
            TransferKind::Copy => fs::copy(source, destination).await.map(|_| ()),
            TransferKind::Link => Self::symlink(source, destination).await,
            TransferKind::Hardlink => fs::hard_link(source, destination).await,
            TransferKind::Reflink => Self::reflink(source, destination).await,
        }
    }

    /// Lists every entry below `root`, parents before children.
    async fn list_tree(root: &Path) -> io::Result<Vec<(PathBuf, bool)>> {
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .min_depth(1)
                .sort_by_file_name()
                .into_iter()
                .map(|entry| {
                    let entry = entry.map_err(io::Error::from)?;
                    Ok((entry.path().to_path_buf(), entry.file_type().is_dir()))
                })
                .collect()
        })
        .await
        .map_err(io::Error::other)?
    }

    /// Recreates the directory tree at `destination` and applies `kind` to
    /// each file. Already transferred children stay in place on failure.
    async fn transfer_tree(kind: TransferKind, source: &Path, destination: &Path) -> io::Result<()> {
        fs::create_dir_all(destination).await?;

        for (path, is_dir) in Self::list_tree(source).await? {
            let relative = path.strip_prefix(source).map_err(io::Error::other)?;
            let target = destination.join(relative);
            if is_dir {
                fs::create_dir_all(&target).await?;
            } else {
                Self::transfer_file(kind, &path, &target).await?;
            }
        }

        Ok(())
    }

    async fn transfer_dir(kind: TransferKind, source: &Path, destination: &Path) -> io::Result<()> {
        if kind == TransferKind::Move {
            if Self::try_atomic_move(source, destination).await? {
                return Ok(());
            }
            Self::transfer_tree(kind, source, destination).await?;
            return fs::remove_dir_all(source).await;
        }

        Self::transfer_tree(kind, source, destination).await
    }
}

#[async_trait]
impl FileTransfer for FsTransfer {
    fn name(&self) -> &str {
        "fs"
    }

    async fn transfer(
        &self,
        kind: TransferKind,
        from: &Path,
        to: &Path,
    ) -> Result<TransferOutcome, TransferError> {
        info!("[{}] {} -> {}", kind, from.display(), to.display());

        let source_meta = fs::metadata(from).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                TransferError::SourceNotFound {
                    path: from.to_path_buf(),
                }
            } else {
                TransferError::failed(kind, from.to_path_buf(), to.to_path_buf(), e)
            }
        })?;

        if fs::symlink_metadata(to).await.is_ok() {
            if same_file::is_same_file(from, to).unwrap_or(false) {
                info!(
                    "Source {} same as destination {}",
                    from.display(),
                    to.display()
                );
                return Ok(TransferOutcome::SameFile);
            }
            return Err(TransferError::DestinationExists {
                path: to.to_path_buf(),
            });
        }

        let result = if source_meta.is_dir() {
            Self::transfer_dir(kind, from, to).await
        } else {
            Self::transfer_file(kind, from, to).await
        };

        result
            .map(|()| TransferOutcome::Done)
            .map_err(|e| TransferError::failed(kind, from.to_path_buf(), to.to_path_buf(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.unwrap();
        }
        fs::write(path, content).await.unwrap();
    }

    #[tokio::test]
    async fn test_copy_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("file.log");
        let dest = temp.path().join("out.log");
        write(&source, "log").await;

        let outcome = FsTransfer::new()
            .transfer(TransferKind::Copy, &source, &dest)
            .await
            .unwrap();

        assert_eq!(outcome, TransferOutcome::Done);
        assert!(source.exists());
        assert_eq!(fs::read_to_string(&dest).await.unwrap(), "log");
    }

    #[tokio::test]
    async fn test_move_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("file.cue");
        let dest = temp.path().join("moved.cue");
        write(&source, "cue").await;

        FsTransfer::new()
            .transfer(TransferKind::Move, &source, &dest)
            .await
            .unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&dest).await.unwrap(), "cue");
    }

    #[tokio::test]
    async fn test_move_directory() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("scans");
        let dest = temp.path().join("dest/artwork");
        write(&source.join("front.jpg"), "front").await;
        write(&source.join("inner/back.jpg"), "back").await;
        fs::create_dir_all(temp.path().join("dest")).await.unwrap();

        FsTransfer::new()
            .transfer(TransferKind::Move, &source, &dest)
            .await
            .unwrap();

        assert!(!source.exists());
        assert!(dest.join("front.jpg").exists());
        assert!(dest.join("inner/back.jpg").exists());
    }

    #[tokio::test]
    async fn test_copy_directory() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("scans");
        let dest = temp.path().join("artwork");
        write(&source.join("front.jpg"), "front").await;
        write(&source.join("back.jpg"), "back").await;

        FsTransfer::new()
            .transfer(TransferKind::Copy, &source, &dest)
            .await
            .unwrap();

        assert!(source.join("front.jpg").exists());
        assert_eq!(fs::read_to_string(dest.join("back.jpg")).await.unwrap(), "back");
    }

    #[tokio::test]
    async fn test_hardlink_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("file.log");
        let dest = temp.path().join("linked.log");
        write(&source, "log").await;

        FsTransfer::new()
            .transfer(TransferKind::Hardlink, &source, &dest)
            .await
            .unwrap();

        assert!(same_file::is_same_file(&source, &dest).unwrap());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlink_file() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("file.log");
        let dest = temp.path().join("linked.log");
        write(&source, "log").await;

        FsTransfer::new()
            .transfer(TransferKind::Link, &source, &dest)
            .await
            .unwrap();

        let meta = fs::symlink_metadata(&dest).await.unwrap();
        assert!(meta.file_type().is_symlink());
        assert_eq!(fs::read_link(&dest).await.unwrap(), source);
    }

    #[tokio::test]
    async fn test_reflink_falls_back_to_copy() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("file.cue");
        let dest = temp.path().join("clone.cue");
        write(&source, "cue").await;

        FsTransfer::new()
            .transfer(TransferKind::Reflink, &source, &dest)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&dest).await.unwrap(), "cue");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_same_file_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("file.log");
        let dest = temp.path().join("linked.log");
        write(&source, "log").await;
        fs::hard_link(&source, &dest).await.unwrap();

        let outcome = FsTransfer::new()
            .transfer(TransferKind::Copy, &source, &dest)
            .await
            .unwrap();
        assert_eq!(outcome, TransferOutcome::SameFile);
    }

    #[tokio::test]
    async fn test_existing_destination_error() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("file.log");
        let dest = temp.path().join("other.log");
        write(&source, "new").await;
        write(&dest, "old").await;

        let result = FsTransfer::new()
            .transfer(TransferKind::Move, &source, &dest)
            .await;

        assert!(matches!(result, Err(TransferError::DestinationExists { .. })));
        assert_eq!(fs::read_to_string(&dest).await.unwrap(), "old");
        assert!(source.exists());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let temp = TempDir::new().unwrap();
        let result = FsTransfer::new()
            .transfer(
                TransferKind::Copy,
                &temp.path().join("missing.log"),
                &temp.path().join("out.log"),
            )
            .await;
        assert!(matches!(result, Err(TransferError::SourceNotFound { .. })));
    }

    #[tokio::test]
    async fn test_failure_is_wrapped() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("file.log");
        write(&source, "log").await;
        // Parent directory does not exist
        let dest = temp.path().join("nowhere/out.log");

        let result = FsTransfer::new()
            .transfer(TransferKind::Copy, &source, &dest)
            .await;

        match result {
            Err(TransferError::Failed { kind, from, to, .. }) => {
                assert_eq!(kind, TransferKind::Copy);
                assert_eq!(from, source);
                assert_eq!(to, dest);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
