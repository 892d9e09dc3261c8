//! Transfer module for replicating the host's file operation on extra files.
//!
//! This module provides the `FileTransfer` trait and a file system
//! implementation covering every operation the host can apply to a track.
//!
//! # Features
//!
//! - Atomic moves when source and destination are on the same filesystem
//! - Automatic fallback to copy and delete when the rename crosses devices
//! - Symbolic links, hard links and reflinks (copy-on-write, falling back to copy)
//! - Whole directory trees, transferred file by file
//! - Same-file detection, never an error
//!
//! # Example
//!
//! ```ignore
//! use extrafiles_core::transfer::{FileTransfer, FsTransfer, TransferKind};
//!
//! let transfer = FsTransfer::new();
//! let outcome = transfer
//!     .transfer(TransferKind::Copy, Path::new("/src/album/file.log"), Path::new("/music/album/audio.log"))
//!     .await?;
//! ```

mod error;
mod fs_transfer;
mod traits;
mod types;

pub use error::TransferError;
pub use fs_transfer::FsTransfer;
pub use traits::FileTransfer;
pub use types::{BatchReport, KindReport, TransferKind, TransferOutcome, TransferRecord};
