//! Testing utilities for code built on the batch context.
//!
//! # Example
//!
//! ```rust,ignore
//! use extrafiles_core::testing::MockTransfer;
//! use extrafiles_core::ExtraFiles;
//!
//! let transfer = MockTransfer::new();
//! let mut extrafiles = ExtraFiles::with_transfer(&config, transfer.clone())?;
//!
//! // Feed events, then run the exit pass
//! let report = extrafiles.finish().await;
//!
//! assert_eq!(transfer.transfer_count().await, 2);
//! ```

mod mock_transfer;

pub use mock_transfer::{MockTransfer, RecordedTransfer};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::fs;
    use std::io;
    use std::path::Path;

    use crate::events::TrackItem;

    /// A track item for `album` by `artist`, with the artist as album artist.
    pub fn track(artist: &str, album: &str) -> TrackItem {
        TrackItem::new(artist, artist, album)
    }

    /// Creates an empty file at `path`, including missing parent directories.
    pub fn touch(path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, b"")
    }

    /// Creates `names` below `dir`. Names may contain subdirectories.
    pub fn populate(dir: &Path, names: &[&str]) -> io::Result<()> {
        names.iter().try_for_each(|name| touch(&dir.join(name)))
    }
}
