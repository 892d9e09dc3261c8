//! Host import pipeline events and the track data they carry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::transfer::{TransferKind, TransferRecord};

/// Read-only view of a track item owned by the host library.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackItem {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub albumartist: String,
    #[serde(default)]
    pub album: String,
}

impl TrackItem {
    pub fn new(artist: impl Into<String>, albumartist: impl Into<String>, album: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            albumartist: albumartist.into(),
            album: album.into(),
        }
    }

    /// Album artist, or the track artist when the album artist is empty.
    pub fn effective_albumartist(&self) -> &str {
        if self.albumartist.is_empty() {
            &self.artist
        } else {
            &self.albumartist
        }
    }

    /// Key tracks are grouped into albums by.
    pub fn album_key(&self) -> (&str, &str) {
        (self.effective_albumartist(), &self.album)
    }
}

/// Album summary carried by the album-imported event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlbumInfo {
    #[serde(default)]
    pub albumartist: String,
    #[serde(default)]
    pub album: String,
}

impl fmt::Display for AlbumInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.albumartist, self.album)
    }
}

/// Events emitted by the host import pipeline, in the order it emits them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    AlbumImported {
        album: AlbumInfo,
    },
    ItemMoved {
        item: TrackItem,
        source: PathBuf,
        destination: PathBuf,
    },
    ItemCopied {
        item: TrackItem,
        source: PathBuf,
        destination: PathBuf,
    },
    ItemLinked {
        item: TrackItem,
        source: PathBuf,
        destination: PathBuf,
    },
    ItemHardlinked {
        item: TrackItem,
        source: PathBuf,
        destination: PathBuf,
    },
    ItemReflinked {
        item: TrackItem,
        source: PathBuf,
        destination: PathBuf,
    },
    /// The host run is ending.
    CliExit,
}

impl HostEvent {
    /// Builds the item event matching `kind`.
    pub fn item_transferred(
        kind: TransferKind,
        item: TrackItem,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
    ) -> Self {
        let (source, destination) = (source.into(), destination.into());
        match kind {
            TransferKind::Move => Self::ItemMoved {
                item,
                source,
                destination,
            },
            TransferKind::Copy => Self::ItemCopied {
                item,
                source,
                destination,
            },
            TransferKind::Link => Self::ItemLinked {
                item,
                source,
                destination,
            },
            TransferKind::Hardlink => Self::ItemHardlinked {
                item,
                source,
                destination,
            },
            TransferKind::Reflink => Self::ItemReflinked {
                item,
                source,
                destination,
            },
        }
    }

    /// The transfer this event reports, if it is an item event.
    pub fn into_transfer(self) -> Option<(TransferKind, TransferRecord)> {
        let (kind, item, source, destination) = match self {
            Self::ItemMoved {
                item,
                source,
                destination,
            } => (TransferKind::Move, item, source, destination),
            Self::ItemCopied {
                item,
                source,
                destination,
            } => (TransferKind::Copy, item, source, destination),
            Self::ItemLinked {
                item,
                source,
                destination,
            } => (TransferKind::Link, item, source, destination),
            Self::ItemHardlinked {
                item,
                source,
                destination,
            } => (TransferKind::Hardlink, item, source, destination),
            Self::ItemReflinked {
                item,
                source,
                destination,
            } => (TransferKind::Reflink, item, source, destination),
            Self::AlbumImported { .. } | Self::CliExit => return None,
        };
        Some((kind, TransferRecord::new(item, source, destination)))
    }
}
