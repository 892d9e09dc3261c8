//! Types for the transfer module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::events::TrackItem;

/// The filesystem operation the host applied to a track, replicated for its extra files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferKind {
    /// Rename, or copy then delete across filesystems.
    Move,
    /// Plain copy.
    Copy,
    /// Symbolic link pointing at the source.
    Link,
    /// Hard link to the source inode.
    Hardlink,
    /// Copy-on-write clone, falling back to a plain copy.
    Reflink,
}

impl TransferKind {
    /// Kinds in the order the exit pass processes them. Move runs last since
    /// it removes its sources.
    pub const PROCESSING_ORDER: [TransferKind; 5] = [
        TransferKind::Copy,
        TransferKind::Link,
        TransferKind::Hardlink,
        TransferKind::Reflink,
        TransferKind::Move,
    ];

    /// Upper-case name used in log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Move => "MOVE",
            Self::Copy => "COPY",
            Self::Link => "LINK",
            Self::Hardlink => "HARDLINK",
            Self::Reflink => "REFLINK",
        }
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single track transfer reported by the host.
///
/// Records are value-equal triples; repeated notifications for the same
/// triple collapse when stored in a set.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TransferRecord {
    /// The transferred track.
    pub item: TrackItem,
    /// Where the track was before the transfer.
    pub source: PathBuf,
    /// Where the track ended up.
    pub destination: PathBuf,
}

impl TransferRecord {
    pub fn new(item: TrackItem, source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            item,
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// How a single transfer ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferOutcome {
    /// The operation was carried out.
    Done,
    /// Source and destination already refer to the same file.
    SameFile,
}

/// Counters for one operation kind in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindReport {
    /// Extra files placed at their destination.
    pub placed: usize,
    /// Entries whose source had vanished.
    pub skipped_missing: usize,
    /// Entries whose destination was already present before this run.
    pub skipped_existing: usize,
    /// Entries where source and destination were the same file.
    pub same_file: usize,
    /// Entries whose filesystem operation failed.
    pub failed: usize,
}

impl KindReport {
    /// Total number of entries seen.
    pub fn total(&self) -> usize {
        self.placed + self.skipped_missing + self.skipped_existing + self.same_file + self.failed
    }
}

/// Result of an exit pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub copy: KindReport,
    pub link: KindReport,
    pub hardlink: KindReport,
    pub reflink: KindReport,
    #[serde(rename = "move")]
    pub moved: KindReport,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl BatchReport {
    /// Counters for the given kind.
    pub fn kind(&self, kind: TransferKind) -> &KindReport {
        match kind {
            TransferKind::Copy => &self.copy,
            TransferKind::Link => &self.link,
            TransferKind::Hardlink => &self.hardlink,
            TransferKind::Reflink => &self.reflink,
            TransferKind::Move => &self.moved,
        }
    }

    pub(crate) fn kind_mut(&mut self, kind: TransferKind) -> &mut KindReport {
        match kind {
            TransferKind::Copy => &mut self.copy,
            TransferKind::Link => &mut self.link,
            TransferKind::Hardlink => &mut self.hardlink,
            TransferKind::Reflink => &mut self.reflink,
            TransferKind::Move => &mut self.moved,
        }
    }

    /// Files placed across all kinds.
    pub fn total_placed(&self) -> usize {
        TransferKind::PROCESSING_ORDER
            .iter()
            .map(|k| self.kind(*k).placed)
            .sum()
    }

    /// Failures across all kinds.
    pub fn total_failed(&self) -> usize {
        TransferKind::PROCESSING_ORDER
            .iter()
            .map(|k| self.kind(*k).failed)
            .sum()
    }
}
