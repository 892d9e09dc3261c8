//! The per-run batch context.
//!
//! [`ExtraFiles`] collects the host's item transfer events during a run and
//! replays the matching operation for every extra file once the run ends.
//! Operation kinds are processed in [`TransferKind::PROCESSING_ORDER`], so
//! moves run after every kind that only reads its sources.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{Config, ConfigError};
use crate::events::{AlbumInfo, HostEvent, TrackItem};
use crate::grouper::group_albums;
use crate::matcher::{PatternMatcher, ScannedPaths};
use crate::pathutil::{exists, unique_path};
use crate::resolver::{AlbumMetadata, DestinationResolver};
use crate::transfer::{
    FileTransfer, FsTransfer, TransferError, TransferKind, TransferOutcome, TransferRecord,
};

pub use crate::transfer::{BatchReport, KindReport};

/// Run-scoped state: pending transfers per kind, scanned source
/// directories, and destinations created during this run.
pub struct ExtraFiles<T: FileTransfer = FsTransfer> {
    matcher: PatternMatcher,
    resolver: DestinationResolver,
    transfer: T,
    claim_source_once: bool,

    copied: BTreeSet<TransferRecord>,
    linked: BTreeSet<TransferRecord>,
    hardlinked: BTreeSet<TransferRecord>,
    reflinked: BTreeSet<TransferRecord>,
    moved: BTreeSet<TransferRecord>,

    scanned: ScannedPaths,
    created: HashSet<PathBuf>,
    /// `(source, resolved destination)` pairs already placed this run.
    placed: HashSet<(PathBuf, PathBuf)>,
}

impl ExtraFiles<FsTransfer> {
    /// Creates a batch context operating on the real filesystem.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        Self::with_transfer(config, FsTransfer::new())
    }
}

impl<T: FileTransfer> ExtraFiles<T> {
    pub fn with_transfer(config: &Config, transfer: T) -> Result<Self, ConfigError> {
        let matcher = PatternMatcher::from_config(config)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;
        let resolver = DestinationResolver::from_config(config)
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        debug!(
            "Extra file categories: {:?} (transfer: {})",
            matcher.categories().collect::<Vec<_>>(),
            transfer.name()
        );

        Ok(Self {
            matcher,
            resolver,
            transfer,
            claim_source_once: config.claim_source_once,
            copied: BTreeSet::new(),
            linked: BTreeSet::new(),
            hardlinked: BTreeSet::new(),
            reflinked: BTreeSet::new(),
            moved: BTreeSet::new(),
            scanned: ScannedPaths::new(),
            created: HashSet::new(),
            placed: HashSet::new(),
        })
    }

    pub fn on_album_imported(&self, album: &AlbumInfo) {
        info!("[album_imported] album: {}", album);
    }

    pub fn on_item_moved(&mut self, item: TrackItem, source: PathBuf, destination: PathBuf) {
        self.record(TransferKind::Move, TransferRecord::new(item, source, destination));
    }

    pub fn on_item_copied(&mut self, item: TrackItem, source: PathBuf, destination: PathBuf) {
        self.record(TransferKind::Copy, TransferRecord::new(item, source, destination));
    }

    pub fn on_item_linked(&mut self, item: TrackItem, source: PathBuf, destination: PathBuf) {
        self.record(TransferKind::Link, TransferRecord::new(item, source, destination));
    }

    pub fn on_item_hardlinked(&mut self, item: TrackItem, source: PathBuf, destination: PathBuf) {
        self.record(
            TransferKind::Hardlink,
            TransferRecord::new(item, source, destination),
        );
    }

    pub fn on_item_reflinked(&mut self, item: TrackItem, source: PathBuf, destination: PathBuf) {
        self.record(
            TransferKind::Reflink,
            TransferRecord::new(item, source, destination),
        );
    }

    /// Queues a track transfer. Returns false if the same record was
    /// already queued for `kind`.
    pub fn record(&mut self, kind: TransferKind, record: TransferRecord) -> bool {
        self.pending_mut(kind).insert(record)
    }

    /// Dispatches a host event to its handler.
    ///
    /// Returns `true` for [`HostEvent::CliExit`]; the caller then runs
    /// [`ExtraFiles::finish`].
    pub fn handle(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::AlbumImported { album } => {
                self.on_album_imported(&album);
                false
            }
            HostEvent::CliExit => true,
            other => {
                if let Some((kind, record)) = other.into_transfer() {
                    self.record(kind, record);
                }
                false
            }
        }
    }

    /// Number of queued track transfers for `kind`.
    pub fn pending(&self, kind: TransferKind) -> usize {
        match kind {
            TransferKind::Copy => self.copied.len(),
            TransferKind::Link => self.linked.len(),
            TransferKind::Hardlink => self.hardlinked.len(),
            TransferKind::Reflink => self.reflinked.len(),
            TransferKind::Move => self.moved.len(),
        }
    }

    fn pending_mut(&mut self, kind: TransferKind) -> &mut BTreeSet<TransferRecord> {
        match kind {
            TransferKind::Copy => &mut self.copied,
            TransferKind::Link => &mut self.linked,
            TransferKind::Hardlink => &mut self.hardlinked,
            TransferKind::Reflink => &mut self.reflinked,
            TransferKind::Move => &mut self.moved,
        }
    }

    /// Runs the exit pass and consumes the context.
    ///
    /// Per-file failures are logged and counted; they never stop the pass.
    pub async fn finish(mut self) -> BatchReport {
        let started = Instant::now();
        let mut report = BatchReport::default();

        for kind in TransferKind::PROCESSING_ORDER {
            let records = std::mem::take(self.pending_mut(kind));
            if records.is_empty() {
                continue;
            }

            let mut scanned = if self.claim_source_once {
                std::mem::take(&mut self.scanned)
            } else {
                ScannedPaths::new()
            };

            self.process_kind(kind, records, &mut scanned, report.kind_mut(kind))
                .await;

            if self.claim_source_once {
                self.scanned = scanned;
            }
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            "Extra files done: {} placed, {} failed in {}ms",
            report.total_placed(),
            report.total_failed(),
            report.duration_ms
        );
        report
    }

    async fn process_kind(
        &mut self,
        kind: TransferKind,
        records: BTreeSet<TransferRecord>,
        scanned: &mut ScannedPaths,
        counts: &mut KindReport,
    ) {
        for group in group_albums(records) {
            let album = AlbumMetadata::new(&group.item, &group.destination);
            let matches: Vec<(PathBuf, String)> =
                self.matcher.matches(&group.source, scanned).collect();

            for (path, category) in matches {
                let relative = path.strip_prefix(&group.source).unwrap_or(path.as_path());
                let destination = match self.resolver.resolve(relative, &category, &album) {
                    Ok(destination) => destination,
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        counts.failed += 1;
                        continue;
                    }
                };
                info!("{} -> {}", path.display(), destination.display());

                self.place(kind, &path, destination, counts).await;
            }
        }
    }

    async fn place(
        &mut self,
        kind: TransferKind,
        source: &Path,
        destination: PathBuf,
        counts: &mut KindReport,
    ) {
        if !source.exists() {
            warn!("Skipping missing source file: {}", source.display());
            counts.skipped_missing += 1;
            return;
        }

        // Another pattern already matched this source onto the same path
        let requested = (source.to_path_buf(), destination.clone());
        if self.placed.contains(&requested) {
            warn!(
                "Skipping already present destination file: {}",
                destination.display()
            );
            counts.skipped_existing += 1;
            return;
        }

        let destination = if !exists(&destination) {
            destination
        } else if self.created.contains(&destination) {
            unique_path(&destination)
        } else {
            warn!(
                "Skipping already present destination file: {}",
                destination.display()
            );
            counts.skipped_existing += 1;
            return;
        };

        if let Some(parent) = destination.parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                let error = TransferError::DirectoryCreationFailed {
                    path: parent.to_path_buf(),
                    source: e,
                };
                warn!(
                    "Failed to process file: {} -> {}: {}",
                    source.display(),
                    destination.display(),
                    error
                );
                counts.failed += 1;
                return;
            }
        }

        match self.transfer.transfer(kind, source, &destination).await {
            Ok(TransferOutcome::Done) => {
                counts.placed += 1;
                self.created.insert(destination);
                self.placed.insert(requested);
            }
            Ok(TransferOutcome::SameFile) => counts.same_file += 1,
            Err(e) if e.is_skip() => {
                warn!("Skipping {}: {}", source.display(), e);
                if matches!(e, TransferError::SourceNotFound { .. }) {
                    counts.skipped_missing += 1;
                } else {
                    counts.skipped_existing += 1;
                }
            }
            Err(e) => {
                warn!(
                    "Failed to process file: {} -> {}: {}",
                    source.display(),
                    destination.display(),
                    e
                );
                counts.failed += 1;
            }
        }
    }
}
