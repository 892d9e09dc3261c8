//! Groups transferred tracks into albums.

use std::collections::BTreeSet;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::vec;
use tracing::{debug, warn};

use crate::events::TrackItem;
use crate::pathutil::common_path;
use crate::transfer::TransferRecord;

/// One album's worth of transferred tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumGroup {
    /// Deepest directory containing every source track.
    pub source: PathBuf,
    /// Deepest directory containing every destination track.
    pub destination: PathBuf,
    /// First track of the group, used for album metadata.
    pub item: TrackItem,
    /// Number of tracks in the group.
    pub count: usize,
}

/// Groups records by `(albumartist or artist, album)`.
///
/// Records are stable-sorted by that key, then each run of equal keys
/// becomes one [`AlbumGroup`]. Groups without a common source or
/// destination directory are logged and skipped.
pub fn group_albums<I>(records: I) -> AlbumGroups
where
    I: IntoIterator<Item = TransferRecord>,
{
    let mut records: Vec<TransferRecord> = records.into_iter().collect();
    records.sort_by(|a, b| a.item.album_key().cmp(&b.item.album_key()));

    AlbumGroups {
        records: records.into_iter().peekable(),
    }
}

/// Iterator returned by [`group_albums`].
pub struct AlbumGroups {
    records: Peekable<vec::IntoIter<TransferRecord>>,
}

impl AlbumGroups {
    fn next_run(&mut self) -> Option<Vec<TransferRecord>> {
        let first = self.records.next()?;
        let key = first.item.clone();
        let mut run = vec![first];
        while let Some(record) = self
            .records
            .next_if(|next| next.item.album_key() == key.album_key())
        {
            run.push(record);
        }
        Some(run)
    }
}

impl Iterator for AlbumGroups {
    type Item = AlbumGroup;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let run = self.next_run()?;

            let source = common_parent(run.iter().map(|r| r.source.as_path()));
            let destination = common_parent(run.iter().map(|r| r.destination.as_path()));
            let item = run[0].item.clone();

            let (Some(source), Some(destination)) = (source, destination) else {
                warn!(
                    "No common directory for {} by {}, skipping its extra files",
                    item.album,
                    item.effective_albumartist()
                );
                continue;
            };

            debug!(
                "{} -> {} ({} by {}, {} tracks)",
                source.display(),
                destination.display(),
                item.album,
                item.albumartist,
                run.len()
            );

            return Some(AlbumGroup {
                source,
                destination,
                item,
                count: run.len(),
            });
        }
    }
}

fn common_parent<'a>(paths: impl Iterator<Item = &'a Path>) -> Option<PathBuf> {
    let parents: BTreeSet<&Path> = paths.filter_map(Path::parent).collect();
    common_path(parents)
}
