//! Extra file handling for a music library importer.
//!
//! The host importer reports every track it moves, copies or links. At the
//! end of its run, [`ExtraFiles::finish`] groups those tracks into albums,
//! finds the non-audio files that came with each album (logs, cue sheets,
//! artwork directories) and applies the same operation to them, placing
//! each at a templated destination.

pub mod batch;
pub mod config;
pub mod events;
pub mod grouper;
pub mod matcher;
pub mod pathutil;
pub mod resolver;
pub mod template;
pub mod testing;
pub mod transfer;

pub use batch::{BatchReport, ExtraFiles, KindReport};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, PatternList,
};
pub use events::{AlbumInfo, HostEvent, TrackItem};
pub use grouper::{group_albums, AlbumGroup};
pub use matcher::{MatchError, PatternMatcher, ScannedPaths};
pub use resolver::{
    AlbumMetadata, DestinationResolver, PathFormatTable, ResolveError, DEFAULT_TEMPLATE,
};
pub use template::{FieldSource, FieldValue, PathTemplate, TemplateError, TemplateFunctions};
pub use transfer::{
    FileTransfer, FsTransfer, TransferError, TransferKind, TransferOutcome, TransferRecord,
};
