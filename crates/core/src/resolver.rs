//! Destination paths for matched extra files.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::Config;
use crate::events::TrackItem;
use crate::pathutil::sanitize_path;
use crate::template::{FieldSource, FieldValue, PathTemplate, TemplateError, TemplateFunctions};

/// Template used for categories without an entry in `paths`.
pub const DEFAULT_TEMPLATE: &str = "$albumpath/$filename";

/// Placeholder for empty album metadata.
const MISSING_VALUE: &str = "None";

/// Errors raised while resolving a destination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Templates render text; the path would be renamed.
    #[error("Path is not valid UTF-8: {}", path.display())]
    NotUnicode { path: PathBuf },
}

/// Category to destination template. First match wins; unmatched
/// categories use [`DEFAULT_TEMPLATE`].
#[derive(Debug, Clone)]
pub struct PathFormatTable {
    formats: Vec<(String, PathTemplate)>,
    default: PathTemplate,
}

impl PathFormatTable {
    pub fn new(paths: &BTreeMap<String, String>) -> Result<Self, TemplateError> {
        let formats = paths
            .iter()
            .map(|(category, template)| Ok((category.clone(), PathTemplate::parse(template)?)))
            .collect::<Result<Vec<_>, TemplateError>>()?;

        Ok(Self {
            formats,
            default: PathTemplate::parse(DEFAULT_TEMPLATE)?,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, TemplateError> {
        Self::new(&config.paths)
    }

    pub fn template_for(&self, category: &str) -> &PathTemplate {
        self.formats
            .iter()
            .find(|(query, _)| query == category)
            .map(|(_, template)| template)
            .unwrap_or(&self.default)
    }
}

/// Album-level fields shared by every extra file of a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumMetadata {
    pub artist: String,
    pub albumartist: String,
    pub album: String,
    /// The album's destination directory.
    pub albumpath: PathBuf,
}

impl AlbumMetadata {
    /// Empty text fields become `"None"`.
    pub fn new(item: &TrackItem, albumpath: impl Into<PathBuf>) -> Self {
        Self {
            artist: or_missing(&item.artist),
            albumartist: or_missing(&item.albumartist),
            album: or_missing(&item.album),
            albumpath: albumpath.into(),
        }
    }
}

fn or_missing(value: &str) -> String {
    if value.is_empty() {
        MISSING_VALUE.to_string()
    } else {
        value.to_string()
    }
}

/// Fields available to a destination template for one extra file.
#[derive(Debug, Clone)]
pub struct ExtraFileFields<'a> {
    pub album: &'a AlbumMetadata,
    /// Sanitized file name including the extension.
    pub basename: String,
    /// Sanitized relative path without the final extension.
    pub filename: PathBuf,
}

impl FieldSource for ExtraFileFields<'_> {
    fn field(&self, name: &str) -> Option<FieldValue<'_>> {
        match name {
            "artist" => Some(FieldValue::text(self.album.artist.as_str())),
            "albumartist" => Some(FieldValue::text(self.album.albumartist.as_str())),
            "album" => Some(FieldValue::text(self.album.album.as_str())),
            "albumpath" => self.album.albumpath.to_str().map(FieldValue::RawPath),
            "basename" => Some(FieldValue::text(self.basename.as_str())),
            "filename" => self.filename.to_str().map(FieldValue::text),
            _ => None,
        }
    }
}

/// Resolves extra files to their destination paths.
#[derive(Debug, Clone)]
pub struct DestinationResolver {
    formats: PathFormatTable,
    functions: TemplateFunctions,
}

impl DestinationResolver {
    pub fn new(formats: PathFormatTable) -> Self {
        Self {
            formats,
            functions: TemplateFunctions::default(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, TemplateError> {
        Ok(Self::new(PathFormatTable::from_config(config)?))
    }

    /// Replaces the template function library.
    pub fn with_functions(mut self, functions: TemplateFunctions) -> Self {
        self.functions = functions;
        self
    }

    /// Destination for `relative`, a path relative to the album's source
    /// directory. The original extension is appended after templating.
    ///
    /// Fails when `relative` or the album path is not valid UTF-8.
    pub fn resolve(
        &self,
        relative: &Path,
        category: &str,
        album: &AlbumMetadata,
    ) -> Result<PathBuf, ResolveError> {
        for path in [relative, album.albumpath.as_path()] {
            if path.to_str().is_none() {
                return Err(ResolveError::NotUnicode {
                    path: path.to_path_buf(),
                });
            }
        }

        let sanitized = sanitize_path(relative);

        let basename = sanitized
            .file_name()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
            .to_string();
        let stem = sanitized.file_stem().unwrap_or_default();
        let filename = match sanitized.parent() {
            Some(parent) => parent.join(stem),
            None => PathBuf::from(stem),
        };
        let suffix = sanitized
            .extension()
            .and_then(OsStr::to_str)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();

        let fields = ExtraFileFields {
            album,
            basename,
            filename,
        };
        let rendered = self
            .formats
            .template_for(category)
            .substitute(&fields, &self.functions);

        Ok(PathBuf::from(rendered + &suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn album() -> AlbumMetadata {
        AlbumMetadata::new(
            &TrackItem::new("Artist", "", "Album"),
            "/music/Artist/Album",
        )
    }

    fn resolver(paths: &[(&str, &str)]) -> DestinationResolver {
        let paths: BTreeMap<String, String> = paths
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        DestinationResolver::new(PathFormatTable::new(&paths).unwrap())
    }

    #[test]
    fn test_category_template_keeps_extension() {
        let resolver = resolver(&[("cue", "$albumpath/audio")]);
        let dest = resolver.resolve(Path::new("file.cue"), "cue", &album()).unwrap();
        assert_eq!(dest, PathBuf::from("/music/Artist/Album/audio.cue"));
    }

    #[test]
    fn test_default_template() {
        let resolver = resolver(&[]);
        let dest = resolver.resolve(Path::new("file.log"), "log", &album()).unwrap();
        assert_eq!(dest, PathBuf::from("/music/Artist/Album/file.log"));
    }

    #[test]
    fn test_subdirectory_is_flattened() {
        let resolver = resolver(&[]);
        let dest = resolver.resolve(Path::new("CD1/file.cue"), "cue", &album()).unwrap();
        assert_eq!(dest, PathBuf::from("/music/Artist/Album/CD1_file.cue"));
    }

    #[test]
    fn test_directory_match() {
        let resolver = resolver(&[("artwork", "$albumpath/artwork")]);
        let dest = resolver.resolve(Path::new("scans"), "artwork", &album()).unwrap();
        assert_eq!(dest, PathBuf::from("/music/Artist/Album/artwork"));
    }

    #[test]
    fn test_empty_metadata_becomes_none() {
        let resolver = resolver(&[("log", "$albumpath/$albumartist-$basename")]);
        let dest = resolver.resolve(Path::new("rip.log"), "log", &album()).unwrap();
        assert_eq!(dest, PathBuf::from("/music/Artist/Album/None-rip.log.log"));
    }

    #[test]
    fn test_relative_path_is_sanitized() {
        let resolver = resolver(&[]);
        let dest = resolver.resolve(Path::new(".hidden.txt"), "misc", &album()).unwrap();
        assert_eq!(dest, PathBuf::from("/music/Artist/Album/_hidden.txt"));
    }

    #[test]
    fn test_text_fields_cannot_add_directories() {
        let item = TrackItem::new("AC/DC", "AC/DC", "Live");
        let album = AlbumMetadata::new(&item, "/music/AC_DC/Live");
        let resolver = resolver(&[("log", "$albumpath/$artist")]);
        let dest = resolver.resolve(Path::new("rip.log"), "log", &album).unwrap();
        assert_eq!(dest, PathBuf::from("/music/AC_DC/Live/AC_DC.log"));
    }

    #[test]
    fn test_first_matching_category_wins() {
        let paths: BTreeMap<String, String> =
            [("log".to_string(), "$albumpath/logs/$filename".to_string())]
                .into_iter()
                .collect();
        let table = PathFormatTable::new(&paths).unwrap();
        assert_eq!(table.template_for("log").as_str(), "$albumpath/logs/$filename");
        assert_eq!(table.template_for("cue").as_str(), DEFAULT_TEMPLATE);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_are_rejected() {
        use std::os::unix::ffi::OsStrExt;

        let resolver = resolver(&[]);
        let name = Path::new(OsStr::from_bytes(b"caf\xE9.log"));
        assert_eq!(
            resolver.resolve(name, "log", &album()),
            Err(ResolveError::NotUnicode {
                path: name.to_path_buf()
            })
        );

        let mut album = album();
        album.albumpath = PathBuf::from(OsStr::from_bytes(b"/music/caf\xE9"));
        let err = resolver
            .resolve(Path::new("file.log"), "log", &album)
            .unwrap_err();
        assert_eq!(
            err,
            ResolveError::NotUnicode {
                path: album.albumpath.clone()
            }
        );
    }
}
