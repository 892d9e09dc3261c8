//! Extra file discovery.
//!
//! Expands the configured glob patterns relative to an album's source
//! directory. Patterns follow shell conventions: `*` and `?` stay within one
//! path component, `**` crosses directories, and a trailing `/` limits the
//! pattern to directories. Files of a type the host imports itself are never
//! reported.

use globset::{GlobBuilder, GlobMatcher};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::{Config, PatternList};

/// Errors raised while compiling patterns.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("Invalid glob pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Pattern must be relative to the album directory: {pattern:?}")]
    AbsolutePattern { pattern: String },
}

/// Source directories already scanned during this run.
#[derive(Debug, Clone, Default)]
pub struct ScannedPaths {
    paths: HashSet<PathBuf>,
}

impl ScannedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Records `path`; returns false if it was already present.
    pub fn insert(&mut self, path: impl Into<PathBuf>) -> bool {
        self.paths.insert(path.into())
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Debug, Clone)]
struct CompiledPattern {
    glob: GlobMatcher,
    dirs_only: bool,
    /// Number of path components the pattern can match, `None` if unbounded.
    depth: Option<usize>,
}

impl CompiledPattern {
    fn compile(pattern: &str) -> Result<Self, MatchError> {
        if pattern.starts_with('/') || Path::new(pattern).is_absolute() {
            return Err(MatchError::AbsolutePattern {
                pattern: pattern.to_string(),
            });
        }

        let dirs_only = pattern.ends_with('/');
        let trimmed = pattern.trim_start_matches("./").trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(MatchError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: "pattern is empty".to_string(),
            });
        }

        let glob = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()
            .map_err(|e| MatchError::InvalidPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?
            .compile_matcher();

        let depth = if trimmed.contains("**") {
            None
        } else {
            Some(trimmed.split('/').filter(|c| !c.is_empty()).count())
        };

        Ok(Self {
            glob,
            dirs_only,
            depth,
        })
    }

    fn is_match(&self, entry: &Entry) -> bool {
        (!self.dirs_only || entry.is_dir) && self.glob.is_match(&entry.relative)
    }
}

#[derive(Debug, Clone)]
struct Category {
    name: String,
    patterns: Vec<CompiledPattern>,
}

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    relative: PathBuf,
    is_dir: bool,
}

/// Matches extra files below album source directories.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    categories: Vec<Category>,
    media_types: HashSet<String>,
    /// Deepest level any pattern can reach, `None` if unbounded.
    max_depth: Option<usize>,
}

impl PatternMatcher {
    pub fn new(
        patterns: &BTreeMap<String, PatternList>,
        media_types: &[String],
    ) -> Result<Self, MatchError> {
        let categories = patterns
            .iter()
            .map(|(name, list)| {
                let patterns = list
                    .as_slice()
                    .iter()
                    .map(|p| CompiledPattern::compile(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Category {
                    name: name.clone(),
                    patterns,
                })
            })
            .collect::<Result<Vec<_>, MatchError>>()?;

        let max_depth = categories
            .iter()
            .flat_map(|c| c.patterns.iter().map(|p| p.depth))
            .try_fold(0, |max, depth| depth.map(|d| max.max(d)));

        Ok(Self {
            categories,
            media_types: media_types.iter().cloned().collect(),
            max_depth,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, MatchError> {
        Self::new(&config.patterns, &config.media_types)
    }

    /// Category names in the order they are matched.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Lazily yields `(path, category)` for every extra file below `source`.
    ///
    /// Yields nothing if `source` is already in `scanned`. Once the sequence
    /// is exhausted, `source` is added to `scanned`.
    pub fn matches<'a>(&'a self, source: &Path, scanned: &'a mut ScannedPaths) -> Matches<'a> {
        let scanned = if scanned.contains(source) {
            debug!("Already scanned {}, skipping", source.display());
            None
        } else {
            Some(scanned)
        };

        Matches {
            matcher: self,
            source: source.to_path_buf(),
            scanned,
            entries: None,
            category: 0,
            pattern: 0,
            entry: 0,
        }
    }

    /// Whether the host importer handles files with this path's extension.
    pub fn is_media_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy())
            .is_some_and(|ext| !ext.is_empty() && self.media_types.contains(&*ext))
    }

    fn list_entries(&self, source: &Path) -> Vec<Entry> {
        let mut walker = WalkDir::new(source).min_depth(1).sort_by_file_name();
        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        walker
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Cannot read below {}: {}", source.display(), e);
                    None
                }
            })
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(source).ok()?.to_path_buf();
                Some(Entry {
                    is_dir: entry.path().is_dir(),
                    path: entry.into_path(),
                    relative,
                })
            })
            .collect()
    }
}

/// Lazy sequence of `(path, category)` pairs returned by
/// [`PatternMatcher::matches`].
pub struct Matches<'a> {
    matcher: &'a PatternMatcher,
    source: PathBuf,
    /// `None` once the source was found already scanned or the sequence ended.
    scanned: Option<&'a mut ScannedPaths>,
    entries: Option<Vec<Entry>>,
    category: usize,
    pattern: usize,
    entry: usize,
}

impl Iterator for Matches<'_> {
    type Item = (PathBuf, String);

    fn next(&mut self) -> Option<Self::Item> {
        self.scanned.as_ref()?;

        let matcher = self.matcher;
        let source = &self.source;
        let entries = self
            .entries
            .get_or_insert_with(|| matcher.list_entries(source));

        loop {
            let Some(category) = matcher.categories.get(self.category) else {
                if let Some(scanned) = self.scanned.take() {
                    scanned.insert(self.source.clone());
                }
                return None;
            };

            let Some(pattern) = category.patterns.get(self.pattern) else {
                self.category += 1;
                self.pattern = 0;
                continue;
            };

            while let Some(entry) = entries.get(self.entry) {
                self.entry += 1;

                if !pattern.is_match(entry) {
                    continue;
                }
                if matches!(entry.relative.to_str(), Some(".") | Some("..")) {
                    continue;
                }
                if matcher.is_media_file(&entry.path) {
                    info!(
                        "host importer handles type ({:?}), skipping: {}",
                        entry.path.extension().unwrap_or_default(),
                        entry.path.display()
                    );
                    continue;
                }

                return Some((entry.path.clone(), category.name.clone()));
            }

            self.pattern += 1;
            self.entry = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn album_dir() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        for name in ["file.mp3", "file.cue", "file.txt", "file.log"] {
            touch(&root.join(name));
        }
        touch(&root.join("scans/front.jpg"));
        touch(&root.join("scans/back.jpg"));
        temp
    }

    fn matcher(patterns: &[(&str, Vec<&str>)]) -> PatternMatcher {
        let table: BTreeMap<String, PatternList> = patterns
            .iter()
            .map(|(name, list)| (name.to_string(), PatternList::from(list.clone())))
            .collect();
        PatternMatcher::new(&table, &Config::default().media_types).unwrap()
    }

    fn default_matcher() -> PatternMatcher {
        matcher(&[
            ("log", vec!["*.log"]),
            ("cue", vec!["*.cue", "*/*.cue"]),
            ("artwork", vec!["scans/", "Scans/", "artwork/", "Artwork/"]),
        ])
    }

    #[test]
    fn test_match_patterns() {
        let temp = album_dir();
        let source = temp.path();
        let matcher = default_matcher();
        let mut scanned = ScannedPaths::new();

        let found: HashSet<(PathBuf, String)> = matcher.matches(source, &mut scanned).collect();

        let expected: HashSet<(PathBuf, String)> = [
            (source.join("scans"), "artwork".to_string()),
            (source.join("file.cue"), "cue".to_string()),
            (source.join("file.log"), "log".to_string()),
        ]
        .into_iter()
        .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_categories_in_table_order() {
        let temp = album_dir();
        let matcher = default_matcher();
        let mut scanned = ScannedPaths::new();

        let categories: Vec<String> = matcher
            .matches(temp.path(), &mut scanned)
            .map(|(_, category)| category)
            .collect();
        assert_eq!(categories, vec!["artwork", "cue", "log"]);
    }

    #[test]
    fn test_second_scan_is_empty() {
        let temp = album_dir();
        let matcher = default_matcher();
        let mut scanned = ScannedPaths::new();

        assert_eq!(matcher.matches(temp.path(), &mut scanned).count(), 3);
        assert!(scanned.contains(temp.path()));
        assert_eq!(matcher.matches(temp.path(), &mut scanned).count(), 0);
    }

    #[test]
    fn test_marked_only_when_exhausted() {
        let temp = album_dir();
        let matcher = default_matcher();
        let mut scanned = ScannedPaths::new();

        let first = matcher.matches(temp.path(), &mut scanned).next();
        assert!(first.is_some());
        assert!(scanned.is_empty());
    }

    #[test]
    fn test_media_files_never_matched() {
        let temp = album_dir();
        let matcher = matcher(&[("everything", vec!["*"])]);
        let mut scanned = ScannedPaths::new();

        let found: Vec<PathBuf> = matcher
            .matches(temp.path(), &mut scanned)
            .map(|(path, _)| path)
            .collect();

        assert!(!found.contains(&temp.path().join("file.mp3")));
        assert!(found.contains(&temp.path().join("file.txt")));
        assert!(found.contains(&temp.path().join("scans")));
    }

    #[test]
    fn test_media_type_check_is_case_sensitive() {
        let matcher = default_matcher();
        assert!(matcher.is_media_file(Path::new("/a/track.flac")));
        assert!(!matcher.is_media_file(Path::new("/a/track.FLAC")));
        assert!(!matcher.is_media_file(Path::new("/a/track.")));
        assert!(!matcher.is_media_file(Path::new("/a/track")));
    }

    #[test]
    fn test_star_stays_in_one_directory() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("CD1/file.cue"));
        touch(&temp.path().join("file.cue"));
        let mut scanned = ScannedPaths::new();

        let top = matcher(&[("cue", vec!["*.cue"])]);
        let found: Vec<_> = top.matches(temp.path(), &mut scanned).collect();
        assert_eq!(found, vec![(temp.path().join("file.cue"), "cue".to_string())]);

        let mut scanned = ScannedPaths::new();
        let nested = matcher(&[("cue", vec!["*/*.cue"])]);
        let found: Vec<_> = nested.matches(temp.path(), &mut scanned).collect();
        assert_eq!(found, vec![(temp.path().join("CD1/file.cue"), "cue".to_string())]);
    }

    #[test]
    fn test_recursive_pattern() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("a/b/c/deep.log"));
        let mut scanned = ScannedPaths::new();

        let matcher = matcher(&[("log", vec!["**/*.log"])]);
        let found: Vec<_> = matcher.matches(temp.path(), &mut scanned).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, temp.path().join("a/b/c/deep.log"));
    }

    #[test]
    fn test_trailing_slash_only_matches_directories() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("scans"));
        let mut scanned = ScannedPaths::new();

        let matcher = matcher(&[("artwork", vec!["scans/"])]);
        assert_eq!(matcher.matches(temp.path(), &mut scanned).count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_matches_directory_pattern() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("real_scans/front.jpg"));
        std::os::unix::fs::symlink(temp.path().join("real_scans"), temp.path().join("scans"))
            .unwrap();
        let mut scanned = ScannedPaths::new();

        let matcher = matcher(&[("artwork", vec!["scans/"])]);
        let found: Vec<_> = matcher.matches(temp.path(), &mut scanned).collect();
        assert_eq!(
            found,
            vec![(temp.path().join("scans"), "artwork".to_string())]
        );
    }

    #[test]
    fn test_missing_source_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let matcher = default_matcher();
        let mut scanned = ScannedPaths::new();

        let missing = temp.path().join("gone");
        assert_eq!(matcher.matches(&missing, &mut scanned).count(), 0);
        assert!(scanned.contains(&missing));
    }

    #[test]
    fn test_compile_errors() {
        assert!(matches!(
            CompiledPattern::compile("/etc/*.log"),
            Err(MatchError::AbsolutePattern { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile("[abc"),
            Err(MatchError::InvalidPattern { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile("/"),
            Err(MatchError::AbsolutePattern { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile("./"),
            Err(MatchError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_max_depth() {
        let bounded = matcher(&[("a", vec!["*.log"]), ("b", vec!["*/*/*.cue"])]);
        assert_eq!(bounded.max_depth, Some(3));

        let unbounded = matcher(&[("a", vec!["*.log"]), ("b", vec!["**/*.cue"])]);
        assert_eq!(unbounded.max_depth, None);
    }
}
