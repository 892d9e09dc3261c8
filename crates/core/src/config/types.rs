use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Category name to glob patterns, relative to an album's source directory.
    /// Categories are matched in name order, not in the order they are
    /// declared; patterns within a category keep their order.
    #[serde(default)]
    pub patterns: BTreeMap<String, PatternList>,
    /// Category name to destination template.
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
    /// File types handled by the host's own importer, matched against the
    /// extension without its dot. Never treated as extra files.
    #[serde(default = "default_media_types")]
    pub media_types: Vec<String>,
    /// Scan each source directory once per run across all operation kinds.
    /// The first kind to reach a directory claims its extra files.
    #[serde(default = "default_true")]
    pub claim_source_once: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            patterns: BTreeMap::new(),
            paths: BTreeMap::new(),
            media_types: default_media_types(),
            claim_source_once: true,
        }
    }
}

fn default_media_types() -> Vec<String> {
    vec![
        "mp3", "aac", "alac", "ogg", "opus", "flac", "ape", "wv", "mpc", "asf", "aiff", "dsf",
        "wav",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_true() -> bool {
    true
}

/// Glob patterns for one category. A bare string is shorthand for a
/// single pattern.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum PatternList {
    One(String),
    Many(Vec<String>),
}

impl PatternList {
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::One(pattern) => std::slice::from_ref(pattern),
            Self::Many(patterns) => patterns,
        }
    }
}

impl From<&str> for PatternList {
    fn from(pattern: &str) -> Self {
        Self::One(pattern.to_string())
    }
}

impl From<Vec<&str>> for PatternList {
    fn from(patterns: Vec<&str>) -> Self {
        Self::Many(patterns.into_iter().map(String::from).collect())
    }
}
