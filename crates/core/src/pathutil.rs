//! Path helpers shared by the resolver and the exit pass.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::path::{Component, Path, PathBuf};

/// Replacements applied, in order, to every component of a sanitized path.
static COMPONENT_REPLACEMENTS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        // Separators are forbidden inside a component
        (r"[\\/]", "_"),
        // Hidden files
        (r"^\.", "_"),
        // Control characters
        (r"[\x00-\x1f]", ""),
        // Reserved on Windows
        (r#"[<>:"?*|]"#, "_"),
        (r"\.$", "_"),
        (r"\s+$", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("sanitizer pattern is valid"),
            replacement,
        )
    })
    .collect()
});

static NUMERIC_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(\d+)$").expect("suffix pattern is valid"));

/// Sanitizes one path component.
pub fn sanitize_component(component: &str) -> String {
    COMPONENT_REPLACEMENTS
        .iter()
        .fold(component.to_string(), |value, (regex, replacement)| {
            regex.replace_all(&value, *replacement).into_owned()
        })
}

/// Sanitizes every component of a relative path so it is safe to recreate
/// below a destination directory.
///
/// Root and prefix components are kept as they are; `.` components are
/// dropped.
pub fn sanitize_path(path: &Path) -> PathBuf {
    let mut sanitized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => sanitized.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir | Component::Normal(_) => {
                let cleaned = sanitize_component(&component.as_os_str().to_string_lossy());
                if !cleaned.is_empty() {
                    sanitized.push(cleaned);
                }
            }
        }
    }
    sanitized
}

/// Returns `path` if nothing exists there, otherwise the first free
/// `stem.N.ext` variant. An existing numeric suffix is continued rather than
/// stacked.
pub fn unique_path(path: &Path) -> PathBuf {
    if !exists(path) {
        return path.to_path_buf();
    }

    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let (base, mut num) = match NUMERIC_SUFFIX.captures(&stem) {
        Some(caps) => {
            let start = caps.get(0).map(|m| m.start()).unwrap_or(stem.len());
            let num = caps[1].parse::<u64>().unwrap_or(0);
            (stem[..start].to_string(), num)
        }
        None => (stem, 0),
    };

    loop {
        num += 1;
        let candidate = path.with_file_name(format!("{}.{}{}", base, num, extension));
        if !exists(&candidate) {
            return candidate;
        }
    }
}

/// Whether anything, including a dangling symlink, occupies `path`.
pub fn exists(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}

/// Longest common leading path of `paths`, compared component by component.
///
/// Returns `None` for an empty input or when absolute and relative paths
/// are mixed.
pub fn common_path<'a, I>(paths: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut paths = paths.into_iter();
    let first = paths.next()?;
    let mut common: Vec<Component<'a>> = first.components().collect();

    for path in paths {
        if path.is_absolute() != first.is_absolute() {
            return None;
        }
        let shared = common
            .iter()
            .zip(path.components())
            .take_while(|(a, b)| *a == b)
            .count();
        common.truncate(shared);
    }

    Some(common.iter().collect())
}
