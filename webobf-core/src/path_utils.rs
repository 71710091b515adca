//! Cross-platform path utilities
//!
//! Relative file paths are kept as strings with forward slashes (`/`) on every
//! platform, so classification patterns and progress text look the same on Windows.

use std::path::{Path, PathBuf};

/// Suffix appended to the source directory name when no output path is given
pub const DEFAULT_OUTPUT_SUFFIX: &str = "_Obfuscated";

/// Normalize path to forward slashes
#[inline]
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

/// Convert a Path to a normalized string
#[inline]
pub fn path_to_string(path: &Path) -> String {
    normalize_path(&path.to_string_lossy())
}

/// Default output root: `<source>_Obfuscated`
pub fn default_output_path(source: &Path) -> PathBuf {
    let trimmed = path_to_string(source);
    let trimmed = trimmed.trim_end_matches('/');
    PathBuf::from(format!("{}{}", trimmed, DEFAULT_OUTPUT_SUFFIX))
}

/// Join a `/`-separated relative path onto a root
pub fn join_relative(root: &Path, relative: &str) -> PathBuf {
    relative
        .split('/')
        .filter(|part| !part.is_empty())
        .fold(root.to_path_buf(), |acc, part| acc.join(part))
}

/// Absolute, lexically cleaned form of a path that may not exist yet
pub fn absolute_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    let base = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().unwrap_or_default()
    };
    let mut cleaned = PathBuf::new();
    for component in base.join(path).components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// Whether two paths point at the same location
pub fn same_path(a: &Path, b: &Path) -> bool {
    absolute_path(a) == absolute_path(b)
}

/// Relative path of `child` beneath `parent`, if it lies inside it
pub fn relative_to(parent: &Path, child: &Path) -> Option<String> {
    let parent = absolute_path(parent);
    let child = absolute_path(child);
    child
        .strip_prefix(&parent)
        .ok()
        .filter(|rel| !rel.as_os_str().is_empty())
        .map(path_to_string)
}
