//! File classification
//!
//! Walks a source tree and partitions its regular files into categories.
//! Rules are tried in order and the first match wins, so every file lands in
//! exactly one set; anything unmatched is passthrough.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::category::Category;
use crate::config::RunConfig;
use crate::error::{ObfuscateError, Result};
use crate::path_utils::{path_to_string, relative_to};

/// Script names ending with these are data/offline bundles, not code
const RESERVED_SCRIPT_SUFFIXES: &[&str] = &["data.js", "offline.js"];

fn third_party_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"jquery.*\.js").expect("third-party pattern is valid"))
}

fn resource_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\.(png|jpg|jpeg|gif|svg|webp|mp3|mp4|webm)$")
            .expect("resource pattern is valid")
    })
}

/// Category of a relative path. Pure: looks at the string only.
pub fn classify(path: &str) -> Category {
    if path.ends_with(".js")
        && !RESERVED_SCRIPT_SUFFIXES.iter().any(|s| path.ends_with(s))
        && !third_party_regex().is_match(path)
    {
        Category::Script
    } else if path.ends_with(".css") {
        Category::Stylesheet
    } else if path.ends_with(".html") {
        Category::Markup
    } else if path.ends_with(".json") {
        Category::Data
    } else if resource_regex().is_match(path) {
        Category::BinaryResource
    } else {
        Category::Passthrough
    }
}

/// A scanned file: relative `/`-separated path plus its category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub category: Category,
}

impl FileEntry {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let category = classify(&path);
        Self { path, category }
    }
}

/// The full scan result, partitioned by category
#[derive(Debug, Clone, Default)]
pub struct FileSet {
    sets: BTreeMap<Category, Vec<FileEntry>>,
    total: usize,
}

impl FileSet {
    /// Partition relative paths; order within each category is preserved
    pub fn from_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = FileSet::default();
        for path in paths {
            let entry = FileEntry::new(path);
            set.sets.entry(entry.category).or_default().push(entry);
            set.total += 1;
        }
        set
    }

    /// Files of one category
    pub fn get(&self, category: Category) -> &[FileEntry] {
        self.sets.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of scanned files across all categories
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Move every file of `category` into passthrough
    pub fn demote(&mut self, category: Category) {
        if category == Category::Passthrough {
            return;
        }
        if let Some(mut moved) = self.sets.remove(&category) {
            let passthrough = self.sets.entry(Category::Passthrough).or_default();
            passthrough.append(&mut moved);
            passthrough.sort_by(|a, b| a.path.cmp(&b.path));
        }
    }

    /// All entries, in batch order
    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        Category::TRANSFORMED
            .into_iter()
            .chain(std::iter::once(Category::Passthrough))
            .flat_map(move |category| self.get(category).iter())
    }
}

/// Collect every regular file beneath `source`, relative and sorted
///
/// Top-level directories named in `config.exclude_dirs` are skipped with their
/// contents, as are hidden entries at any depth unless `config.include_hidden`.
/// `skip_root` (typically the output directory) is skipped when it lies inside
/// `source`.
pub fn scan_files(source: &Path, config: &RunConfig, skip_root: Option<&Path>) -> Result<Vec<String>> {
    if !source.is_dir() {
        return Err(ObfuscateError::SourceNotFound(source.to_path_buf()));
    }
    let skip_rel = skip_root.and_then(|root| relative_to(source, root));

    let walker = WalkDir::new(source)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            if !config.include_hidden && name.starts_with('.') {
                return false;
            }
            if entry.file_type().is_dir() {
                let excluded = entry.depth() == 1
                    && config.exclude_dirs.iter().any(|d| d.as_str() == name);
                if excluded {
                    return false;
                }
                if let (Some(skip), Ok(rel)) = (&skip_rel, entry.path().strip_prefix(source)) {
                    if &path_to_string(rel) == skip {
                        return false;
                    }
                }
            }
            true
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| match e.into_io_error() {
            Some(io) => ObfuscateError::Io(io),
            None => ObfuscateError::Io(std::io::Error::other("filesystem loop detected")),
        })?;
        if entry.depth() == 0 || !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| ObfuscateError::Io(std::io::Error::other(e)))?;
        files.push(path_to_string(rel));
    }
    files.sort();
    tracing::debug!("Scanned {} files under {:?}", files.len(), source);
    Ok(files)
}

/// Scan `source` and partition the result
pub fn scan_and_classify(
    source: &Path,
    config: &RunConfig,
    skip_root: Option<&Path>,
) -> Result<FileSet> {
    let files = scan_files(source, config, skip_root)?;
    Ok(FileSet::from_paths(files))
}
