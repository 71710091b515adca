//! Run configuration
//!
//! Two optional sources:
//! - `webobf.toml` in the source directory, controlling scanning and which
//!   categories are transformed
//! - a levels directory holding `<level>.json` script options

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::category::{Category, Level};
use crate::error::{ObfuscateError, Result};
use crate::transform::ScriptConfig;

/// File name of the per-project run configuration
pub const RUN_CONFIG_FILE: &str = "webobf.toml";

/// Per-project configuration (webobf.toml)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Directory names skipped directly under the source root
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// Include dot-files and dot-directories
    #[serde(default)]
    pub include_hidden: bool,

    /// Categories copied verbatim instead of transformed
    #[serde(default)]
    pub skip_categories: Vec<String>,
}

fn default_exclude_dirs() -> Vec<String> {
    vec!["node_modules".to_string(), "dist".to_string()]
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: default_exclude_dirs(),
            include_hidden: false,
            skip_categories: Vec::new(),
        }
    }
}

impl RunConfig {
    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ObfuscateError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ObfuscateError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load `explicit` if given, else `<source>/webobf.toml` if present, else defaults
    pub fn discover(source: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        let candidate = source.join(RUN_CONFIG_FILE);
        if candidate.is_file() {
            tracing::debug!("Using run configuration {:?}", candidate);
            Self::from_file(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve `skip_categories`; an unknown name is an `UnknownCategory` error
    pub fn skipped(&self) -> Result<BTreeSet<Category>> {
        self.skip_categories
            .iter()
            .map(|name| name.parse::<Category>())
            .collect()
    }
}

/// Where script options for each level come from
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LevelSource {
    /// Compiled-in presets
    #[default]
    Builtin,
    /// `<dir>/<level>.json`
    Directory(PathBuf),
}

impl LevelSource {
    /// Use `explicit` if given, else the user's `webobf/levels` config dir if it
    /// exists, else the built-in presets
    pub fn discover(explicit: Option<PathBuf>) -> Self {
        if let Some(dir) = explicit {
            return LevelSource::Directory(dir);
        }
        match default_levels_dir() {
            Some(dir) if dir.is_dir() => LevelSource::Directory(dir),
            _ => LevelSource::Builtin,
        }
    }

    /// Load the script options for `level`
    pub fn load(&self, level: &str) -> Result<ScriptConfig> {
        let parsed: Level = level.parse()?;
        match self {
            LevelSource::Builtin => Ok(ScriptConfig::preset(parsed)),
            LevelSource::Directory(dir) => {
                let path = dir.join(format!("{}.json", parsed.as_str()));
                let fail = |reason: String| ObfuscateError::ConfigLoad {
                    level: level.to_string(),
                    reason,
                };
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| fail(format!("{}: {}", path.display(), e)))?;
                serde_json::from_str(&content)
                    .map_err(|e| fail(format!("{}: {}", path.display(), e)))
            }
        }
    }
}

/// `<config dir>/webobf/levels`
pub fn default_levels_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("webobf").join("levels"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_run_config() {
        let config = RunConfig::default();
        assert_eq!(config.exclude_dirs, vec!["node_modules", "dist"]);
        assert!(!config.include_hidden);
        assert!(config.skipped().unwrap().is_empty());
    }

    #[test]
    fn test_parse_run_config() {
        let config: RunConfig = toml::from_str(
            r#"
exclude_dirs = ["vendor"]
skip_categories = ["binaryResource", "css"]
"#,
        )
        .unwrap();
        assert_eq!(config.exclude_dirs, vec!["vendor"]);
        let skipped = config.skipped().unwrap();
        assert!(skipped.contains(&Category::BinaryResource));
        assert!(skipped.contains(&Category::Stylesheet));
    }

    #[test]
    fn test_unknown_skipped_category() {
        let config = RunConfig {
            skip_categories: vec!["fonts".to_string()],
            ..Default::default()
        };
        let err = config.skipped().unwrap_err();
        assert_eq!(err.kind(), "UnknownCategory");
    }

    #[test]
    fn test_discover_run_config() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(
            RunConfig::discover(temp_dir.path(), None).unwrap(),
            RunConfig::default()
        );

        std::fs::write(temp_dir.path().join(RUN_CONFIG_FILE), "include_hidden = true").unwrap();
        let config = RunConfig::discover(temp_dir.path(), None).unwrap();
        assert!(config.include_hidden);
        assert_eq!(config.exclude_dirs, vec!["node_modules", "dist"]);

        std::fs::write(temp_dir.path().join(RUN_CONFIG_FILE), "include_hidden = 3").unwrap();
        let err = RunConfig::discover(temp_dir.path(), None).unwrap_err();
        assert_eq!(err.kind(), "InvalidConfig");
    }

    #[test]
    fn test_builtin_levels() {
        let config = LevelSource::Builtin.load("high").unwrap();
        assert!(config.encode_strings);
        let config = LevelSource::Builtin.load("low").unwrap();
        assert!(!config.encode_strings);
    }

    #[test]
    fn test_directory_levels() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("normal.json"),
            r#"{"stripComments": false, "compactLines": true}"#,
        )
        .unwrap();
        let source = LevelSource::Directory(temp_dir.path().to_path_buf());

        let config = source.load("Normal").unwrap();
        assert!(!config.strip_comments);
        assert!(config.compact_lines);

        let err = source.load("high").unwrap_err();
        assert_eq!(err.kind(), "ConfigLoadError");
        assert!(err.to_string().contains("high.json"));
    }

    #[test]
    fn test_directory_level_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("low.json"), "{ nope").unwrap();
        let source = LevelSource::Directory(temp_dir.path().to_path_buf());
        assert!(matches!(
            source.load("low"),
            Err(ObfuscateError::ConfigLoad { .. })
        ));
    }
}
