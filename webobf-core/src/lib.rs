//! webobf Core Library
//!
//! This crate provides the synchronous building blocks of an obfuscation run:
//! - File categories and obfuscation levels
//! - Source tree scanning and classification
//! - The per-category transform registry (JS, CSS, HTML, JSON, binary resources)
//! - Run configuration (webobf.toml, level presets)
//! - The error taxonomy shared with the worker

pub mod category;
pub mod classifier;
pub mod config;
pub mod error;
pub mod path_utils;
pub mod transform;

// Re-export commonly used types
pub use category::{Category, Level};
pub use classifier::{classify, scan_and_classify, scan_files, FileEntry, FileSet};
pub use config::{default_levels_dir, LevelSource, RunConfig, RUN_CONFIG_FILE};
pub use error::{ObfuscateError, Result};
pub use path_utils::{
    default_output_path, join_relative, normalize_path, path_to_string, relative_to, same_path,
};
pub use transform::{Obfuscator, ObfuscationResult, ScriptConfig, ScriptEngine, Transform};
