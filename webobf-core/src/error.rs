//! Error taxonomy for obfuscation runs
//!
//! Errors fall into two groups: run-fatal errors abort the whole run and become
//! the terminal failure message, per-file errors are counted and reported as
//! progress notices while the batch continues.

use std::path::PathBuf;

/// Errors raised while scanning, transforming or talking over the channel
#[derive(Debug, thiserror::Error)]
pub enum ObfuscateError {
    #[error("Source path not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Output path must be different from source path: {}", .0.display())]
    InvalidOutputPath(PathBuf),

    #[error("Get {level} options failed of script obfuscator: {reason}")]
    ConfigLoad { level: String, reason: String },

    #[error("Invalid run configuration {}: {reason}", .path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("Malformed data in {path}: {source}")]
    MalformedData {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Transform of {path} failed: {reason}")]
    Transform { path: String, reason: String },

    #[error("Unknown obfuscate category: {0}")]
    UnknownCategory(String),

    #[error("{0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ObfuscateError {
    /// Stable taxonomy name, used as the prefix of terminal failure messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceNotFound(_) => "SourceNotFound",
            Self::InvalidOutputPath(_) => "InvalidOutputPath",
            Self::ConfigLoad { .. } => "ConfigLoadError",
            Self::InvalidConfig { .. } => "InvalidConfig",
            Self::MalformedData { .. } => "MalformedDataError",
            Self::Transform { .. } => "TransformError",
            Self::UnknownCategory(_) => "UnknownCategory",
            Self::Protocol(_) => "ProtocolError",
            Self::Io(_) => "IoError",
        }
    }

    /// Whether this error aborts the run instead of failing a single file
    pub fn is_run_fatal(&self) -> bool {
        !matches!(
            self,
            Self::MalformedData { .. } | Self::Transform { .. } | Self::ConfigLoad { .. }
        )
    }

    /// `"<Kind>: <description>"`, the form carried by terminal failure messages
    pub fn describe(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }

    /// Message name not understood by the receiving side
    pub fn unknown_message(name: &str) -> Self {
        Self::Protocol(format!("Unknown message name: {}", name))
    }

    /// Wrap any displayable failure as a per-file transform error
    pub fn transform(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Transform {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ObfuscateError>;
