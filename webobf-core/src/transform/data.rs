//! JSON compaction

use crate::error::{ObfuscateError, Result};

/// Parse `content` and re-serialize it without whitespace, keeping key order
pub fn compact(path: &str, content: &[u8]) -> Result<String> {
    let value: serde_json::Value =
        serde_json::from_slice(content).map_err(|source| ObfuscateError::MalformedData {
            path: path.to_string(),
            source,
        })?;
    serde_json::to_string(&value).map_err(|e| ObfuscateError::transform(path, e))
}
