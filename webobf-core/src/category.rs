//! File categories and obfuscation levels

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ObfuscateError;

/// The category a scanned file belongs to; decides which transform applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Category {
    Script,
    Stylesheet,
    Markup,
    Data,
    BinaryResource,
    Passthrough,
}

impl Category {
    /// Transformed categories in batch iteration order
    pub const TRANSFORMED: [Category; 5] = [
        Category::Script,
        Category::Stylesheet,
        Category::Markup,
        Category::Data,
        Category::BinaryResource,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Script => "script",
            Category::Stylesheet => "stylesheet",
            Category::Markup => "markup",
            Category::Data => "data",
            Category::BinaryResource => "binaryResource",
            Category::Passthrough => "passthrough",
        }
    }

    /// Short label used in progress text ("Find 3 JS files")
    pub fn label(&self) -> &'static str {
        match self {
            Category::Script => "JS",
            Category::Stylesheet => "CSS",
            Category::Markup => "HTML",
            Category::Data => "JSON",
            Category::BinaryResource => "RES",
            Category::Passthrough => "OTHER",
        }
    }

    /// Whether file content is read as UTF-8 text rather than raw bytes
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            Category::Script | Category::Stylesheet | Category::Markup
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ObfuscateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" | "js" => Ok(Category::Script),
            "stylesheet" | "css" => Ok(Category::Stylesheet),
            "markup" | "html" => Ok(Category::Markup),
            "data" | "json" => Ok(Category::Data),
            "binaryResource" | "res" => Ok(Category::BinaryResource),
            "passthrough" => Ok(Category::Passthrough),
            other => Err(ObfuscateError::UnknownCategory(other.to_string())),
        }
    }
}

/// Obfuscation intensity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    #[default]
    Low,
    Normal,
    High,
}

impl Level {
    pub const NAMES: [&'static str; 3] = ["low", "normal", "high"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Normal => "normal",
            Level::High => "high",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ObfuscateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Level::Low),
            "normal" => Ok(Level::Normal),
            "high" => Ok(Level::High),
            _ => Err(ObfuscateError::ConfigLoad {
                level: s.to_string(),
                reason: "level must be one of low, normal, high".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_names_round_trip() {
        for category in Category::TRANSFORMED {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!("passthrough".parse::<Category>().unwrap(), Category::Passthrough);
        assert_eq!("css".parse::<Category>().unwrap(), Category::Stylesheet);
    }

    #[test]
    fn test_unknown_category() {
        let err = "video".parse::<Category>().unwrap_err();
        assert!(matches!(err, ObfuscateError::UnknownCategory(name) if name == "video"));
    }

    #[test]
    fn test_text_categories() {
        assert!(Category::Script.is_text());
        assert!(Category::Markup.is_text());
        assert!(!Category::Data.is_text());
        assert!(!Category::BinaryResource.is_text());
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("HIGH".parse::<Level>().unwrap(), Level::High);
        assert_eq!(Level::default(), Level::Low);
        assert!("extreme".parse::<Level>().is_err());
    }
}
