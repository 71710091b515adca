//! Transform registry
//!
//! Each transformed [`Category`] maps to exactly one [`Transform`]. Script options
//! are resolved when the transform is prepared, so a batch loads them once.

pub mod data;
pub mod markup;
pub mod resource;
pub mod script;
pub mod stylesheet;

use std::sync::Arc;

use crate::category::Category;
use crate::config::LevelSource;
use crate::error::{ObfuscateError, Result};

pub use script::{ObfuscationResult, Obfuscator, ScriptConfig, ScriptEngine};

/// A prepared per-category transform
#[derive(Clone)]
pub enum Transform {
    Script(Arc<dyn ScriptEngine>),
    Stylesheet,
    Markup,
    Data,
    BinaryResource,
}

impl std::fmt::Debug for Transform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Transform::Script(_) => "Transform::Script",
            Transform::Stylesheet => "Transform::Stylesheet",
            Transform::Markup => "Transform::Markup",
            Transform::Data => "Transform::Data",
            Transform::BinaryResource => "Transform::BinaryResource",
        })
    }
}

impl Transform {
    /// Look up the transform registered for `category`
    ///
    /// Passthrough files have no transform; asking for one is an
    /// `UnknownCategory` error. Script options for `level` are loaded from
    /// `levels`, failing with `ConfigLoad`.
    pub fn for_category(category: Category, levels: &LevelSource, level: &str) -> Result<Self> {
        match category {
            Category::Script => {
                let config = levels.load(level)?;
                Ok(Transform::Script(Arc::new(Obfuscator::new(config))))
            }
            Category::Stylesheet => Ok(Transform::Stylesheet),
            Category::Markup => Ok(Transform::Markup),
            Category::Data => Ok(Transform::Data),
            Category::BinaryResource => Ok(Transform::BinaryResource),
            Category::Passthrough => Err(ObfuscateError::UnknownCategory(
                category.as_str().to_string(),
            )),
        }
    }

    /// Use a custom script engine in place of the built-in obfuscator
    pub fn with_script_engine(engine: Arc<dyn ScriptEngine>) -> Self {
        Transform::Script(engine)
    }

    pub fn category(&self) -> Category {
        match self {
            Transform::Script(_) => Category::Script,
            Transform::Stylesheet => Category::Stylesheet,
            Transform::Markup => Category::Markup,
            Transform::Data => Category::Data,
            Transform::BinaryResource => Category::BinaryResource,
        }
    }

    /// Transform the raw content of the file at relative `path`
    pub fn apply(&self, path: &str, content: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            Transform::Script(engine) => {
                let text = decode_text(path, content)?;
                engine
                    .obfuscate(&text)
                    .map(String::into_bytes)
                    .map_err(|reason| ObfuscateError::transform(path, reason))
            }
            Transform::Stylesheet => {
                let text = decode_text(path, content)?;
                Ok(stylesheet::minify(&text).into_bytes())
            }
            Transform::Markup => {
                let text = decode_text(path, content)?;
                Ok(markup::encode_document(&text).into_bytes())
            }
            Transform::Data => data::compact(path, &content).map(String::into_bytes),
            Transform::BinaryResource => Ok(resource::append_noise(content)),
        }
    }
}

fn decode_text(path: &str, content: Vec<u8>) -> Result<String> {
    String::from_utf8(content).map_err(|e| ObfuscateError::transform(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Upper;

    impl ScriptEngine for Upper {
        fn obfuscate(&self, source: &str) -> std::result::Result<String, String> {
            Ok(source.to_uppercase())
        }
    }

    #[test]
    fn test_every_transformed_category_is_registered() {
        for category in Category::TRANSFORMED {
            let transform = Transform::for_category(category, &LevelSource::Builtin, "low").unwrap();
            assert_eq!(transform.category(), category);
        }
    }

    #[test]
    fn test_passthrough_has_no_transform() {
        let err =
            Transform::for_category(Category::Passthrough, &LevelSource::Builtin, "low").unwrap_err();
        assert_eq!(err.kind(), "UnknownCategory");
    }

    #[test]
    fn test_bad_level_fails_script_lookup() {
        let err = Transform::for_category(Category::Script, &LevelSource::Builtin, "extreme")
            .unwrap_err();
        assert_eq!(err.kind(), "ConfigLoadError");
    }

    #[test]
    fn test_apply_markup() {
        let out = Transform::Markup.apply("c.html", b"A".to_vec()).unwrap();
        assert_eq!(out, b"<script>document.write(unescape('%41'))</script>");
    }

    #[test]
    fn test_apply_rejects_invalid_utf8_text() {
        let err = Transform::Stylesheet
            .apply("b.css", vec![0xff, 0xfe])
            .unwrap_err();
        assert_eq!(err.kind(), "TransformError");
    }

    #[test]
    fn test_custom_script_engine() {
        let transform = Transform::with_script_engine(Arc::new(Upper));
        let out = transform.apply("a.js", b"let a;".to_vec()).unwrap();
        assert_eq!(out, b"LET A;");
    }

    #[test]
    fn test_apply_builtin_script_engine() {
        let transform = Transform::for_category(Category::Script, &LevelSource::Builtin, "normal").unwrap();
        let out = transform
            .apply("a.js", b"// c\nconsole.log(x);\nrun(); init();\n".to_vec())
            .unwrap();
        assert_eq!(out, b"run(); init();");
    }
}
