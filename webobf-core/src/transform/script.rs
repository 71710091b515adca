//! JavaScript Obfuscator
//!
//! Token-level obfuscation for JavaScript sources. Every technique keeps the
//! program's behaviour:
//! - Hex/unicode-escaped string literals ("get" -> "\x67\x65\x74")
//! - Debug statement stripping (`console.log(...)`, `debugger;`)
//! - Comment removal
//! - Line compaction
//!
//! Options for each level are loaded once per batch, see [`ScriptConfig`].

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::category::Level;

/// Options for the script obfuscator, one set per [`Level`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptConfig {
    /// Remove `//` and `/* */` comments
    #[serde(default = "default_true")]
    pub strip_comments: bool,
    /// Remove standalone `console.*` and `debugger` statements
    #[serde(default)]
    pub strip_debug: bool,
    /// Rewrite string literal bodies as escape sequences
    #[serde(default)]
    pub encode_strings: bool,
    /// Shortest string literal that gets encoded
    #[serde(default = "default_encode_min_length")]
    pub encode_min_length: usize,
    /// Trim every line and drop blank lines
    #[serde(default)]
    pub compact_lines: bool,
}

fn default_true() -> bool {
    true
}

fn default_encode_min_length() -> usize {
    1
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self::preset(Level::Low)
    }
}

impl ScriptConfig {
    /// Built-in options for a level
    pub fn preset(level: Level) -> Self {
        match level {
            Level::Low => Self {
                strip_comments: true,
                strip_debug: false,
                encode_strings: false,
                encode_min_length: 1,
                compact_lines: false,
            },
            Level::Normal => Self {
                strip_comments: true,
                strip_debug: true,
                encode_strings: false,
                encode_min_length: 1,
                compact_lines: true,
            },
            Level::High => Self {
                strip_comments: true,
                strip_debug: true,
                encode_strings: true,
                encode_min_length: 1,
                compact_lines: true,
            },
        }
    }
}

/// A script obfuscation engine
///
/// The built-in [`Obfuscator`] implements this; another engine can be plugged
/// into the transform registry in its place.
pub trait ScriptEngine: Send + Sync {
    fn obfuscate(&self, source: &str) -> Result<String, String>;
}

/// Result of obfuscating a file
#[derive(Debug, Clone)]
pub struct ObfuscationResult {
    /// The transformed source code
    pub source: String,
    /// Number of strings encoded
    pub strings_encoded: usize,
    /// Number of debug statements stripped
    pub debug_stripped: usize,
    /// Number of comments removed
    pub comments_removed: usize,
}

impl ObfuscationResult {
    pub fn total_transforms(&self) -> usize {
        self.strings_encoded + self.debug_stripped + self.comments_removed
    }
}

/// Obfuscator instance with configuration
#[derive(Debug, Clone)]
pub struct Obfuscator {
    config: ScriptConfig,
}

impl Obfuscator {
    pub fn new(config: ScriptConfig) -> Self {
        Self { config }
    }

    pub fn for_level(level: Level) -> Self {
        Self::new(ScriptConfig::preset(level))
    }

    /// Obfuscate a JavaScript source string
    pub fn obfuscate(&self, source: &str) -> ObfuscationResult {
        let mut strings_encoded = 0;
        let mut comments_removed = 0;

        // 1. Rebuild the source token by token
        let mut result = String::with_capacity(source.len());
        for token in tokenize(source) {
            match token {
                Token::Code(code) => result.push_str(code),
                Token::Template(text) => result.push_str(text),
                Token::Str { quote, body } => {
                    let encode = self.config.encode_strings
                        && !body.contains('\\')
                        && body.chars().count() >= self.config.encode_min_length;
                    result.push(quote);
                    if encode {
                        result.push_str(&to_escaped(body));
                        strings_encoded += 1;
                    } else {
                        result.push_str(body);
                    }
                    result.push(quote);
                }
                Token::LineComment(text) => {
                    if self.config.strip_comments {
                        comments_removed += 1;
                    } else {
                        result.push_str(text);
                    }
                }
                Token::BlockComment(text) => {
                    if self.config.strip_comments {
                        comments_removed += 1;
                        // Keep line structure so statements separated by the comment stay apart
                        if text.contains('\n') {
                            result.push('\n');
                        } else {
                            result.push(' ');
                        }
                    } else {
                        result.push_str(text);
                    }
                }
            }
        }

        // 2. Strip debug statements (line by line)
        let mut debug_stripped = 0;
        if self.config.strip_debug {
            let (stripped, count) = strip_debug_lines(&result);
            result = stripped;
            debug_stripped = count;
        }

        // 3. Compact lines
        if self.config.compact_lines {
            result = compact_lines(&result);
        }

        ObfuscationResult {
            source: result,
            strings_encoded,
            debug_stripped,
            comments_removed,
        }
    }
}

impl ScriptEngine for Obfuscator {
    fn obfuscate(&self, source: &str) -> Result<String, String> {
        let result = Obfuscator::obfuscate(self, source);
        tracing::debug!(
            "{} script transforms ({} strings encoded, {} debug statements stripped, {} comments removed)",
            result.total_transforms(),
            result.strings_encoded,
            result.debug_stripped,
            result.comments_removed
        );
        Ok(result.source)
    }
}

/// Lexical pieces of a JavaScript source
#[derive(Debug, PartialEq)]
enum Token<'a> {
    Code(&'a str),
    Str { quote: char, body: &'a str },
    Template(&'a str),
    LineComment(&'a str),
    BlockComment(&'a str),
}

/// Split source into code, strings, templates and comments
///
/// Regex literals are kept inside code tokens so quotes and slashes in their
/// bodies are never read as strings or comments.
fn tokenize(source: &str) -> Vec<Token<'_>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut code_start = 0;
    let mut prev = Prev::Start;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                flush(&mut tokens, source, code_start, i);
                let end = scan_quoted(bytes, i + 1, quote);
                match end {
                    Some(close) => {
                        tokens.push(Token::Str {
                            quote: quote as char,
                            body: &source[i + 1..close],
                        });
                        i = close + 1;
                    }
                    None => {
                        // Unterminated literal, leave the rest untouched
                        tokens.push(Token::Code(&source[i..]));
                        return tokens;
                    }
                }
                code_start = i;
                prev = Prev::Value;
            }
            b'`' => {
                flush(&mut tokens, source, code_start, i);
                let end = scan_template(bytes, i + 1).unwrap_or(bytes.len());
                tokens.push(Token::Template(&source[i..end]));
                i = end;
                code_start = i;
                prev = Prev::Value;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                flush(&mut tokens, source, code_start, i);
                let end = source[i..].find('\n').map(|n| i + n).unwrap_or(bytes.len());
                tokens.push(Token::LineComment(&source[i..end]));
                i = end;
                code_start = i;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                flush(&mut tokens, source, code_start, i);
                let end = source[i + 2..]
                    .find("*/")
                    .map(|n| i + 2 + n + 2)
                    .unwrap_or(bytes.len());
                tokens.push(Token::BlockComment(&source[i..end]));
                i = end;
                code_start = i;
            }
            b'/' if prev.allows_regex(source) => match scan_regex(bytes, i + 1) {
                Some(end) => {
                    i = end;
                    prev = Prev::Value;
                }
                None => {
                    i += 1;
                    prev = Prev::Punct(b'/');
                }
            },
            b if b.is_ascii_whitespace() => i += 1,
            b if is_ident_byte(b) => {
                let start = i;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                prev = Prev::Word(start, i);
            }
            b => {
                prev = Prev::Punct(b);
                i += 1;
            }
        }
    }
    flush(&mut tokens, source, code_start, bytes.len());
    tokens
}

/// Last significant thing seen before the current position
#[derive(Debug, Clone, Copy)]
enum Prev {
    Start,
    /// A string, template or regex literal
    Value,
    /// Identifier, keyword or number, as a byte range
    Word(usize, usize),
    Punct(u8),
}

/// Keywords after which `/` starts a regex rather than a division
const REGEX_KEYWORDS: &[&str] = &[
    "return", "typeof", "instanceof", "in", "of", "new", "delete", "void", "throw", "case", "do",
    "else", "yield", "await",
];

impl Prev {
    fn allows_regex(self, source: &str) -> bool {
        match self {
            Prev::Start => true,
            Prev::Value => false,
            Prev::Word(start, end) => REGEX_KEYWORDS.contains(&&source[start..end]),
            Prev::Punct(b) => !matches!(b, b')' | b']'),
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || b >= 0x80
}

/// End index (exclusive) of a regex literal body starting at `i`, flags included
fn scan_regex(bytes: &[u8], mut i: usize) -> Option<usize> {
    let mut in_class = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => {
                i += 1;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                return Some(i);
            }
            _ => i += 1,
        }
    }
    None
}

fn flush<'a>(tokens: &mut Vec<Token<'a>>, source: &'a str, start: usize, end: usize) {
    if end > start {
        tokens.push(Token::Code(&source[start..end]));
    }
}

/// Index of the closing quote, honouring backslash escapes
fn scan_quoted(bytes: &[u8], mut i: usize, quote: u8) -> Option<usize> {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return None,
            b if b == quote => return Some(i),
            _ => i += 1,
        }
    }
    None
}

/// End index (exclusive) of a template literal, including the closing backtick
fn scan_template(bytes: &[u8], mut i: usize) -> Option<usize> {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Convert a string to escaped format
/// "get" -> "\x67\x65\x74", non-Latin-1 characters use `\uXXXX` per UTF-16 unit
fn to_escaped(s: &str) -> String {
    let mut out = String::with_capacity(s.len() * 4);
    for unit in s.encode_utf16() {
        if unit < 0x100 {
            out.push_str(&format!("\\x{:02x}", unit));
        } else {
            out.push_str(&format!("\\u{:04x}", unit));
        }
    }
    out
}

fn debug_call_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:console\.(?:log|debug|info|trace)\s*\(|debugger\b)")
            .expect("debug statement pattern is valid")
    })
}

/// Whether a line holds a single debug statement and nothing else
fn is_debug_line(line: &str) -> bool {
    let line = line.trim();
    let Some(found) = debug_call_regex().find(line) else {
        return false;
    };
    let rest = if line.starts_with("debugger") {
        &line[found.end()..]
    } else {
        match close_paren(line.as_bytes(), found.end()) {
            Some(end) => &line[end..],
            None => return false,
        }
    };
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(';').unwrap_or(rest);
    rest.trim().is_empty()
}

/// Index just past the `)` matching an already opened `(`, skipping quoted text
fn close_paren(bytes: &[u8], mut i: usize) -> Option<usize> {
    let mut depth = 1;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'' | b'`') => {
                let close = if quote == b'`' {
                    scan_template(bytes, i + 1)?
                } else {
                    scan_quoted(bytes, i + 1, quote)? + 1
                };
                i = close;
                continue;
            }
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Drop lines that hold nothing but a debug statement
fn strip_debug_lines(source: &str) -> (String, usize) {
    let mut count = 0;
    let kept: Vec<&str> = source
        .lines()
        .filter(|line| {
            let strip = is_debug_line(line);
            if strip {
                count += 1;
            }
            !strip
        })
        .collect();
    (kept.join("\n"), count)
}

/// Trim every line and drop the blank ones
///
/// Line breaks are kept so automatic semicolon insertion still applies.
fn compact_lines(source: &str) -> String {
    source
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
