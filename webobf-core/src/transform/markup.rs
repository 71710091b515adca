//! HTML escaping
//!
//! The whole document is percent-escaped and wrapped in a script that writes it
//! back with `unescape` when the page loads:
//!
//! ```text
//! <script>document.write(unescape('%3C%68%31%3E...'))</script>
//! ```

const PREFIX: &str = "<script>document.write(unescape('";
const SUFFIX: &str = "'))</script>";

/// Percent-escape every character of `source`
///
/// Latin-1 characters become `%XX`, everything else becomes `%uXXXX` per UTF-16
/// code unit, which is what `unescape` understands.
pub fn percent_escape(source: &str) -> String {
    let mut out = String::with_capacity(source.len() * 3);
    for unit in source.encode_utf16() {
        if unit < 0x100 {
            out.push_str(&format!("%{:02X}", unit));
        } else {
            out.push_str(&format!("%u{:04X}", unit));
        }
    }
    out
}

/// Wrap an HTML document in a self-decoding script
pub fn encode_document(source: &str) -> String {
    format!("{}{}{}", PREFIX, percent_escape(source), SUFFIX)
}
