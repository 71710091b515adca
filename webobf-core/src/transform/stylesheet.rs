//! CSS minification
//!
//! Removes comments and redundant whitespace. String literals (`"..."`, `'...'`)
//! are copied verbatim.

/// Characters around which whitespace is never significant
const TIGHT: &[char] = &['{', '}', ';', ',', '>'];

/// Minify a stylesheet
pub fn minify(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut pending_space = false;
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        match c {
            '"' | '\'' => {
                flush_space(&mut out, &mut pending_space, c);
                out.push(c);
                let mut escaped = false;
                for inner in chars.by_ref() {
                    out.push(inner);
                    if escaped {
                        escaped = false;
                    } else if inner == '\\' {
                        escaped = true;
                    } else if inner == c {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for inner in chars.by_ref() {
                    if prev == '*' && inner == '/' {
                        break;
                    }
                    prev = inner;
                }
                pending_space = !out.is_empty();
            }
            c if c.is_whitespace() => {
                pending_space = !out.is_empty();
            }
            _ => {
                if c == '}' && out.ends_with(';') {
                    out.pop();
                }
                flush_space(&mut out, &mut pending_space, c);
                out.push(c);
                match c {
                    '{' => depth += 1,
                    '}' => depth = depth.saturating_sub(1),
                    // Inside a declaration block `color : red` becomes `color:red`
                    ':' if depth > 0 => pending_space = false,
                    _ => {}
                }
                if c == ':' && depth > 0 {
                    while chars.peek().is_some_and(|next| next.is_whitespace()) {
                        chars.next();
                    }
                }
            }
        }
    }
    out
}

/// Emit a collapsed space before `next` unless either side makes it redundant
fn flush_space(out: &mut String, pending_space: &mut bool, next: char) {
    if *pending_space {
        let prev = out.chars().last();
        let redundant = TIGHT.contains(&next)
            || prev.is_some_and(|p| TIGHT.contains(&p))
            || (next == ':' && prev.is_some() && out_in_block(out));
        if !redundant {
            out.push(' ');
        }
    }
    *pending_space = false;
}

/// Whether the output currently ends inside a `{ ... }` block
fn out_in_block(out: &str) -> bool {
    out.rfind('{').map_or(false, |open| {
        out.rfind('}').map_or(true, |close| close < open)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapse_whitespace() {
        let source = "body {\n    color : red;\n    margin: 0 auto;\n}\n";
        assert_eq!(minify(source), "body{color:red;margin:0 auto}");
    }

    #[test]
    fn test_strip_comments() {
        let source = "/* header */\na { color: blue; } /* trailing */";
        assert_eq!(minify(source), "a{color:blue}");
    }

    #[test]
    fn test_selector_pseudo_class_spacing_kept() {
        let source = "div :hover , p > a { top: 1px }";
        assert_eq!(minify(source), "div :hover,p>a{top:1px}");
    }

    #[test]
    fn test_strings_preserved() {
        let source = "a::after { content: \"  /* not a comment */  \"; }";
        assert_eq!(minify(source), "a::after{content:\"  /* not a comment */  \"}");
    }

    #[test]
    fn test_media_query() {
        let source = "@media (max-width: 600px) {\n  .a { display: none; }\n}";
        assert_eq!(minify(source), "@media (max-width: 600px){.a{display:none}}");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(minify(""), "");
        assert_eq!(minify("  /* only */  "), "");
    }
}
