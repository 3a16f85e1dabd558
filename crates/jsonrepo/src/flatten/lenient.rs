//! Leniency layer applied before strict JSON parsing.
//!
//! Comments (`//` and `/* */`) and trailing commas are replaced by spaces.
//! Every removed character becomes as many spaces as it had UTF-8 bytes and
//! newlines are kept, so byte offsets and line/column positions reported by
//! the parser still point into the original text.
//!
//! A block comment that is never closed is left as written, so the parser
//! rejects the document at the `/*`.

use std::borrow::Cow;

/// Returns `text` with comments and trailing commas blanked out.
///
/// Borrows when there is nothing to remove.
pub fn normalize(text: &str) -> Cow<'_, str> {
    if !text.contains('/') && !text.contains(',') {
        return Cow::Borrowed(text);
    }

    let without_comments = strip_comments(text);
    let cleaned = strip_trailing_commas(&without_comments);

    if cleaned == text {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(cleaned)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Code,
    Str,
    StrEscape,
    LineComment,
    BlockComment,
}

fn blank(out: &mut String, c: char) {
    if c == '\n' || c == '\r' {
        out.push(c);
    } else {
        out.extend(std::iter::repeat_n(' ', c.len_utf8()));
    }
}

fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut state = State::Code;
    let mut comment_start = 0;

    while let Some(c) = chars.next() {
        state = match state {
            State::Code => match (c, chars.peek()) {
                ('"', _) => {
                    out.push(c);
                    State::Str
                }
                ('/', Some('/')) => {
                    chars.next();
                    out.push_str("  ");
                    State::LineComment
                }
                ('/', Some('*')) => {
                    chars.next();
                    comment_start = out.len();
                    out.push_str("  ");
                    State::BlockComment
                }
                _ => {
                    out.push(c);
                    State::Code
                }
            },

            State::Str => {
                out.push(c);
                match c {
                    '\\' => State::StrEscape,
                    '"' => State::Code,
                    _ => State::Str,
                }
            }

            State::StrEscape => {
                out.push(c);
                State::Str
            }

            State::LineComment => {
                blank(&mut out, c);
                if c == '\n' {
                    State::Code
                } else {
                    State::LineComment
                }
            }

            State::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    out.push_str("  ");
                    State::Code
                } else {
                    blank(&mut out, c);
                    State::BlockComment
                }
            }
        };
    }

    // Output and input offsets agree, so the tail can be restored as is.
    if state == State::BlockComment {
        out.truncate(comment_start);
        out.push_str(&text[comment_start..]);
    }

    out
}

/// Blanks a comma when the next significant character closes the container
/// and the comma follows a value (so `[,]` and `[1,,]` stay invalid).
fn strip_trailing_commas(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut last_significant: Option<char> = None;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
                last_significant = Some('"');
            }
            continue;
        }

        if c == ',' {
            let next = chars[i + 1..].iter().find(|n| !n.is_whitespace());
            let closes = matches!(next, Some('}' | ']'));
            let follows_value = !matches!(last_significant, None | Some('{' | '[' | ','));

            if closes && follows_value {
                out.push(' ');
                continue;
            }
        }

        if c == '"' {
            in_string = true;
        }
        if !c.is_whitespace() {
            last_significant = Some(c);
        }
        out.push(c);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json_is_borrowed() {
        let text = r#"{"a": [1, 2], "b": "x"}"#;
        assert!(matches!(normalize(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_line_comment_removed() {
        let text = "{\n  // port\n  \"a\": 1\n}";
        let normalized = normalize(text);
        assert!(!normalized.contains("port"));
        assert_eq!(normalized.len(), text.len());
        assert_eq!(normalized.lines().count(), text.lines().count());
    }

    #[test]
    fn test_block_comment_removed() {
        let text = "{ /* multi\n line */ \"a\": 1 }";
        let normalized = normalize(text);
        assert!(!normalized.contains("multi"));
        assert!(normalized.contains('\n'));
        assert_eq!(normalized.len(), text.len());
    }

    #[test]
    fn test_comment_markers_inside_strings_kept() {
        let text = r#"{"url": "http://host/*path*/", "q": "a\"//b"}"#;
        assert_eq!(normalize(text), text);
    }

    #[test]
    fn test_trailing_commas_removed() {
        let text = "{\"a\": [1, 2,], \"b\": {\"c\": 1,},}";
        let normalized = normalize(text);
        let value: serde_json::Value = serde_json::from_str(&normalized).unwrap();
        assert_eq!(value["a"][1], 2);
        assert_eq!(normalized.len(), text.len());
    }

    #[test]
    fn test_trailing_comma_before_comment() {
        let text = "{\"a\": 1, // last\n}";
        let normalized = normalize(text);
        assert!(serde_json::from_str::<serde_json::Value>(&normalized).is_ok());
    }

    #[test]
    fn test_leading_or_double_commas_stay_invalid() {
        assert_eq!(normalize("[,]"), "[,]");
        assert!(serde_json::from_str::<serde_json::Value>(&normalize("[1,,]")).is_err());
    }

    #[test]
    fn test_unclosed_block_comment_kept() {
        let text = "{\"a\": 1 /* done */} /* never closed";
        let normalized = normalize(text);

        assert_eq!(normalized.len(), text.len());
        assert!(!normalized.contains("done"));
        assert!(normalized.ends_with("/* never closed"));
        assert!(serde_json::from_str::<serde_json::Value>(&normalized).is_err());
    }

    #[test]
    fn test_unclosed_line_comment_is_fine() {
        let normalized = normalize("{\"a\": 1} // no newline");
        assert!(serde_json::from_str::<serde_json::Value>(&normalized).is_ok());
    }

    #[test]
    fn test_multibyte_comment_keeps_byte_length() {
        let text = "{\"a\": 1 /* größe */}";
        assert_eq!(normalize(text).len(), text.len());
    }
}
