//! Flattening error types with rich diagnostics.

use std::fmt::{self, Display, Formatter};

use miette::{Diagnostic, SourceSpan};

use super::node::JsonKind;

/// Error returned when a JSON document cannot be flattened.
///
/// Integrates with [`miette`]: malformed documents carry the document text
/// and a labelled span pointing at the offending location.
///
/// ```text
/// jsonrepo::flatten::malformed
///
///   × could not parse the JSON document: expected `:` at line 3 column 12
///    ╭─[3:12]
///  3 │   "port" 8080
///    ·          ──┬─
///    ·            ╰── expected `:`
///    ╰────
///   help: check for missing quotes, colons or brackets
/// ```
#[derive(Debug, Diagnostic, thiserror::Error)]
pub enum FlattenError {
    /// The text is not valid JSON, even with comments and trailing commas
    /// allowed.
    #[error("could not parse the JSON document: {message} at line {line} column {column}")]
    #[diagnostic(code(jsonrepo::flatten::malformed))]
    Malformed {
        /// Parser message.
        message: String,

        /// 1-based line of the error.
        line: usize,

        /// 1-based column of the error.
        column: usize,

        /// The document text.
        #[source_code]
        src: String,

        /// Location of the error in `src`.
        #[label("{message}")]
        span: SourceSpan,

        /// Suggestion for how to fix.
        #[help]
        help: String,
    },

    /// The document root is not a JSON object.
    #[error("top-level JSON element must be an object, instead '{found}' was found")]
    #[diagnostic(
        code(jsonrepo::flatten::invalid_root),
        help("wrap the document in an object, e.g. {{ \"items\": [...] }}")
    )]
    InvalidRoot {
        /// The kind of value found at the root.
        found: JsonKind,
    },

    /// Two flattened paths are equal when compared case-insensitively.
    #[error("a duplicate key '{key}' was found")]
    #[diagnostic(
        code(jsonrepo::flatten::duplicate_key),
        help("configuration keys are case-insensitive; rename one of the properties")
    )]
    DuplicateKey {
        /// The path of the entry that collided.
        key: String,
    },

    /// A value of a kind JSON does not define was encountered.
    #[error("unsupported JSON token '{kind}' was found at '{path}'")]
    #[diagnostic(code(jsonrepo::flatten::unsupported_token))]
    UnsupportedToken {
        /// Path of the offending value.
        path: String,

        /// The token kind as reported by the classifier.
        kind: JsonKind,
    },
}

/// Discriminant of a [`FlattenError`], handy for matching in callers and
/// tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`FlattenError::Malformed`].
    Malformed,
    /// See [`FlattenError::InvalidRoot`].
    InvalidRoot,
    /// See [`FlattenError::DuplicateKey`].
    DuplicateKey,
    /// See [`FlattenError::UnsupportedToken`].
    UnsupportedToken,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed => write!(f, "malformed document"),

            Self::InvalidRoot => write!(f, "invalid root shape"),

            Self::DuplicateKey => write!(f, "duplicate key"),

            Self::UnsupportedToken => write!(f, "unsupported token"),
        }
    }
}

impl FlattenError {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::InvalidRoot { .. } => ErrorKind::InvalidRoot,
            Self::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Self::UnsupportedToken { .. } => ErrorKind::UnsupportedToken,
        }
    }

    /// Builds a [`FlattenError::Malformed`] from a `serde_json` error.
    ///
    /// `content` must be the text the parser saw so the span lines up.
    pub(crate) fn malformed(content: &str, err: &serde_json::Error) -> Self {
        let line = err.line();
        let column = err.column();
        let offset = line_col_to_offset(content, line, column);
        let message = strip_position(&err.to_string());

        Self::Malformed {
            help: help_for(err),
            span: offset_to_span(offset, content),
            src: content.to_owned(),
            message,
            line,
            column,
        }
    }

    /// Builds a [`FlattenError::Malformed`] for a bracket at `offset` that
    /// nests deeper than `limit`.
    pub(crate) fn too_deep(content: &str, offset: usize, limit: usize) -> Self {
        let (line, column) = offset_to_line_col(content, offset);

        Self::Malformed {
            message: format!("nesting exceeds the maximum depth of {limit}"),
            help: format!("flatten objects and arrays to at most {limit} levels"),
            span: SourceSpan::new(offset.min(content.len()).into(), 1),
            src: content.to_owned(),
            line,
            column,
        }
    }
}

/// `serde_json` appends " at line X column Y"; the position is rendered
/// separately.
fn strip_position(message: &str) -> String {
    message
        .rfind(" at line ")
        .map_or(message, |pos| &message[..pos])
        .to_owned()
}

fn help_for(err: &serde_json::Error) -> String {
    if err.is_eof() {
        "the document ends early; check for unclosed objects, arrays or strings".to_owned()
    } else {
        "check for missing quotes, colons or brackets".to_owned()
    }
}

/// Converts a 1-based line/column pair to a byte offset.
fn line_col_to_offset(content: &str, line: usize, col: usize) -> usize {
    let mut offset = 0;

    for (i, l) in content.split('\n').enumerate() {
        if (i + 1) == line {
            return (offset + col.saturating_sub(1)).min(content.len());
        }

        offset += l.len() + 1;
    }

    content.len()
}

/// Converts a byte offset to a 1-based line/column pair.
fn offset_to_line_col(content: &str, offset: usize) -> (usize, usize) {
    let before = content.get(..offset).unwrap_or(content);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |pos| pos + 1);

    (line, before.len() - line_start + 1)
}

/// Converts a byte offset to a short span covering the token at that offset.
fn offset_to_span(offset: usize, content: &str) -> SourceSpan {
    let mut start = offset.min(content.len());
    while !content.is_char_boundary(start) {
        start -= 1;
    }

    let remaining = &content[start..];
    let len = remaining
        .find(|c: char| c.is_whitespace() || c == ',' || c == '}' || c == ']')
        .unwrap_or_else(|| remaining.len().min(20))
        .max(1);

    SourceSpan::new(start.into(), len)
}
