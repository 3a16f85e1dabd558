//! JSON document flattening.
//!
//! [`flatten`] turns a JSON object into a [`FlatMapping`] whose keys are the
//! paths to every leaf, joined with [`KEY_DELIMITER`]:
//!
//! ```text
//! {                              Logging:Level        = Debug
//!   "Logging": {                 Hosts:0              = a.example
//!     "Level": "Debug"           Hosts:1              = b.example
//!   },                     ──▶   Retry:Backoff        = 1.50
//!   "Hosts": ["a.example",       Retry:Enabled        = true
//!             "b.example"],      Features             = <absent>
//!   "Retry": { "Backoff": 1.50,
//!              "Enabled": true },
//!   "Features": {}
//! }
//! ```
//!
//! # Rules
//!
//! - The root must be an object; an empty root yields an empty mapping.
//! - Array elements are addressed by their zero-based index.
//! - `null`, `{}` and `[]` below the root produce an absent value.
//! - Numbers and booleans keep their JSON spelling; strings are unescaped.
//! - Keys are unique ignoring case; a collision rejects the whole document.
//! - Comments and trailing commas are tolerated.
//! - At most [`MAX_DEPTH`] objects and arrays may be nested, the root included.

mod error;
mod lenient;
mod node;

pub use error::{ErrorKind, FlattenError};
pub use lenient::normalize;
pub use node::JsonKind;

use serde_json::value::RawValue;

use crate::mapping::FlatMapping;
use node::ObjectEntries;

/// Separator between path segments of flattened keys.
pub const KEY_DELIMITER: &str = ":";

/// Deepest nesting of objects and arrays [`flatten`] accepts. The root
/// object is level 1.
pub const MAX_DEPTH: usize = 64;

/// Flattens a JSON document into an ordered, case-insensitive mapping.
///
/// # Errors
///
/// - [`FlattenError::Malformed`] if the text is not JSON or nests deeper
///   than [`MAX_DEPTH`]
/// - [`FlattenError::InvalidRoot`] if the root is not an object
/// - [`FlattenError::DuplicateKey`] if two paths collide ignoring case
/// - [`FlattenError::UnsupportedToken`] for a value kind JSON does not define
///
/// # Example
///
/// ```rust
/// use jsonrepo::flatten::flatten;
///
/// let mapping = flatten(r#"{"a": [{"b": 1}, {"b": 2}]}"#).unwrap();
///
/// assert_eq!(mapping.value("a:0:b"), Some("1"));
/// assert_eq!(mapping.value("A:1:B"), Some("2"));
/// ```
pub fn flatten(text: &str) -> Result<FlatMapping, FlattenError> {
    let normalized = normalize(text);
    if let Some(offset) = depth_overflow(&normalized, MAX_DEPTH) {
        return Err(FlattenError::too_deep(text, offset, MAX_DEPTH));
    }

    let root: &RawValue =
        serde_json::from_str(&normalized).map_err(|e| FlattenError::malformed(text, &e))?;

    let kind = JsonKind::of(root);
    if kind != JsonKind::Object {
        return Err(FlattenError::InvalidRoot { found: kind });
    }

    let mut flattener = Flattener::default();
    flattener.visit_object(root)?;

    Ok(flattener.data)
}

/// Depth-first walker holding the accumulated mapping and the path stack.
///
/// Each stack element is the full path at that depth, so the current key is
/// always the top of the stack.
#[derive(Default)]
struct Flattener {
    data: FlatMapping,
    paths: Vec<String>,
}

impl Flattener {
    fn enter(&mut self, segment: &str) {
        let path = match self.paths.last() {
            Some(parent) => format!("{parent}{KEY_DELIMITER}{segment}"),
            None => segment.to_owned(),
        };
        self.paths.push(path);
    }

    fn exit(&mut self) {
        self.paths.pop();
    }

    fn current_path(&self) -> &str {
        self.paths.last().map_or("", String::as_str)
    }

    fn emit(&mut self, value: Option<String>) -> Result<(), FlattenError> {
        let key = self.current_path().to_owned();
        self.data
            .try_insert(key, value)
            .map_err(|exists| FlattenError::DuplicateKey { key: exists.key })
    }

    fn visit_object(&mut self, raw: &RawValue) -> Result<(), FlattenError> {
        let ObjectEntries(entries) =
            serde_json::from_str(raw.get()).map_err(|e| FlattenError::malformed(raw.get(), &e))?;

        if entries.is_empty() {
            // The root object itself never produces an entry.
            if !self.paths.is_empty() {
                self.emit(None)?;
            }
            return Ok(());
        }

        for (name, value) in entries {
            self.enter(&name);
            self.visit_value(value)?;
            self.exit();
        }

        Ok(())
    }

    fn visit_array(&mut self, raw: &RawValue) -> Result<(), FlattenError> {
        let elements: Vec<&RawValue> =
            serde_json::from_str(raw.get()).map_err(|e| FlattenError::malformed(raw.get(), &e))?;

        if elements.is_empty() {
            return self.emit(None);
        }

        for (index, element) in elements.into_iter().enumerate() {
            self.enter(&index.to_string());
            self.visit_value(element)?;
            self.exit();
        }

        Ok(())
    }

    fn visit_value(&mut self, raw: &RawValue) -> Result<(), FlattenError> {
        debug_assert!(!self.paths.is_empty());

        match JsonKind::of(raw) {
            JsonKind::Object => self.visit_object(raw),

            JsonKind::Array => self.visit_array(raw),

            kind if kind.is_scalar() => {
                let value = scalar_text(raw, kind)?;
                self.emit(value)
            }

            kind => Err(FlattenError::UnsupportedToken {
                path: self.current_path().to_owned(),
                kind,
            }),
        }
    }
}

/// Byte offset of the first bracket that opens level `limit + 1`.
///
/// The walker recurses once per level, so this runs before parsing.
fn depth_overflow(text: &str, limit: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, byte) in text.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > limit {
                    return Some(offset);
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    None
}

/// Renders a scalar: strings unescaped, numbers and booleans verbatim,
/// `null` as absent.
fn scalar_text(raw: &RawValue, kind: JsonKind) -> Result<Option<String>, FlattenError> {
    match kind {
        JsonKind::Null => Ok(None),

        JsonKind::String => serde_json::from_str::<String>(raw.get())
            .map(Some)
            .map_err(|e| FlattenError::malformed(raw.get(), &e)),

        _ => Ok(Some(raw.get().trim().to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(text: &str) -> Vec<(String, Option<String>)> {
        flatten(text)
            .unwrap()
            .into_iter()
            .map(|e| (e.key().to_owned(), e.value().map(str::to_owned)))
            .collect()
    }

    fn pair(key: &str, value: Option<&str>) -> (String, Option<String>) {
        (key.to_owned(), value.map(str::to_owned))
    }

    #[test]
    fn test_empty_root() {
        assert!(flatten("{}").unwrap().is_empty());
        assert!(flatten("  { }  ").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_root_shapes() {
        for (text, found) in [
            ("[1,2]", JsonKind::Array),
            ("\"text\"", JsonKind::String),
            ("42", JsonKind::Number),
            ("true", JsonKind::True),
            ("null", JsonKind::Null),
        ] {
            match flatten(text) {
                Err(FlattenError::InvalidRoot { found: f }) => assert_eq!(f, found, "{text}"),
                other => panic!("expected InvalidRoot for {text}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_sibling_case_collision() {
        let err = flatten(r#"{"a":1,"A":2}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert!(matches!(err, FlattenError::DuplicateKey { ref key } if key == "A"));
    }

    #[test]
    fn test_exact_duplicate_property() {
        let err = flatten(r#"{"a":1,"a":2}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_nested_case_difference_is_fine() {
        assert_eq!(entries(r#"{"a":{"A":1}}"#), vec![pair("a:A", Some("1"))]);
    }

    #[test]
    fn test_collision_across_levels() {
        // "a:b" as a literal property name collides with the nested path
        let err = flatten(r#"{"a":{"b":1},"A:B":2}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_empty_container_collides_with_scalar() {
        let err = flatten(r#"{"a":{},"A":1}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_array_of_objects() {
        assert_eq!(
            entries(r#"{"a":[{"b":1},{"b":2}]}"#),
            vec![pair("a:0:b", Some("1")), pair("a:1:b", Some("2"))]
        );
    }

    #[test]
    fn test_null_and_empty_containers_are_absent() {
        assert_eq!(
            entries(r#"{"a":null,"b":{},"c":[]}"#),
            vec![pair("a", None), pair("b", None), pair("c", None)]
        );
    }

    #[test]
    fn test_scalar_text_forms() {
        let mapping =
            flatten(r#"{"n": 1.50, "e": -2E+3, "t": true, "f": false, "s": "line\nbreak é"}"#)
                .unwrap();

        assert_eq!(mapping.value("n"), Some("1.50"));
        assert_eq!(mapping.value("e"), Some("-2E+3"));
        assert_eq!(mapping.value("t"), Some("true"));
        assert_eq!(mapping.value("f"), Some("false"));
        assert_eq!(mapping.value("s"), Some("line\nbreak é"));
    }

    #[test]
    fn test_order_follows_document() {
        let mapping = flatten(r#"{"z":1,"a":{"y":2,"b":3},"m":[4,5]}"#).unwrap();
        assert_eq!(
            mapping.keys().collect::<Vec<_>>(),
            vec!["z", "a:y", "a:b", "m:0", "m:1"]
        );
    }

    #[test]
    fn test_nested_arrays() {
        assert_eq!(
            entries(r#"{"m":[[1,2],[],[{"k":null}]]}"#),
            vec![
                pair("m:0:0", Some("1")),
                pair("m:0:1", Some("2")),
                pair("m:1", None),
                pair("m:2:0:k", None),
            ]
        );
    }

    #[test]
    fn test_numeric_property_and_index_collide() {
        let err = flatten(r#"{"a":["x"],"A":{"0":"y"}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
    }

    #[test]
    fn test_comments_and_trailing_commas() {
        let text = r#"{
            // connection settings
            "Db": {
                "Host": "localhost", /* default */
                "Ports": [5432, 5433,],
            },
        }"#;

        assert_eq!(
            entries(text),
            vec![
                pair("Db:Host", Some("localhost")),
                pair("Db:Ports:0", Some("5432")),
                pair("Db:Ports:1", Some("5433")),
            ]
        );
    }

    #[test]
    fn test_malformed_document() {
        for text in ["", "{", "{\"a\" 1}", "not json", "{\"a\":1} trailing"] {
            let err = flatten(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Malformed, "{text:?}");
        }
    }

    #[test]
    fn test_unclosed_block_comment_is_malformed() {
        for text in ["{\"a\":1} /* never closed", "{\"a\": /* 1}", "{\n/*\n"] {
            let err = flatten(text).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Malformed, "{text:?}");
        }
    }

    #[test]
    fn test_malformed_span_points_into_original_text() {
        let text = "{\n  // comment\n  \"a\": tru\n}";
        let FlattenError::Malformed { line, src, .. } = flatten(text).unwrap_err() else {
            panic!("expected Malformed");
        };
        assert_eq!(line, 3);
        assert_eq!(src, text);
    }

    /// A document whose single leaf sits `depth` levels down, root included.
    fn nested(depth: usize) -> String {
        let arrays = depth - 1;
        format!("{{\"a\":{}1{}}}", "[".repeat(arrays), "]".repeat(arrays))
    }

    #[test]
    fn test_nesting_at_limit_is_accepted() {
        let mapping = flatten(&nested(MAX_DEPTH)).unwrap();
        let key = format!("a{}", ":0".repeat(MAX_DEPTH - 1));
        assert_eq!(mapping.value(&key), Some("1"));
    }

    #[test]
    fn test_nesting_past_limit_is_malformed() {
        let err = flatten(&nested(MAX_DEPTH + 1)).unwrap_err();
        let FlattenError::Malformed { line, column, span, .. } = &err else {
            panic!("expected Malformed, got {err:?}");
        };

        // `{"a":` is five bytes; the 64th array bracket opens level 65.
        assert_eq!(*line, 1);
        assert_eq!(*column, 69);
        assert_eq!(span.offset(), 68);
        assert!(err.to_string().contains("64"));
    }

    #[test]
    fn test_very_deep_documents_are_rejected_without_recursing() {
        for text in [
            nested(10_000),
            format!("{}1{}", "{\"k\":".repeat(20_000), "}".repeat(20_000)),
            format!("{{\"a\":{}", "[".repeat(50_000)),
        ] {
            assert_eq!(flatten(&text).unwrap_err().kind(), ErrorKind::Malformed);
        }
    }

    #[test]
    fn test_brackets_in_strings_and_comments_do_not_nest() {
        let text = format!(
            "{{\"a\": \"{}\" /* {} */, \"b\": \"\\\"[[\"}}",
            "[".repeat(100),
            "{".repeat(100)
        );
        let mapping = flatten(&text).unwrap();
        assert_eq!(mapping.value("a"), Some("[".repeat(100).as_str()));
        assert_eq!(mapping.value("b"), Some("\"[["));
    }

    #[test]
    fn test_empty_property_name() {
        assert_eq!(entries(r#"{"":{"x":1}}"#), vec![pair(":x", Some("1"))]);
    }
}
