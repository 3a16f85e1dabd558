//! JSON value classification over raw, already-validated document slices.
//!
//! The flattener never builds a full value tree. Each value is kept as a
//! borrowed [`RawValue`] and classified by its first byte, which preserves
//! property order, repeated property names and the exact text of numbers.

use std::fmt::{self, Display, Formatter};

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::value::RawValue;

/// The kind of a JSON value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JsonKind {
    /// `{ ... }`
    Object,
    /// `[ ... ]`
    Array,
    /// `"..."`
    String,
    /// `-12.5e3`
    Number,
    /// `true`
    True,
    /// `false`
    False,
    /// `null`
    Null,
    /// Anything else a lenient parser might let through.
    Undefined,
}

impl JsonKind {
    /// Classifies a raw JSON value by its leading byte.
    #[must_use]
    pub fn of(raw: &RawValue) -> Self {
        match raw.get().trim_start().as_bytes().first() {
            Some(b'{') => Self::Object,
            Some(b'[') => Self::Array,
            Some(b'"') => Self::String,
            Some(b't') => Self::True,
            Some(b'f') => Self::False,
            Some(b'n') => Self::Null,
            Some(b'-' | b'0'..=b'9') => Self::Number,
            _ => Self::Undefined,
        }
    }

    /// Returns `true` for string, number, boolean and null.
    #[must_use]
    pub const fn is_scalar(self) -> bool {
        matches!(
            self,
            Self::String | Self::Number | Self::True | Self::False | Self::Null
        )
    }
}

impl Display for JsonKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "Object",
            Self::Array => "Array",
            Self::String => "String",
            Self::Number => "Number",
            Self::True => "True",
            Self::False => "False",
            Self::Null => "Null",
            Self::Undefined => "Undefined",
        };

        f.write_str(name)
    }
}

/// Properties of one JSON object, in document order, duplicates included.
pub(crate) struct ObjectEntries<'a>(pub Vec<(String, &'a RawValue)>);

impl<'de: 'a, 'a> Deserialize<'de> for ObjectEntries<'a> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<'a>(std::marker::PhantomData<&'a ()>);

        impl<'de: 'a, 'a> Visitor<'de> for EntriesVisitor<'a> {
            type Value = ObjectEntries<'a>;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));

                while let Some(name) = map.next_key::<String>()? {
                    let value: &'de RawValue = map.next_value()?;
                    entries.push((name, value));
                }

                Ok(ObjectEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(std::marker::PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(text: &str) -> JsonKind {
        let raw: &RawValue = serde_json::from_str(text).unwrap();
        JsonKind::of(raw)
    }

    #[test]
    fn test_classify() {
        assert_eq!(kind("{}"), JsonKind::Object);
        assert_eq!(kind(" [1]"), JsonKind::Array);
        assert_eq!(kind("\"x\""), JsonKind::String);
        assert_eq!(kind("-1.5"), JsonKind::Number);
        assert_eq!(kind("0"), JsonKind::Number);
        assert_eq!(kind("true"), JsonKind::True);
        assert_eq!(kind("false"), JsonKind::False);
        assert_eq!(kind("null"), JsonKind::Null);
    }

    #[test]
    fn test_object_entries_keep_order_and_duplicates() {
        let text = r#"{"b": 1, "a": {"x": 2}, "b": 3}"#;
        let ObjectEntries(entries) = serde_json::from_str(text).unwrap();

        let names: Vec<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "b"]);
        assert_eq!(entries[1].1.get(), r#"{"x": 2}"#);
        assert_eq!(entries[2].1.get(), "3");
    }

    #[test]
    fn test_object_entries_unescape_names() {
        let text = r#"{"a\u0042": 1}"#;
        let ObjectEntries(entries) = serde_json::from_str(text).unwrap();
        assert_eq!(entries[0].0, "aB");
    }
}
