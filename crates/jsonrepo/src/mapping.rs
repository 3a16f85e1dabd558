//! Ordered, case-insensitive flat key/value mapping.
//!
//! A [`FlatMapping`] is what the flattener produces and what a provider
//! publishes. Keys are compared with ordinal case folding: each character is
//! mapped through its simple uppercase form, without any locale rules, so
//! `Database:Port` and `database:port` name the same entry.

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

/// A single flattened configuration entry.
///
/// The value is `None` for JSON `null` and for empty objects or arrays, so
/// callers can tell "key present but empty" apart from "key absent".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatEntry {
    key: String,
    value: Option<String>,
}

impl FlatEntry {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, value: Option<String>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    /// The delimiter-joined path of this entry, with its original casing.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The textual value, or `None` for an absent value.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Returns `true` if the value is absent (null or empty container).
    #[must_use]
    pub const fn is_absent(&self) -> bool {
        self.value.is_none()
    }
}

impl Display for FlatEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={value}", self.key),

            None => write!(f, "{}=<absent>", self.key),
        }
    }
}

/// Error returned by [`FlatMapping::try_insert`] when the key already exists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyExists {
    /// The key that was being inserted.
    pub key: String,
}

/// Ordered mapping of flattened paths to optional string values.
///
/// Iteration yields entries in insertion order. Lookups ignore case.
///
/// # Example
///
/// ```rust
/// use jsonrepo::FlatMapping;
///
/// let mut mapping = FlatMapping::new();
/// mapping.try_insert("Server:Port", Some("8080".to_string())).unwrap();
///
/// assert_eq!(mapping.value("server:port"), Some("8080"));
/// assert!(mapping.try_insert("SERVER:PORT", None).is_err());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlatMapping {
    entries: Vec<FlatEntry>,
    /// Folded key → position in `entries`.
    index: HashMap<String, usize>,
}

impl FlatMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new entry, refusing keys that already exist in any casing.
    ///
    /// # Errors
    ///
    /// Returns [`KeyExists`] if a case-insensitively equal key is present.
    /// The mapping is left untouched in that case.
    pub fn try_insert(
        &mut self,
        key: impl Into<String>,
        value: Option<String>,
    ) -> Result<(), KeyExists> {
        let key = key.into();
        let folded = fold_case(&key);

        if self.index.contains_key(&folded) {
            return Err(KeyExists { key });
        }

        self.index.insert(folded, self.entries.len());
        self.entries.push(FlatEntry::new(key, value));

        Ok(())
    }

    /// Looks up an entry, ignoring case.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FlatEntry> {
        self.index
            .get(&fold_case(key))
            .and_then(|&position| self.entries.get(position))
    }

    /// Returns the value for `key`, or `None` if the key is missing or absent.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FlatEntry::value)
    }

    /// Returns `true` if the mapping contains `key` in any casing.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(&fold_case(key))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, FlatEntry> {
        self.entries.iter()
    }

    /// Iterates keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(FlatEntry::key)
    }
}

impl<'a> IntoIterator for &'a FlatMapping {
    type Item = &'a FlatEntry;
    type IntoIter = std::slice::Iter<'a, FlatEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for FlatMapping {
    type Item = FlatEntry;
    type IntoIter = std::vec::IntoIter<FlatEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Ordinal case folding: simple uppercase mapping per character.
///
/// Characters whose uppercase form expands to several characters (such as
/// `ß`) are kept as they are.
pub(crate) fn fold_case(key: &str) -> String {
    key.chars()
        .map(|c| {
            let mut upper = c.to_uppercase();
            match (upper.next(), upper.next()) {
                (Some(single), None) => single,
                _ => c,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup_ignore_case() {
        let mut mapping = FlatMapping::new();
        mapping
            .try_insert("Logging:Level", Some("debug".to_string()))
            .unwrap();

        assert_eq!(mapping.value("logging:level"), Some("debug"));
        assert_eq!(mapping.value("LOGGING:LEVEL"), Some("debug"));
        assert_eq!(mapping.get("logging:level").unwrap().key(), "Logging:Level");
    }

    #[test]
    fn test_duplicate_rejected_and_original_kept() {
        let mut mapping = FlatMapping::new();
        mapping.try_insert("a", Some("1".to_string())).unwrap();

        let err = mapping.try_insert("A", Some("2".to_string())).unwrap_err();
        assert_eq!(err.key, "A");
        assert_eq!(mapping.len(), 1);
        assert_eq!(mapping.value("a"), Some("1"));
    }

    #[test]
    fn test_absent_values() {
        let mut mapping = FlatMapping::new();
        mapping.try_insert("empty", None).unwrap();

        assert!(mapping.contains_key("EMPTY"));
        assert!(mapping.get("empty").unwrap().is_absent());
        assert_eq!(mapping.value("empty"), None);
        assert!(!mapping.contains_key("missing"));
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut mapping = FlatMapping::new();
        for key in ["z", "a", "m"] {
            mapping.try_insert(key, None).unwrap();
        }

        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_fold_case_is_not_locale_aware() {
        assert_eq!(fold_case("straße"), "STRAßE");
        assert_eq!(fold_case("ÄÖü"), "ÄÖÜ");
        assert_eq!(fold_case("a:0:b"), "A:0:B");
    }

    #[test]
    fn test_entry_display() {
        assert_eq!(FlatEntry::new("a", Some("1".into())).to_string(), "a=1");
        assert_eq!(FlatEntry::new("b", None).to_string(), "b=<absent>");
    }
}
