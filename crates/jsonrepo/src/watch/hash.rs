//! Content fingerprints for change detection.

use std::fmt::{self, Display, Formatter};

use sha2::{Digest, Sha256};

/// SHA-256 digest of a fetched document's UTF-8 bytes.
///
/// Two fetches are considered the same document exactly when their digests
/// are equal. Displays as uppercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hashes `text`.
    #[must_use]
    pub fn of(text: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        Self(hasher.finalize().into())
    }

    /// The raw digest bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode_upper(self.0))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            ContentHash::of("").to_string(),
            "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
        );
        assert_eq!(
            ContentHash::of("abc").to_string(),
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
    }

    #[test]
    fn test_one_byte_difference() {
        assert_ne!(ContentHash::of(r#"{"a":1}"#), ContentHash::of(r#"{"a":2}"#));
        assert_eq!(ContentHash::of(r#"{"a":1}"#), ContentHash::of(r#"{"a":1}"#));
    }
}
