//! Content-addressed fingerprints for records and traces.
//!
//! A snapshot's `hash` is SHA-256 over the canonical JSON of its section
//! content: object keys sorted, no insignificant whitespace. Two records with
//! the same hash carry the same section content, which is how no-op saves
//! are detected and how audit traces are stamped.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// A content-addressed SHA-256 fingerprint, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub String);

impl ContentHash {
    /// Hash raw bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{hash:x}"))
    }

    /// Hash the canonical JSON form of any serializable value.
    pub fn of_canonical<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        let canonical = canonical_json(value)?;
        Ok(Self::from_bytes(canonical.as_bytes()))
    }

    /// A builder for incrementally computing content hashes.
    pub fn builder() -> ContentHashBuilder {
        ContentHashBuilder {
            hasher: Sha256::new(),
        }
    }

    /// First 12 hex characters, for human-facing output.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Incremental content hash builder.
///
/// Feeds fields in a stable order to produce a deterministic hash.
pub struct ContentHashBuilder {
    hasher: Sha256,
}

impl ContentHashBuilder {
    /// Feed a string field into the hash.
    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.hasher.update(name.as_bytes());
        self.hasher.update(b":");
        self.hasher.update(value.len().to_string().as_bytes());
        self.hasher.update(b":");
        self.hasher.update(value.as_bytes());
        self.hasher.update(b"\n");
        self
    }

    /// Feed an integer field into the hash.
    pub fn field_int(self, name: &str, value: i64) -> Self {
        self.field(name, &value.to_string())
    }

    /// Feed an optional field (skipped if None).
    pub fn field_opt(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    /// Finalize and produce the content hash.
    pub fn finish(self) -> ContentHash {
        let hash = self.hasher.finalize();
        ContentHash(format!("{hash:x}"))
    }
}

/// Serialize `value` as canonical JSON.
///
/// `serde_json::Map` is a `BTreeMap` unless `preserve_order` is enabled, so
/// keys come out sorted and the compact `Display` form carries no whitespace.
pub fn canonical_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_json_sorts_keys() {
        let a = json!({"b": 1, "a": {"d": true, "c": null}});
        assert_eq!(
            canonical_json(&a).unwrap(),
            r#"{"a":{"c":null,"d":true},"b":1}"#
        );
    }

    #[test]
    fn builder_is_length_prefixed() {
        let left = ContentHash::builder().field("a", "b:c").finish();
        let right = ContentHash::builder().field("a", "b").field("", "c").finish();
        assert_ne!(left, right);
    }

    #[test]
    fn short_form_truncates() {
        let hash = ContentHash::from_bytes(b"ucr");
        assert_eq!(hash.short().len(), 12);
        assert!(hash.0.starts_with(hash.short()));
    }
}
