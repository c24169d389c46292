//! The validated `_id` newtype and monotonic id generation.

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

static MONOTONIC_COUNTER: AtomicU16 = AtomicU16::new(0);

/// A validated document identifier.
///
/// Segments separated by `/` form directories on disk. An id is either
/// supplied by the caller (validated non-empty, no leading/trailing/doubled
/// slashes) or generated: a lexicographically sortable, 26-character
/// monotonic identifier, optionally prefixed.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocId(String);

/// Error returned when a candidate `_id` fails validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocIdError {
    /// The rejected value.
    pub value: String,
    /// Why it was rejected.
    pub reason: String,
}

impl fmt::Display for DocIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid document id {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for DocIdError {}

impl DocId {
    /// Validate and wrap a caller-supplied id.
    ///
    /// # Errors
    /// Returns [`DocIdError`] if the id is empty or contains an empty
    /// path segment (leading/trailing/doubled `/`).
    pub fn new(id: impl Into<String>) -> Result<Self, DocIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DocIdError {
                value: id,
                reason: "id must not be empty".to_owned(),
            });
        }
        if id.starts_with('/') || id.ends_with('/') || id.contains("//") {
            return Err(DocIdError {
                value: id,
                reason: "id must not have empty path segments".to_owned(),
            });
        }
        Ok(Self(id))
    }

    /// Generate a fresh, lexicographically sortable 26-character monotonic
    /// id, optionally prefixed with `prefix` + `/`.
    #[must_use]
    pub fn generate(prefix: Option<&str>) -> Self {
        let suffix = generate_monotonic_suffix();
        let id = match prefix {
            Some(p) if !p.is_empty() => format!("{p}/{suffix}"),
            _ => suffix,
        };
        Self(id)
    }

    /// Borrow the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split into `/`-separated path segments.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        self.0.split('/').collect()
    }
}

fn generate_monotonic_suffix() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    let counter = MONOTONIC_COUNTER.fetch_add(1, Ordering::Relaxed);

    // 48 bits of time + 16 bits of counter + 16 random-ish bits (from the low
    // bits of the nanosecond clock), encoded as 26 Crockford base32 chars,
    // matching a ULID's 10+16 character split.
    let nanos_jitter = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0) as u16;

    let mut bytes = [0u8; 16];
    bytes[0..6].copy_from_slice(&(millis as u64).to_be_bytes()[2..8]);
    bytes[6..8].copy_from_slice(&counter.to_be_bytes());
    bytes[8..10].copy_from_slice(&nanos_jitter.to_be_bytes());
    // Remaining bytes stay zero; uniqueness is carried by time + counter.

    encode_crockford(&bytes)
}

fn encode_crockford(bytes: &[u8; 16]) -> String {
    let mut value: u128 = 0;
    for b in bytes {
        value = (value << 8) | u128::from(*b);
    }
    let mut out = vec![0u8; 26];
    for slot in out.iter_mut().rev() {
        *slot = CROCKFORD_ALPHABET[(value & 0x1f) as usize];
        value >>= 5;
    }
    String::from_utf8(out).expect("crockford alphabet is ASCII")
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for DocId {
    type Err = DocIdError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DocId {
    type Error = DocIdError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DocId> for String {
    fn from(value: DocId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty() {
        assert!(DocId::new("").is_err());
    }

    #[test]
    fn rejects_leading_slash() {
        assert!(DocId::new("/foo").is_err());
    }

    #[test]
    fn rejects_trailing_slash() {
        assert!(DocId::new("foo/").is_err());
    }

    #[test]
    fn rejects_double_slash() {
        assert!(DocId::new("foo//bar").is_err());
    }

    #[test]
    fn accepts_segmented_id() {
        let id = DocId::new("notes/2024/ideas").unwrap();
        assert_eq!(id.segments(), vec!["notes", "2024", "ideas"]);
    }

    #[test]
    fn generated_id_is_26_chars() {
        let id = DocId::generate(None);
        assert_eq!(id.as_str().len(), 26);
    }

    #[test]
    fn generated_ids_are_monotonic_non_decreasing() {
        let a = DocId::generate(None);
        let b = DocId::generate(None);
        assert!(a.as_str() <= b.as_str());
    }

    #[test]
    fn generated_id_respects_prefix() {
        let id = DocId::generate(Some("notes"));
        assert!(id.as_str().starts_with("notes/"));
        assert_eq!(id.as_str().len(), "notes/".len() + 26);
    }

    #[test]
    fn serde_roundtrip() {
        let id = DocId::new("a/b").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"a/b\"");
        let back: DocId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
