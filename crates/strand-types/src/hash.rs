use std::fmt;

use serde::{Deserialize, Serialize};

/// Content-addressed identifier for an [`Object`](crate::Object).
///
/// Hashes computed locally are the hex-encoded BLAKE3 digest of an object's
/// canonical encoding, so identical content always produces the same
/// `ObjectHash`. Hashes supplied from outside (lookups, stream requests) are
/// kept verbatim: a value that no object hashes to simply matches nothing.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectHash(String);

impl ObjectHash {
    /// Wrap a hash string as received on the wire.
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    /// Hex-encode a raw 32-byte digest.
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// The textual hash.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the empty hash, which never identifies an object.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First 8 characters, for logs.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Debug for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectHash({})", self.short())
    }
}

impl fmt::Display for ObjectHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ObjectHash {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ObjectHash {
    fn from(s: String) -> Self {
        Self(s)
    }
}
