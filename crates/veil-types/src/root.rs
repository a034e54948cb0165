use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identifier for one checkout state (a commit, a manifest, ...).
///
/// Like [`ObjectId`](crate::ObjectId), the bytes belong to whichever store
/// minted them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RootId(Vec<u8>);

impl RootId {
    /// Wrap raw root bytes without interpreting them.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw root bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the id and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RootId({})", self.to_hex())
    }
}

impl fmt::Display for RootId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<&str> for RootId {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

/// Name of a sparse filter.
///
/// The meaning of a filter id belongs to the filter implementation; to the
/// rest of the system it is a comparison key. The empty id is the null
/// filter.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterId(String);

impl FilterId {
    /// Create a filter id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The null filter id (empty string).
    pub fn null() -> Self {
        Self(String::new())
    }

    /// Returns `true` for the null filter id.
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FilterId({:?})", self.0)
    }
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FilterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FilterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
