use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque identifier for a stored object.
///
/// Backing stores mint `ObjectId`s however they like: a plain content hash,
/// a hash plus a path, or a wrapper that embeds extra context (the filtered
/// store does exactly this). Consumers compare and hash the bytes but never
/// interpret them.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(Vec<u8>);

impl ObjectId {
    /// Wrap raw identifier bytes without interpreting them.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Compute a content-addressed `ObjectId` (BLAKE3) from raw data.
    pub fn digest(data: &[u8]) -> Self {
        Self::from_hash(*blake3::hash(data).as_bytes())
    }

    /// Create an `ObjectId` from a pre-computed 32-byte hash.
    pub fn from_hash(hash: [u8; 32]) -> Self {
        Self(hash.to_vec())
    }

    /// The raw identifier bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the id and return its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Length of the identifier in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the identifier has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Short hex representation (at most 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..self.0.len().min(4)])
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.short_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<[u8; 32]> for ObjectId {
    fn from(hash: [u8; 32]) -> Self {
        Self::from_hash(hash)
    }
}

impl From<Vec<u8>> for ObjectId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn digest_is_deterministic() {
        let data = b"hello world";
        assert_eq!(ObjectId::digest(data), ObjectId::digest(data));
        assert_eq!(ObjectId::digest(data).len(), 32);
    }

    #[test]
    fn different_data_produces_different_ids() {
        assert_ne!(ObjectId::digest(b"hello"), ObjectId::digest(b"world"));
    }

    #[test]
    fn from_bytes_is_opaque() {
        let id = ObjectId::from_bytes(b"anything at all".to_vec());
        assert_eq!(id.as_bytes(), b"anything at all");
        assert_eq!(id.clone().into_bytes(), b"anything at all".to_vec());
    }

    #[test]
    fn hex_roundtrip() {
        let id = ObjectId::digest(b"test");
        let parsed = ObjectId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn from_hex_rejects_garbage() {
        let err = ObjectId::from_hex("not-hex").unwrap_err();
        assert!(matches!(err, TypeError::InvalidHex(_)));
    }

    #[test]
    fn short_hex_handles_short_ids() {
        assert_eq!(ObjectId::digest(b"test").short_hex().len(), 8);
        assert_eq!(ObjectId::from_bytes(vec![0xab]).short_hex(), "ab");
        assert_eq!(ObjectId::from_bytes(Vec::new()).short_hex(), "");
    }

    #[test]
    fn display_is_full_hex() {
        let id = ObjectId::digest(b"test");
        assert_eq!(format!("{id}"), id.to_hex());
        assert_eq!(format!("{id}").len(), 64);
    }

    #[test]
    fn serde_roundtrip() {
        let id = ObjectId::digest(b"serde test");
        let json = serde_json::to_string(&id).unwrap();
        let parsed: ObjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, parsed);
    }

    proptest! {
        #[test]
        fn hex_roundtrip_any_bytes(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let id = ObjectId::from_bytes(bytes);
            prop_assert_eq!(ObjectId::from_hex(&id.to_hex()).unwrap(), id);
        }
    }
}
