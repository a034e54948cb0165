//! Filter-carrying root and object ids.
//!
//! Root ids:
//!
//! ```text
//! varint(len(root)) || root || filter
//! ```
//!
//! The filter id takes the rest of the buffer and may be empty.
//!
//! Object ids start with a kind tag:
//!
//! ```text
//! blob: 0x20 || object
//! tree: 0x10 || varint(len(path)) || path || varint(len(filter)) || filter || object
//! ```
//!
//! `object` is the unfiltered id from the backing store and takes the rest
//! of the buffer. Blob ids never carry a path or filter: filtering changes
//! which blobs are reachable, never their contents.

use std::fmt;

use tracing::trace;
use veil_store::{StoreError, StoreResult};
use veil_types::{FilterId, ObjectId, RepoPath, RootId};

use crate::varint::{decode_varint, encode_varint, MAX_VARINT_LEN};

const TREE_TAG: u8 = 0x10;
const BLOB_TAG: u8 = 0x20;

// ---------------------------------------------------------------------------
// Root ids
// ---------------------------------------------------------------------------

/// Frame `root` and `filter` into the root id wire format.
pub fn encode_root_bytes(root: &[u8], filter: &[u8]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN + root.len() + filter.len());
    encode_varint(&mut buf, root.len() as u64);
    buf.extend_from_slice(root);
    buf.extend_from_slice(filter);
    buf
}

/// Split a framed root id into `(root, filter)` without copying.
pub fn decode_root_bytes(bytes: &[u8]) -> StoreResult<(&[u8], &[u8])> {
    let (root, rest) = take_prefixed(bytes, bytes, "root")?;
    Ok((root, rest))
}

/// Root id of an unfiltered checkout state viewed through a filter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FilteredRootId {
    pub root: RootId,
    pub filter: FilterId,
}

impl FilteredRootId {
    pub fn new(root: RootId, filter: FilterId) -> Self {
        Self { root, filter }
    }

    pub fn encode(&self) -> RootId {
        let bytes = encode_root_bytes(self.root.as_bytes(), self.filter.as_bytes());
        trace!(
            root = %self.root,
            filter = %self.filter,
            encoded_len = bytes.len(),
            "encoded filtered root id"
        );
        RootId::new(bytes)
    }

    pub fn decode(id: &RootId) -> StoreResult<Self> {
        let bytes = id.as_bytes();
        let (root, filter) = decode_root_bytes(bytes)?;
        let filter = utf8(filter, bytes, "root", "filter id")?;
        trace!(root_len = root.len(), filter, "decoded filtered root id");
        Ok(Self {
            root: RootId::new(root),
            filter: FilterId::new(filter),
        })
    }
}

// ---------------------------------------------------------------------------
// Object ids
// ---------------------------------------------------------------------------

/// Kind of object a filtered id names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilteredObjectKind {
    Blob,
    Tree,
}

impl fmt::Display for FilteredObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// Decoded form of an object id minted by the filtering store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FilteredObjectId {
    /// A blob: only the unfiltered id.
    Blob { object: ObjectId },
    /// A tree: where it sits, which filter produced it, and the unfiltered
    /// tree it was derived from.
    Tree {
        path: RepoPath,
        filter: FilterId,
        object: ObjectId,
    },
}

impl FilteredObjectId {
    pub fn blob(object: ObjectId) -> Self {
        Self::Blob { object }
    }

    pub fn tree(path: RepoPath, filter: FilterId, object: ObjectId) -> Self {
        Self::Tree {
            path,
            filter,
            object,
        }
    }

    pub fn kind(&self) -> FilteredObjectKind {
        match self {
            Self::Blob { .. } => FilteredObjectKind::Blob,
            Self::Tree { .. } => FilteredObjectKind::Tree,
        }
    }

    /// The unfiltered id in the backing store.
    pub fn object(&self) -> &ObjectId {
        match self {
            Self::Blob { object } | Self::Tree { object, .. } => object,
        }
    }

    pub fn into_object(self) -> ObjectId {
        match self {
            Self::Blob { object } | Self::Tree { object, .. } => object,
        }
    }

    pub fn encode(&self) -> ObjectId {
        match self {
            Self::Blob { object } => {
                let mut buf = Vec::with_capacity(1 + object.len());
                buf.push(BLOB_TAG);
                buf.extend_from_slice(object.as_bytes());
                ObjectId::from_bytes(buf)
            }
            Self::Tree {
                path,
                filter,
                object,
            } => {
                let path = path.as_str().as_bytes();
                let filter = filter.as_bytes();
                let mut buf = Vec::with_capacity(
                    1 + 2 * MAX_VARINT_LEN + path.len() + filter.len() + object.len(),
                );
                buf.push(TREE_TAG);
                encode_varint(&mut buf, path.len() as u64);
                buf.extend_from_slice(path);
                encode_varint(&mut buf, filter.len() as u64);
                buf.extend_from_slice(filter);
                buf.extend_from_slice(object.as_bytes());
                ObjectId::from_bytes(buf)
            }
        }
    }

    pub fn decode(id: &ObjectId) -> StoreResult<Self> {
        let bytes = id.as_bytes();
        let Some((&tag, body)) = bytes.split_first() else {
            return Err(StoreError::malformed("object", bytes, "empty identifier"));
        };
        match tag {
            BLOB_TAG => Ok(Self::blob(ObjectId::from_bytes(body))),
            TREE_TAG => {
                let (path, rest) = take_prefixed(body, bytes, "object")?;
                let (filter, object) = take_prefixed(rest, bytes, "object")?;
                let path = utf8(path, bytes, "object", "path")?;
                let path = RepoPath::new(path)
                    .map_err(|e| StoreError::malformed("object", bytes, e.to_string()))?;
                let filter = utf8(filter, bytes, "object", "filter id")?;
                Ok(Self::tree(path, FilterId::new(filter), ObjectId::from_bytes(object)))
            }
            other => Err(StoreError::malformed(
                "object",
                bytes,
                format!("unknown kind tag {other:#04x}"),
            )),
        }
    }
}

/// Split `varint(n) || n bytes || rest` off the front of `data`. `whole` is
/// the full identifier, reported on failure.
fn take_prefixed<'a>(
    data: &'a [u8],
    whole: &[u8],
    kind: &'static str,
) -> StoreResult<(&'a [u8], &'a [u8])> {
    let (len, consumed) =
        decode_varint(data).map_err(|e| StoreError::malformed(kind, whole, e.to_string()))?;
    let rest = &data[consumed..];
    match usize::try_from(len) {
        Ok(len) if len <= rest.len() => Ok(rest.split_at(len)),
        _ => Err(StoreError::malformed(
            kind,
            whole,
            format!("length {len} exceeds remaining {} bytes", rest.len()),
        )),
    }
}

fn utf8<'a>(
    bytes: &'a [u8],
    whole: &[u8],
    kind: &'static str,
    what: &str,
) -> StoreResult<&'a str> {
    std::str::from_utf8(bytes)
        .map_err(|e| StoreError::malformed(kind, whole, format!("{what} is not UTF-8: {e}")))
}
