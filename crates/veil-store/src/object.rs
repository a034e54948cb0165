use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use veil_types::ObjectId;

use crate::error::{StoreError, StoreResult};

const TREE_DOMAIN: &str = "veil-tree-v1";
const BLOB_DOMAIN: &str = "veil-blob-v1";

/// Domain-separated BLAKE3 hash, so a blob and a tree with identical bytes
/// never share an id.
fn domain_hash(domain: &str, data: &[u8]) -> ObjectId {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain.as_bytes());
    hasher.update(b":");
    hasher.update(data);
    ObjectId::from_hash(*hasher.finalize().as_bytes())
}

// ---------------------------------------------------------------------------
// Tree entries
// ---------------------------------------------------------------------------

/// Type of the object a tree entry points at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeEntryType {
    /// Normal file.
    RegularFile,
    /// File with the executable bit set.
    ExecutableFile,
    /// Symbolic link; the blob holds the target.
    Symlink,
    /// Subtree / directory.
    Tree,
}

impl TreeEntryType {
    /// Returns `true` for directory entries.
    pub fn is_tree(self) -> bool {
        self == Self::Tree
    }
}

impl std::fmt::Display for TreeEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RegularFile => write!(f, "file"),
            Self::ExecutableFile => write!(f, "executable"),
            Self::Symlink => write!(f, "symlink"),
            Self::Tree => write!(f, "tree"),
        }
    }
}

/// A single entry in a tree: the child's id and what kind of object it is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub id: ObjectId,
    pub entry_type: TreeEntryType,
}

impl TreeEntry {
    pub fn new(id: ObjectId, entry_type: TreeEntryType) -> Self {
        Self { id, entry_type }
    }

    pub fn is_tree(&self) -> bool {
        self.entry_type.is_tree()
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// Whether entry names in a tree compare case-sensitively.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseSensitivity {
    #[default]
    Sensitive,
    Insensitive,
}

/// Directory listing (analogous to a git tree).
///
/// Entries are keyed by name, so names are unique and iteration is in name
/// order. A tree carries the id it was fetched by; stores that rewrite ids
/// (such as the filtering store) build a new tree under the rewritten id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tree {
    id: ObjectId,
    entries: BTreeMap<String, TreeEntry>,
    case_sensitivity: CaseSensitivity,
}

impl Tree {
    /// Create a tree with an explicit id.
    pub fn new(id: ObjectId, entries: BTreeMap<String, TreeEntry>) -> Self {
        Self {
            id,
            entries,
            case_sensitivity: CaseSensitivity::default(),
        }
    }

    /// Create a tree whose id is the content hash of its entries.
    pub fn hashed(entries: BTreeMap<String, TreeEntry>) -> StoreResult<Self> {
        let id = Self::compute_id(&entries)?;
        Ok(Self::new(id, entries))
    }

    /// Content-addressed id for a set of entries.
    pub fn compute_id(entries: &BTreeMap<String, TreeEntry>) -> StoreResult<ObjectId> {
        let data =
            serde_json::to_vec(entries).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(domain_hash(TREE_DOMAIN, &data))
    }

    pub fn with_case_sensitivity(mut self, case_sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = case_sensitivity;
        self
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.get(name)
    }

    /// Iterate over `(name, entry)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TreeEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Entry names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> &BTreeMap<String, TreeEntry> {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// File contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    id: ObjectId,
    data: Bytes,
}

impl Blob {
    /// Create a blob whose id is the content hash of `data`.
    pub fn hashed(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        let id = domain_hash(BLOB_DOMAIN, &data);
        Self { id, data }
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Size and content hash of this blob.
    pub fn metadata(&self) -> BlobMetadata {
        BlobMetadata {
            size: self.data.len() as u64,
            content_hash: *blake3::hash(&self.data).as_bytes(),
        }
    }
}

/// Blob attributes that can be served without the blob contents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobMetadata {
    /// Size of the contents in bytes.
    pub size: u64,
    /// BLAKE3 hash of the raw contents (no domain separation).
    pub content_hash: [u8; 32],
}

// ---------------------------------------------------------------------------
// Fetch results
// ---------------------------------------------------------------------------

/// Where a fetched object came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FetchOrigin {
    #[default]
    NotFetched,
    MemoryCache,
    DiskCache,
    Network,
}

/// Root tree of a checkout plus the id it is known by.
#[derive(Clone, Debug)]
pub struct RootTreeResult {
    pub tree: Arc<Tree>,
    pub tree_id: ObjectId,
}

#[derive(Clone, Debug)]
pub struct TreeResult {
    pub tree: Arc<Tree>,
    pub origin: FetchOrigin,
}

#[derive(Clone, Debug)]
pub struct BlobResult {
    pub blob: Arc<Blob>,
    pub origin: FetchOrigin,
}

#[derive(Clone, Debug)]
pub struct BlobMetadataResult {
    pub metadata: BlobMetadata,
    pub origin: FetchOrigin,
}
