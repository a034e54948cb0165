use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use veil_types::{ObjectComparison, ObjectId, RepoPath, RootId};

use crate::error::{StoreError, StoreResult};
use crate::object::{
    Blob, BlobMetadataResult, BlobResult, CaseSensitivity, FetchOrigin, RootTreeResult, Tree,
    TreeEntry, TreeEntryType, TreeResult,
};
use crate::traits::BackingStore;

/// In-memory, content-addressed backing store.
///
/// Intended for tests and embedding. Trees and blobs are held behind
/// `RwLock`s and handed out as `Arc`s. Tree and blob ids are BLAKE3 hashes
/// of their content, so two different ids always mean different content.
pub struct InMemoryBackingStore {
    trees: RwLock<HashMap<ObjectId, Arc<Tree>>>,
    blobs: RwLock<HashMap<ObjectId, Arc<Blob>>>,
    roots: RwLock<HashMap<RootId, ObjectId>>,
    repo_name: Option<String>,
    case_sensitivity: CaseSensitivity,
    recording: Mutex<Option<HashSet<String>>>,
    management_runs: AtomicU64,
    imported_manifests: Mutex<Vec<(RootId, ObjectId)>>,
    prefetched: Mutex<Vec<ObjectId>>,
}

/// Directory skeleton used while building a hierarchy from file paths.
enum Node {
    File(ObjectId),
    Dir(BTreeMap<String, Node>),
}

impl InMemoryBackingStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            trees: RwLock::new(HashMap::new()),
            blobs: RwLock::new(HashMap::new()),
            roots: RwLock::new(HashMap::new()),
            repo_name: None,
            case_sensitivity: CaseSensitivity::default(),
            recording: Mutex::new(None),
            management_runs: AtomicU64::new(0),
            imported_manifests: Mutex::new(Vec::new()),
            prefetched: Mutex::new(Vec::new()),
        }
    }

    pub fn with_repo_name(mut self, name: impl Into<String>) -> Self {
        self.repo_name = Some(name.into());
        self
    }

    /// Case sensitivity stamped on every tree this store serves.
    pub fn with_case_sensitivity(mut self, case_sensitivity: CaseSensitivity) -> Self {
        self.case_sensitivity = case_sensitivity;
        self
    }

    /// Store file contents and return the blob id.
    pub fn put_blob(&self, data: impl Into<Bytes>) -> ObjectId {
        let blob = Blob::hashed(data);
        let id = blob.id().clone();
        let mut map = self.blobs.write().expect("lock poisoned");
        map.entry(id.clone()).or_insert_with(|| Arc::new(blob));
        id
    }

    /// Store a tree and return its id.
    pub fn put_tree(&self, entries: BTreeMap<String, TreeEntry>) -> StoreResult<ObjectId> {
        let tree = Tree::hashed(entries)?.with_case_sensitivity(self.case_sensitivity);
        let id = tree.id().clone();
        let mut map = self.trees.write().expect("lock poisoned");
        map.entry(id.clone()).or_insert_with(|| Arc::new(tree));
        Ok(id)
    }

    /// Point `root` at an existing tree.
    pub fn set_root(&self, root: RootId, tree_id: ObjectId) {
        self.roots
            .write()
            .expect("lock poisoned")
            .insert(root, tree_id);
    }

    /// Build a full hierarchy from `(path, contents)` pairs, register it
    /// under `root`, and return the root tree id.
    pub fn commit_files(&self, root: RootId, files: &[(&str, &[u8])]) -> StoreResult<ObjectId> {
        let mut top = BTreeMap::new();
        for (path, contents) in files {
            let path = RepoPath::new(*path)?;
            let blob_id = self.put_blob(Bytes::copy_from_slice(contents));
            insert_file(&mut top, &path, blob_id)?;
        }
        let tree_id = self.write_dir(top)?;
        debug!(root = %root, tree = %tree_id.short_hex(), files = files.len(), "committed files");
        self.set_root(root, tree_id.clone());
        Ok(tree_id)
    }

    fn write_dir(&self, dir: BTreeMap<String, Node>) -> StoreResult<ObjectId> {
        let mut entries = BTreeMap::new();
        for (name, node) in dir {
            let entry = match node {
                Node::File(id) => TreeEntry::new(id, TreeEntryType::RegularFile),
                Node::Dir(children) => {
                    TreeEntry::new(self.write_dir(children)?, TreeEntryType::Tree)
                }
            };
            entries.insert(name, entry);
        }
        self.put_tree(entries)
    }

    /// Number of trees currently stored.
    pub fn tree_count(&self) -> usize {
        self.trees.read().expect("lock poisoned").len()
    }

    /// Number of blobs currently stored.
    pub fn blob_count(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// How many times [`BackingStore::periodic_management_task`] ran.
    pub fn management_runs(&self) -> u64 {
        self.management_runs.load(Ordering::Relaxed)
    }

    /// Every `(root, manifest)` pair passed to `import_manifest_for_root`.
    pub fn imported_manifests(&self) -> Vec<(RootId, ObjectId)> {
        self.imported_manifests.lock().expect("lock poisoned").clone()
    }

    /// Every id passed to `prefetch_blobs`, in call order.
    pub fn prefetched(&self) -> Vec<ObjectId> {
        self.prefetched.lock().expect("lock poisoned").clone()
    }

    fn record_fetch(&self, id: &ObjectId) {
        if let Some(fetched) = self.recording.lock().expect("lock poisoned").as_mut() {
            fetched.insert(id.to_hex());
        }
    }

    fn lookup_tree(&self, id: &ObjectId) -> StoreResult<Arc<Tree>> {
        if let Some(tree) = self.trees.read().expect("lock poisoned").get(id) {
            return Ok(Arc::clone(tree));
        }
        if self.blobs.read().expect("lock poisoned").contains_key(id) {
            return Err(StoreError::KindMismatch {
                id: id.to_hex(),
                expected: "tree",
                actual: "blob",
            });
        }
        Err(StoreError::NotFound {
            kind: "tree",
            id: id.to_hex(),
        })
    }

    fn lookup_blob(&self, id: &ObjectId) -> StoreResult<Arc<Blob>> {
        if let Some(blob) = self.blobs.read().expect("lock poisoned").get(id) {
            return Ok(Arc::clone(blob));
        }
        if self.trees.read().expect("lock poisoned").contains_key(id) {
            return Err(StoreError::KindMismatch {
                id: id.to_hex(),
                expected: "blob",
                actual: "tree",
            });
        }
        Err(StoreError::NotFound {
            kind: "blob",
            id: id.to_hex(),
        })
    }
}

fn insert_file(
    dir: &mut BTreeMap<String, Node>,
    path: &RepoPath,
    blob: ObjectId,
) -> StoreResult<()> {
    let components: Vec<&str> = path.components().collect();
    let Some((file_name, parents)) = components.split_last() else {
        return Err(StoreError::InvalidInput("cannot commit a file at the root path".into()));
    };
    let mut current = dir;
    for name in parents {
        let node = current
            .entry(name.to_string())
            .or_insert_with(|| Node::Dir(BTreeMap::new()));
        current = match node {
            Node::Dir(children) => children,
            Node::File(_) => {
                return Err(StoreError::InvalidInput(format!(
                    "{path}: parent {name} is a file"
                )))
            }
        };
    }
    if let Some(Node::Dir(_)) = current.get(*file_name) {
        return Err(StoreError::InvalidInput(format!("{path}: is a directory")));
    }
    current.insert(file_name.to_string(), Node::File(blob));
    Ok(())
}

impl Default for InMemoryBackingStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackingStore for InMemoryBackingStore {
    async fn get_root_tree(&self, root: &RootId) -> StoreResult<RootTreeResult> {
        let tree_id = self
            .roots
            .read()
            .expect("lock poisoned")
            .get(root)
            .cloned()
            .ok_or_else(|| StoreError::UnknownRoot(root.clone()))?;
        let tree = self.lookup_tree(&tree_id)?;
        self.record_fetch(&tree_id);
        Ok(RootTreeResult { tree, tree_id })
    }

    async fn get_tree(&self, id: &ObjectId) -> StoreResult<TreeResult> {
        let tree = self.lookup_tree(id)?;
        self.record_fetch(id);
        Ok(TreeResult {
            tree,
            origin: FetchOrigin::MemoryCache,
        })
    }

    async fn get_tree_entry_for_object_id(
        &self,
        id: &ObjectId,
        entry_type: TreeEntryType,
    ) -> StoreResult<TreeEntry> {
        if entry_type.is_tree() {
            self.lookup_tree(id)?;
        } else {
            self.lookup_blob(id)?;
        }
        Ok(TreeEntry::new(id.clone(), entry_type))
    }

    async fn get_blob(&self, id: &ObjectId) -> StoreResult<BlobResult> {
        let blob = self.lookup_blob(id)?;
        self.record_fetch(id);
        Ok(BlobResult {
            blob,
            origin: FetchOrigin::MemoryCache,
        })
    }

    async fn get_blob_metadata(&self, id: &ObjectId) -> StoreResult<BlobMetadataResult> {
        let blob = self.lookup_blob(id)?;
        self.record_fetch(id);
        Ok(BlobMetadataResult {
            metadata: blob.metadata(),
            origin: FetchOrigin::MemoryCache,
        })
    }

    async fn prefetch_blobs(&self, ids: &[ObjectId]) -> StoreResult<()> {
        self.prefetched
            .lock()
            .expect("lock poisoned")
            .extend_from_slice(ids);
        Ok(())
    }

    async fn import_manifest_for_root(
        &self,
        root: &RootId,
        manifest: &ObjectId,
    ) -> StoreResult<()> {
        self.imported_manifests
            .lock()
            .expect("lock poisoned")
            .push((root.clone(), manifest.clone()));
        Ok(())
    }

    fn compare_objects_by_id(
        &self,
        one: &ObjectId,
        two: &ObjectId,
    ) -> StoreResult<ObjectComparison> {
        // Content addressing: equal ids are equal content and vice versa.
        if one == two {
            Ok(ObjectComparison::Identical)
        } else {
            Ok(ObjectComparison::Different)
        }
    }

    fn parse_root_id(&self, rendered: &[u8]) -> StoreResult<RootId> {
        let bytes = hex::decode(rendered)
            .map_err(|e| StoreError::malformed("root", rendered, e.to_string()))?;
        Ok(RootId::new(bytes))
    }

    fn render_root_id(&self, root: &RootId) -> StoreResult<Vec<u8>> {
        Ok(root.to_hex().into_bytes())
    }

    fn parse_object_id(&self, rendered: &str) -> StoreResult<ObjectId> {
        Ok(ObjectId::from_hex(rendered)?)
    }

    fn render_object_id(&self, id: &ObjectId) -> String {
        id.to_hex()
    }

    fn repo_name(&self) -> Option<String> {
        self.repo_name.clone()
    }

    fn periodic_management_task(&self) {
        self.management_runs.fetch_add(1, Ordering::Relaxed);
    }

    fn start_recording_fetch(&self) {
        *self.recording.lock().expect("lock poisoned") = Some(HashSet::new());
    }

    fn stop_recording_fetch(&self) -> HashSet<String> {
        self.recording
            .lock()
            .expect("lock poisoned")
            .take()
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for InMemoryBackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBackingStore")
            .field("tree_count", &self.tree_count())
            .field("blob_count", &self.blob_count())
            .field("repo_name", &self.repo_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> (InMemoryBackingStore, ObjectId) {
        let store = InMemoryBackingStore::new();
        let root = store
            .commit_files(
                RootId::from("c1"),
                &[
                    ("file.txt", b"top"),
                    ("inc/file.txt", b"inc"),
                    ("inc/exc/incfile.txt", b"deep include"),
                    ("inc/exc/excfile.txt", b"deep exclude"),
                ],
            )
            .unwrap();
        (store, root)
    }

    // -----------------------------------------------------------------------
    // Building hierarchies
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn commit_files_builds_nested_trees() {
        let (store, root_tree) = sample_store();
        let root = store.get_root_tree(&RootId::from("c1")).await.unwrap();
        assert_eq!(root.tree_id, root_tree);
        assert_eq!(root.tree.id(), &root_tree);

        let names: Vec<_> = root.tree.names().collect();
        assert_eq!(names, vec!["file.txt", "inc"]);

        let inc = root.tree.get("inc").unwrap();
        assert!(inc.is_tree());
        let inc = store.get_tree(&inc.id).await.unwrap().tree;
        let exc = store.get_tree(&inc.get("exc").unwrap().id).await.unwrap().tree;
        assert_eq!(exc.len(), 2);
    }

    #[test]
    fn commit_files_rejects_file_directory_conflict() {
        let store = InMemoryBackingStore::new();
        let err = store
            .commit_files(RootId::from("c"), &[("a", b"x"), ("a/b", b"y")])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));

        let err = store
            .commit_files(RootId::from("c"), &[("a/b", b"y"), ("a", b"x")])
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidInput(_)));
    }

    #[test]
    fn commit_files_rejects_bad_paths() {
        let store = InMemoryBackingStore::new();
        let err = store
            .commit_files(RootId::from("c"), &[("a//b", b"x")])
            .unwrap_err();
        assert!(matches!(err, StoreError::Type(_)));
    }

    #[test]
    fn same_content_is_deduplicated() {
        let store = InMemoryBackingStore::new();
        let a = store.put_blob(&b"same"[..]);
        let b = store.put_blob(&b"same"[..]);
        assert_eq!(a, b);
        assert_eq!(store.blob_count(), 1);
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn unknown_root_is_an_error() {
        let store = InMemoryBackingStore::new();
        let err = store.get_root_tree(&RootId::from("nope")).await.unwrap_err();
        assert!(matches!(err, StoreError::UnknownRoot(_)));
    }

    #[tokio::test]
    async fn fetching_with_wrong_kind_fails() {
        let (store, root_tree) = sample_store();
        let err = store.get_blob(&root_tree).await.unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { expected: "blob", .. }));

        let blob = store.put_blob(&b"top"[..]);
        let err = store.get_tree(&blob).await.unwrap_err();
        assert!(matches!(err, StoreError::KindMismatch { expected: "tree", .. }));

        let err = store
            .get_blob(&ObjectId::digest(b"missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { kind: "blob", .. }));
    }

    #[tokio::test]
    async fn blob_and_metadata() {
        let store = InMemoryBackingStore::new();
        let id = store.put_blob(&b"hello"[..]);
        let blob = store.get_blob(&id).await.unwrap();
        assert_eq!(blob.blob.data().as_ref(), b"hello");
        assert_eq!(blob.origin, FetchOrigin::MemoryCache);

        let meta = store.get_blob_metadata(&id).await.unwrap();
        assert_eq!(meta.metadata.size, 5);
    }

    #[tokio::test]
    async fn tree_entry_for_object_id_checks_kind() {
        let (store, root_tree) = sample_store();
        let entry = store
            .get_tree_entry_for_object_id(&root_tree, TreeEntryType::Tree)
            .await
            .unwrap();
        assert_eq!(entry.id, root_tree);
        assert!(store
            .get_tree_entry_for_object_id(&root_tree, TreeEntryType::RegularFile)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn case_sensitivity_is_stamped_on_trees() {
        let store = InMemoryBackingStore::new().with_case_sensitivity(CaseSensitivity::Insensitive);
        store.commit_files(RootId::from("c"), &[("A", b"a")]).unwrap();
        let root = store.get_root_tree(&RootId::from("c")).await.unwrap();
        assert_eq!(root.tree.case_sensitivity(), CaseSensitivity::Insensitive);
    }

    // -----------------------------------------------------------------------
    // Comparison and id rendering
    // -----------------------------------------------------------------------

    #[test]
    fn compare_is_exact_for_content_hashes() {
        let store = InMemoryBackingStore::new();
        let a = store.put_blob(&b"a"[..]);
        let b = store.put_blob(&b"b"[..]);
        assert_eq!(store.compare_objects_by_id(&a, &a).unwrap(), ObjectComparison::Identical);
        assert_eq!(store.compare_objects_by_id(&a, &b).unwrap(), ObjectComparison::Different);
    }

    #[test]
    fn root_id_render_parse_roundtrip() {
        let store = InMemoryBackingStore::new();
        let root = RootId::new(vec![0xde, 0xad, 0x00, 0x01]);
        let rendered = store.render_root_id(&root).unwrap();
        assert_eq!(rendered, b"dead0001".to_vec());
        assert_eq!(store.parse_root_id(&rendered).unwrap(), root);
        assert!(matches!(
            store.parse_root_id(b"zz").unwrap_err(),
            StoreError::MalformedIdentifier { kind: "root", .. }
        ));
    }

    #[test]
    fn object_id_render_parse_roundtrip() {
        let store = InMemoryBackingStore::new();
        let id = ObjectId::digest(b"x");
        let rendered = store.render_object_id(&id);
        assert_eq!(store.parse_object_id(&rendered).unwrap(), id);
    }

    // -----------------------------------------------------------------------
    // Administrative hooks
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn fetch_recording() {
        let (store, root_tree) = sample_store();
        store.get_tree(&root_tree).await.unwrap();
        assert!(store.stop_recording_fetch().is_empty());

        store.start_recording_fetch();
        store.get_tree(&root_tree).await.unwrap();
        let fetched = store.stop_recording_fetch();
        assert_eq!(fetched.len(), 1);
        assert!(fetched.contains(&root_tree.to_hex()));
    }

    #[tokio::test]
    async fn admin_hooks_are_tracked() {
        let store = InMemoryBackingStore::new().with_repo_name("fbsource");
        assert_eq!(store.repo_name().as_deref(), Some("fbsource"));

        store.periodic_management_task();
        store.periodic_management_task();
        assert_eq!(store.management_runs(), 2);

        let manifest = ObjectId::digest(b"manifest");
        store
            .import_manifest_for_root(&RootId::from("c1"), &manifest)
            .await
            .unwrap();
        assert_eq!(store.imported_manifests(), vec![(RootId::from("c1"), manifest)]);

        let ids = vec![ObjectId::digest(b"a"), ObjectId::digest(b"b")];
        store.prefetch_blobs(&ids).await.unwrap();
        assert_eq!(store.prefetched(), ids);
    }

    #[test]
    fn debug_format() {
        let store = InMemoryBackingStore::new();
        store.put_blob(&b"x"[..]);
        let debug = format!("{store:?}");
        assert!(debug.contains("InMemoryBackingStore"));
        assert!(debug.contains("blob_count"));
    }
}
