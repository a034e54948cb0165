use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use veil_filter::Filter;
use veil_store::{
    BackingStore, BlobMetadataResult, BlobResult, RootTreeResult, StoreError, StoreResult, Tree,
    TreeEntry, TreeEntryType, TreeResult,
};
use veil_types::{FilterId, ObjectComparison, ObjectId, RepoPath, RootId};

use crate::codec::{decode_root_bytes, encode_root_bytes, FilteredObjectId, FilteredRootId};
use crate::compare::compare_filtered_ids;
use crate::engine::filter_tree;

/// Backing store decorator that serves a sparse view of another store.
///
/// The filter travels inside the ids: a root id is the inner root plus a
/// filter id, and every tree id handed out carries its path and filter (see
/// [`crate::codec`]). Nothing is cached; every tree fetch re-filters the
/// inner tree, so the inner store never holds per-filter copies.
///
/// Both handles are shared and never change after construction, so one
/// instance can serve any number of concurrent fetches.
pub struct FilteredBackingStore {
    backing: Arc<dyn BackingStore>,
    filter: Arc<dyn Filter>,
}

impl FilteredBackingStore {
    pub fn new(backing: Arc<dyn BackingStore>, filter: Arc<dyn Filter>) -> Self {
        Self { backing, filter }
    }

    /// Root id that views `root` of the inner store through `filter`.
    pub fn filtered_root_id(root: &RootId, filter: &FilterId) -> RootId {
        FilteredRootId::new(root.clone(), filter.clone()).encode()
    }

    async fn filtered_tree(
        &self,
        id: ObjectId,
        unfiltered: &Tree,
        path: &RepoPath,
        filter_id: &FilterId,
    ) -> Tree {
        let entries = filter_tree(&self.filter, unfiltered, path, filter_id).await;
        Tree::new(id, entries).with_case_sensitivity(unfiltered.case_sensitivity())
    }
}

#[async_trait]
impl BackingStore for FilteredBackingStore {
    async fn get_root_tree(&self, root: &RootId) -> StoreResult<RootTreeResult> {
        let FilteredRootId { root: inner, filter } = FilteredRootId::decode(root)?;
        debug!(root = %inner, filter = %filter, "getting root tree");

        let result = self.backing.get_root_tree(&inner).await?;
        let path = RepoPath::root();
        let tree_id = FilteredObjectId::tree(path.clone(), filter.clone(), result.tree_id).encode();
        let tree = self
            .filtered_tree(tree_id.clone(), &result.tree, &path, &filter)
            .await;
        Ok(RootTreeResult {
            tree: Arc::new(tree),
            tree_id,
        })
    }

    async fn get_tree(&self, id: &ObjectId) -> StoreResult<TreeResult> {
        let (path, filter, object) = match FilteredObjectId::decode(id)? {
            FilteredObjectId::Tree {
                path,
                filter,
                object,
            } => (path, filter, object),
            FilteredObjectId::Blob { .. } => {
                return Err(StoreError::KindMismatch {
                    id: id.to_hex(),
                    expected: "tree",
                    actual: "blob",
                })
            }
        };
        debug!(path = %path, filter = %filter, object = %object.short_hex(), "getting tree");

        let result = self.backing.get_tree(&object).await?;
        let tree = self
            .filtered_tree(id.clone(), &result.tree, &path, &filter)
            .await;
        Ok(TreeResult {
            tree: Arc::new(tree),
            origin: result.origin,
        })
    }

    /// Checks the entry against the inner store under the unwrapped id, but
    /// returns the caller's filtered id. The entry must stay fetchable
    /// through this store; the inner id would bypass the filter.
    async fn get_tree_entry_for_object_id(
        &self,
        id: &ObjectId,
        entry_type: TreeEntryType,
    ) -> StoreResult<TreeEntry> {
        let object = FilteredObjectId::decode(id)?.into_object();
        let entry = self
            .backing
            .get_tree_entry_for_object_id(&object, entry_type)
            .await?;
        Ok(TreeEntry::new(id.clone(), entry.entry_type))
    }

    async fn get_blob(&self, id: &ObjectId) -> StoreResult<BlobResult> {
        let object = FilteredObjectId::decode(id)?.into_object();
        self.backing.get_blob(&object).await
    }

    async fn get_blob_metadata(&self, id: &ObjectId) -> StoreResult<BlobMetadataResult> {
        let object = FilteredObjectId::decode(id)?.into_object();
        self.backing.get_blob_metadata(&object).await
    }

    async fn prefetch_blobs(&self, ids: &[ObjectId]) -> StoreResult<()> {
        let unfiltered = ids
            .iter()
            .map(|id| FilteredObjectId::decode(id).map(FilteredObjectId::into_object))
            .collect::<StoreResult<Vec<_>>>()?;
        debug_assert_eq!(unfiltered.len(), ids.len());
        self.backing.prefetch_blobs(&unfiltered).await
    }

    async fn import_manifest_for_root(
        &self,
        root: &RootId,
        manifest: &ObjectId,
    ) -> StoreResult<()> {
        // Callers pass unfiltered manifests; only the root needs unwrapping.
        let FilteredRootId { root: inner, .. } = FilteredRootId::decode(root)?;
        self.backing.import_manifest_for_root(&inner, manifest).await
    }

    fn compare_objects_by_id(
        &self,
        one: &ObjectId,
        two: &ObjectId,
    ) -> StoreResult<ObjectComparison> {
        compare_filtered_ids(self.backing.as_ref(), self.filter.as_ref(), one, two)
    }

    fn parse_root_id(&self, rendered: &[u8]) -> StoreResult<RootId> {
        let (inner, filter) = decode_root_bytes(rendered)?;
        let parsed = self.backing.parse_root_id(inner)?;
        debug!(root = %parsed, filter = %String::from_utf8_lossy(filter), "parsed root id");
        Ok(RootId::new(encode_root_bytes(parsed.as_bytes(), filter)))
    }

    fn render_root_id(&self, root: &RootId) -> StoreResult<Vec<u8>> {
        let (inner, filter) = decode_root_bytes(root.as_bytes())?;
        let rendered = self.backing.render_root_id(&RootId::new(inner))?;
        Ok(encode_root_bytes(&rendered, filter))
    }

    // Textual object ids are the inner store's ids. Unlike root ids they are
    // not wrapped; filtered ids only come from tree fetches.
    fn parse_object_id(&self, rendered: &str) -> StoreResult<ObjectId> {
        self.backing.parse_object_id(rendered)
    }

    fn render_object_id(&self, id: &ObjectId) -> String {
        self.backing.render_object_id(id)
    }

    fn repo_name(&self) -> Option<String> {
        self.backing.repo_name()
    }

    fn periodic_management_task(&self) {
        self.backing.periodic_management_task();
    }

    fn start_recording_fetch(&self) {
        self.backing.start_recording_fetch();
    }

    fn stop_recording_fetch(&self) -> HashSet<String> {
        self.backing.stop_recording_fetch()
    }
}

impl std::fmt::Debug for FilteredBackingStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredBackingStore")
            .field("repo_name", &self.backing.repo_name())
            .finish_non_exhaustive()
    }
}
