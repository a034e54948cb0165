use std::collections::HashSet;

use async_trait::async_trait;
use veil_types::{ObjectComparison, ObjectId, RootId};

use crate::error::StoreResult;
use crate::object::{
    BlobMetadataResult, BlobResult, RootTreeResult, TreeEntry, TreeEntryType, TreeResult,
};

/// Source of trees and blobs for a virtual checkout.
///
/// All implementations must satisfy these invariants:
/// - Ids are opaque to callers. Only the store that minted an id may decode it.
/// - Fetching by an id returns an object that reports that same id.
/// - Concurrent calls are always safe.
/// - Errors are propagated, never silently ignored.
///
/// Stores are meant to be stacked: a decorator holds an inner
/// `Arc<dyn BackingStore>` and implements this trait itself.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Fetch the root tree of a checkout state.
    async fn get_root_tree(&self, root: &RootId) -> StoreResult<RootTreeResult>;

    /// Fetch a tree by id.
    async fn get_tree(&self, id: &ObjectId) -> StoreResult<TreeResult>;

    /// Build a tree entry for a bare object id of a known type.
    async fn get_tree_entry_for_object_id(
        &self,
        id: &ObjectId,
        entry_type: TreeEntryType,
    ) -> StoreResult<TreeEntry>;

    /// Fetch a blob by id.
    async fn get_blob(&self, id: &ObjectId) -> StoreResult<BlobResult>;

    /// Fetch the size and content hash of a blob.
    async fn get_blob_metadata(&self, id: &ObjectId) -> StoreResult<BlobMetadataResult>;

    /// Warm caches for blobs that are about to be read.
    async fn prefetch_blobs(&self, ids: &[ObjectId]) -> StoreResult<()>;

    /// Import the manifest backing `root` ahead of checkout.
    async fn import_manifest_for_root(&self, root: &RootId, manifest: &ObjectId)
        -> StoreResult<()>;

    /// Compare two ids without fetching the objects.
    ///
    /// Returns [`ObjectComparison::Unknown`] when the answer needs a fetch.
    fn compare_objects_by_id(&self, one: &ObjectId, two: &ObjectId)
        -> StoreResult<ObjectComparison>;

    /// Parse a user-supplied root reference.
    fn parse_root_id(&self, rendered: &[u8]) -> StoreResult<RootId>;

    /// Render a root id so that [`BackingStore::parse_root_id`] restores it.
    fn render_root_id(&self, root: &RootId) -> StoreResult<Vec<u8>>;

    /// Parse the store's textual form of an object id.
    fn parse_object_id(&self, rendered: &str) -> StoreResult<ObjectId>;

    /// Render an object id in the store's textual form.
    fn render_object_id(&self, id: &ObjectId) -> String;

    /// Name of the repository this store serves, if it has one.
    fn repo_name(&self) -> Option<String> {
        None
    }

    /// Hook for periodic housekeeping (cache flushes, compaction, ...).
    fn periodic_management_task(&self) {}

    /// Begin recording the objects fetched from now on.
    fn start_recording_fetch(&self) {}

    /// Stop recording and return what was fetched since the last start.
    fn stop_recording_fetch(&self) -> HashSet<String> {
        HashSet::new()
    }
}
