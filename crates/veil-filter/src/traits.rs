use async_trait::async_trait;
use veil_types::{FilterId, RepoPath};

use crate::error::FilterResult;

/// Decides which paths a sparse filter hides.
///
/// Implementations own the meaning of a [`FilterId`]; callers treat it as
/// an opaque key. Evaluation may be slow (a profile may need fetching), so
/// it is asynchronous, and callers may poll the returned future once to
/// see whether the answer is already available.
#[async_trait]
pub trait Filter: Send + Sync {
    /// Returns `true` if `path` is excluded under `filter_id`.
    async fn is_path_filtered(&self, path: &RepoPath, filter_id: &FilterId) -> FilterResult<bool>;
}
