//! Filtering of a single fetched tree.
//!
//! Every entry's path is checked against the filter concurrently and the
//! results are joined once. A check that fails drops its entry: an entry we
//! cannot classify is never shown.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error};
use veil_filter::{Filter, FilterResult};
use veil_store::{Tree, TreeEntry};
use veil_types::{FilterId, RepoPath};

use crate::codec::FilteredObjectId;

/// Entries of `tree` (which lives at `base`) that `filter_id` does not
/// exclude, with ids rewritten into filtered form.
///
/// Tree entries become [`FilteredObjectId::Tree`] ids carrying the child path
/// and `filter_id`; every other entry becomes a [`FilteredObjectId::Blob`].
/// The backing store is never consulted.
pub async fn filter_tree(
    filter: &Arc<dyn Filter>,
    tree: &Tree,
    base: &RepoPath,
    filter_id: &FilterId,
) -> BTreeMap<String, TreeEntry> {
    let checks = tree.iter().map(|(name, entry)| {
        let filter = Arc::clone(filter);
        let filter_id = filter_id.clone();
        let child = base.join(name);
        let name = name.to_string();
        let entry = entry.clone();
        async move {
            let outcome: FilterResult<(RepoPath, bool)> = async {
                let path = child?;
                let filtered = filter.is_path_filtered(&path, &filter_id).await?;
                Ok((path, filtered))
            }
            .await;
            (name, entry, outcome)
        }
    });

    let mut entries = BTreeMap::new();
    let mut excluded = 0usize;
    let mut failed = 0usize;
    for (name, entry, outcome) in join_all(checks).await {
        let path = match outcome {
            Ok((_, true)) => {
                excluded += 1;
                continue;
            }
            Ok((path, false)) => path,
            Err(e) => {
                error!(
                    base = %base,
                    entry = %name,
                    filter = %filter_id,
                    error = %e,
                    "failed to determine if entry should be filtered; hiding it"
                );
                failed += 1;
                continue;
            }
        };
        let id = if entry.is_tree() {
            FilteredObjectId::tree(path, filter_id.clone(), entry.id)
        } else {
            FilteredObjectId::blob(entry.id)
        };
        entries.insert(name, TreeEntry::new(id.encode(), entry.entry_type));
    }

    debug!(
        base = %base,
        filter = %filter_id,
        kept = entries.len(),
        excluded,
        failed,
        "filtered tree"
    );
    entries
}
