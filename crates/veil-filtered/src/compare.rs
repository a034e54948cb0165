//! Comparison of filtered object ids.
//!
//! Two ids under the same filter compare like their unfiltered objects. Ids
//! under different filters are harder: equal unfiltered trees can still
//! differ once filtered, because some descendant may be hidden by one filter
//! and not the other. The answer is conservative. `Identical` is returned
//! only when certain and `Unknown` whenever a proof would need more work.

use futures::future::{join, FutureExt};
use tracing::debug;
use veil_filter::{Filter, FilterError};
use veil_store::{BackingStore, StoreError, StoreResult};
use veil_types::{FilterId, ObjectComparison, ObjectId, RepoPath};

use crate::codec::FilteredObjectId;

/// Compare two ids minted by the filtering store.
///
/// Never blocks: when the filter cannot answer immediately the result is
/// [`ObjectComparison::Unknown`]. Comparing a blob id with a tree id is a
/// caller bug and fails with [`StoreError::InvalidComparison`] before either
/// capability is consulted.
pub fn compare_filtered_ids(
    backing: &dyn BackingStore,
    filter: &dyn Filter,
    one: &ObjectId,
    two: &ObjectId,
) -> StoreResult<ObjectComparison> {
    if one == two {
        return Ok(ObjectComparison::Identical);
    }

    let first = FilteredObjectId::decode(one)?;
    let second = FilteredObjectId::decode(two)?;
    if first.kind() != second.kind() {
        return Err(StoreError::InvalidComparison {
            one: first.kind().to_string(),
            two: second.kind().to_string(),
        });
    }

    match (&first, &second) {
        (
            FilteredObjectId::Tree {
                path: path_one,
                filter: filter_one,
                object: object_one,
            },
            FilteredObjectId::Tree {
                path: path_two,
                filter: filter_two,
                object: object_two,
            },
        ) if filter_one != filter_two => compare_across_filters(
            backing,
            filter,
            (path_one, filter_one, object_one),
            (path_two, filter_two, object_two),
        ),
        // Blobs are never rewritten by a filter, and a shared filter hides
        // the same descendants on both sides.
        _ => backing.compare_objects_by_id(first.object(), second.object()),
    }
}

fn compare_across_filters(
    backing: &dyn BackingStore,
    filter: &dyn Filter,
    (path_one, filter_one, object_one): (&RepoPath, &FilterId, &ObjectId),
    (path_two, filter_two, object_two): (&RepoPath, &FilterId, &ObjectId),
) -> StoreResult<ObjectComparison> {
    let checks = join(
        filter.is_path_filtered(path_one, filter_one),
        filter.is_path_filtered(path_two, filter_two),
    );
    let Some((hidden_one, hidden_two)) = checks.now_or_never() else {
        debug!(
            path_one = %path_one,
            path_two = %path_two,
            "visibility not immediately known; comparison unknown"
        );
        return Ok(ObjectComparison::Unknown);
    };
    let hidden_one = hidden_one.map_err(|e| visibility_failure("first", path_one, filter_one, e))?;
    let hidden_two = hidden_two.map_err(|e| visibility_failure("second", path_two, filter_two, e))?;

    if hidden_one != hidden_two {
        debug!(
            path_one = %path_one,
            path_two = %path_two,
            hidden_one,
            hidden_two,
            "filter change affects path"
        );
        return Ok(ObjectComparison::Different);
    }

    // Same visibility here says nothing about descendants, so equal
    // unfiltered trees only prove "unknown".
    match backing.compare_objects_by_id(object_one, object_two)? {
        ObjectComparison::Identical => Ok(ObjectComparison::Unknown),
        other => Ok(other),
    }
}

fn visibility_failure(
    side: &str,
    path: &RepoPath,
    filter: &FilterId,
    source: FilterError,
) -> StoreError {
    StoreError::ResolutionFailure {
        operation: "filter visibility check",
        subject: format!("{side} id (path {path:?}, filter {filter:?})"),
        source: Box::new(source),
    }
}
