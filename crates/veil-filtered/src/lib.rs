//! Sparse views over a backing store.
//!
//! [`FilteredBackingStore`] wraps any [`BackingStore`](veil_store::BackingStore)
//! and hides the paths a [`Filter`](veil_filter::Filter) excludes. It
//! implements `BackingStore` itself, so the rest of the system cannot tell
//! it apart from an unfiltered store.
//!
//! No filtered data is ever stored. The filter rides along inside the ids
//! this crate hands out, and each tree is filtered again on every fetch:
//!
//! - [`codec`] -- wire formats of filtered root and object ids
//! - [`engine`] -- filtering one fetched tree, entries checked concurrently
//! - [`compare`] -- three-valued comparison of filtered ids
//! - [`store`] -- the decorator tying them together

pub mod codec;
pub mod compare;
pub mod engine;
pub mod store;
pub mod varint;

pub use codec::{FilteredObjectId, FilteredObjectKind, FilteredRootId};
pub use compare::compare_filtered_ids;
pub use engine::filter_tree;
pub use store::FilteredBackingStore;
pub use varint::VarintError;
