//! Backing store capability for Veil.
//!
//! A backing store serves the trees and blobs of a repository by opaque
//! [`ObjectId`](veil_types::ObjectId), resolves checkout roots to root trees,
//! and compares ids without fetching. Every store, including the filtering
//! decorator in `veil-filtered`, implements the [`BackingStore`] trait so
//! they can be stacked.
//!
//! # Object Types
//!
//! - [`Blob`] -- file contents
//! - [`Tree`] -- name-ordered directory listing pointing at child objects
//!
//! # Backends
//!
//! - [`InMemoryBackingStore`] -- content-addressed `HashMap` store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written; ids never change meaning.
//! 2. Reads are always safe to run concurrently.
//! 3. Errors are propagated, never silently ignored.

pub mod error;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{BoxError, StoreError, StoreResult};
pub use memory::InMemoryBackingStore;
pub use object::{
    Blob, BlobMetadata, BlobMetadataResult, BlobResult, CaseSensitivity, FetchOrigin,
    RootTreeResult, Tree, TreeEntry, TreeEntryType, TreeResult,
};
pub use traits::BackingStore;
