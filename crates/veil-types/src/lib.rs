//! Foundation types for Veil.
//!
//! Every other Veil crate depends on `veil-types`. The identifiers defined
//! here are opaque byte strings: the layers that produce them decide what
//! the bytes mean, and everything downstream treats them as keys.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Opaque identifier for a blob or tree
//! - [`RootId`] -- Opaque identifier for one checkout state
//! - [`FilterId`] -- Uninterpreted key naming a sparse filter
//! - [`RepoPath`] -- Slash-separated path relative to the repository root
//! - [`ObjectComparison`] -- Three-valued result of comparing two ids

pub mod comparison;
pub mod error;
pub mod object;
pub mod path;
pub mod root;

pub use comparison::ObjectComparison;
pub use error::TypeError;
pub use object::ObjectId;
pub use path::RepoPath;
pub use root::{FilterId, RootId};
