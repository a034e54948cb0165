//! Sparse filter capability for Veil.
//!
//! A filter answers one question: is this repository path hidden under
//! this filter id? The filtering store in `veil-filtered` asks it for every
//! entry of every tree it serves.
//!
//! - [`Filter`] -- the async predicate every filter backend implements
//! - [`StaticFilter`] -- rule-table backend configured from TOML ([`FilterConfig`])

pub mod config;
pub mod error;
pub mod rules;
pub mod traits;

pub use config::{FilterConfig, FilterRules};
pub use error::{FilterError, FilterResult};
pub use rules::StaticFilter;
pub use traits::Filter;
