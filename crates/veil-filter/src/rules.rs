use std::collections::HashMap;

use async_trait::async_trait;
use tracing::trace;
use veil_types::{FilterId, RepoPath};

use crate::config::{FilterConfig, FilterRules};
use crate::error::{FilterError, FilterResult};
use crate::traits::Filter;

/// Validated rules for one filter id.
#[derive(Clone, Debug, Default)]
struct CompiledRules {
    exclude: Vec<RepoPath>,
    include: Vec<RepoPath>,
}

impl CompiledRules {
    fn compile(rules: &FilterRules) -> FilterResult<Self> {
        let parse = |paths: &[String]| {
            paths
                .iter()
                .map(|p| RepoPath::new(p.as_str()))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self {
            exclude: parse(&rules.exclude)?,
            include: parse(&rules.include)?,
        })
    }

    fn is_filtered(&self, path: &RepoPath) -> bool {
        if !self.exclude.iter().any(|e| path.starts_with(e)) {
            return false;
        }
        // Inside an included subtree, or a directory on the way to one.
        !self
            .include
            .iter()
            .any(|i| path.starts_with(i) || i.starts_with(path))
    }
}

/// Filter backed by a fixed table of path rules.
///
/// A path is filtered when it equals or lies below an `exclude` rule,
/// unless an `include` rule equals it, lies above it, or lies below it.
/// The last case keeps directories visible that lead to an included
/// descendant. The null filter id never filters anything; any other id
/// without rules is an error.
#[derive(Clone, Debug, Default)]
pub struct StaticFilter {
    filters: HashMap<FilterId, CompiledRules>,
}

impl StaticFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the rules for `id`.
    pub fn with_rules(
        mut self,
        id: impl Into<FilterId>,
        rules: &FilterRules,
    ) -> FilterResult<Self> {
        let id = id.into();
        let compiled = CompiledRules::compile(rules)
            .map_err(|e| FilterError::Config(format!("filter {id:?}: {e}")))?;
        self.filters.insert(id, compiled);
        Ok(self)
    }

    /// Build a filter from every entry of a [`FilterConfig`].
    pub fn from_config(config: &FilterConfig) -> FilterResult<Self> {
        config
            .filters
            .iter()
            .try_fold(Self::new(), |filter, (id, rules)| filter.with_rules(id.as_str(), rules))
    }

    /// Number of registered filter ids.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Synchronous form of [`Filter::is_path_filtered`].
    pub fn check(&self, path: &RepoPath, filter_id: &FilterId) -> FilterResult<bool> {
        if filter_id.is_null() {
            return Ok(false);
        }
        let rules = self
            .filters
            .get(filter_id)
            .ok_or_else(|| FilterError::UnknownFilter(filter_id.clone()))?;
        let filtered = rules.is_filtered(path);
        trace!(path = %path, filter = %filter_id, filtered, "evaluated path");
        Ok(filtered)
    }
}

#[async_trait]
impl Filter for StaticFilter {
    async fn is_path_filtered(&self, path: &RepoPath, filter_id: &FilterId) -> FilterResult<bool> {
        self.check(path, filter_id)
    }
}
