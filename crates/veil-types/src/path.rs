//! Repository-relative paths.
//!
//! A valid path:
//! - Is either empty (the repository root) or a `/`-separated list of components
//! - Has no leading or trailing `/` and no empty components (`//`)
//! - Has no `.` or `..` components
//! - Contains no NUL bytes

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Path of a file or directory relative to the repository root.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoPath(String);

impl RepoPath {
    /// The repository root (the empty path).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse and validate a path.
    pub fn new(path: impl Into<String>) -> Result<Self, TypeError> {
        let path = path.into();
        if path.is_empty() {
            return Ok(Self(path));
        }
        for component in path.split('/') {
            check_component(&path, component)?;
        }
        Ok(Self(path))
    }

    /// Returns `true` for the repository root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append a single path component.
    pub fn join(&self, name: &str) -> Result<Self, TypeError> {
        check_component(name, name)?;
        if self.is_root() {
            Ok(Self(name.to_string()))
        } else {
            Ok(Self(format!("{}/{}", self.0, name)))
        }
    }

    /// Iterate over the path components. The root has none.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Returns `true` if `prefix` equals this path or is one of its
    /// ancestors. Matching is per component: `a/b` is not a prefix of `a/bc`.
    pub fn starts_with(&self, prefix: &RepoPath) -> bool {
        if prefix.is_root() {
            return true;
        }
        match self.0.strip_prefix(prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

fn check_component(path: &str, component: &str) -> Result<(), TypeError> {
    let reason = if component.is_empty() {
        "empty path component"
    } else if component == "." || component == ".." {
        "relative components are not allowed"
    } else if component.contains('/') {
        "component contains '/'"
    } else if component.contains('\0') {
        "component contains NUL"
    } else {
        return Ok(());
    };
    Err(TypeError::InvalidPath {
        path: path.to_string(),
        reason: reason.into(),
    })
}

impl fmt::Debug for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepoPath({:?})", self.0)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for RepoPath {
    type Error = TypeError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}
