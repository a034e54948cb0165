use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};

/// Filter definitions keyed by filter id.
///
/// ```toml
/// [filters."sparse/base"]
/// exclude = ["inc/exc"]
///
/// [filters."sparse/wide"]
/// exclude = ["inc/exc"]
/// include = ["inc/exc/incfile.txt"]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub filters: BTreeMap<String, FilterRules>,
}

/// Path rules for one filter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRules {
    /// Paths hidden together with everything below them.
    #[serde(default)]
    pub exclude: Vec<String>,
    /// Paths kept visible even when an `exclude` rule covers them.
    #[serde(default)]
    pub include: Vec<String>,
}

impl FilterRules {
    pub fn excluding<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            exclude: paths.into_iter().map(Into::into).collect(),
            include: Vec::new(),
        }
    }

    pub fn including<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(paths.into_iter().map(Into::into));
        self
    }
}

impl FilterConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> FilterResult<Self> {
        toml::from_str(s).map_err(|e| FilterError::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> FilterResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Serialize back to TOML.
    pub fn to_toml_string(&self) -> FilterResult<String> {
        toml::to_string(self).map_err(|e| FilterError::Config(e.to_string()))
    }
}
