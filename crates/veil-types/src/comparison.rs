use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of comparing two object ids.
///
/// `Unknown` is a real answer, not an error: it means the ids could not be
/// proven equal or different without fetching and walking the objects.
/// Change-detection code must treat it as "possibly different".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectComparison {
    /// Both ids are known to name the same content.
    Identical,
    /// Both ids are known to name different content.
    Different,
    /// Equality could not be decided cheaply.
    Unknown,
}

impl ObjectComparison {
    /// Returns `true` only for [`ObjectComparison::Identical`].
    pub fn is_identical(self) -> bool {
        self == Self::Identical
    }
}

impl fmt::Display for ObjectComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identical => write!(f, "identical"),
            Self::Different => write!(f, "different"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_identical_is_identical() {
        assert!(ObjectComparison::Identical.is_identical());
        assert!(!ObjectComparison::Different.is_identical());
        assert!(!ObjectComparison::Unknown.is_identical());
    }

    #[test]
    fn display() {
        assert_eq!(ObjectComparison::Unknown.to_string(), "unknown");
    }
}
