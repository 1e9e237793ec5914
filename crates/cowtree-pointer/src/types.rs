//! Type definitions for patch paths.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A step in a patch path.
///
/// Record and map keys are strings, sequence and set positions are indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

/// A path from the root value to the target of a patch.
pub type Path = Vec<PathSegment>;

impl PathSegment {
    /// Returns the position this segment addresses, if it is one.
    ///
    /// String segments that spell a canonical non-negative integer
    /// (`"0"`, `"12"`, but not `"012"` or `"+1"`) count as indices, since
    /// pointer-style paths lose the distinction.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Index(i) => Some(*i),
            PathSegment::Key(k) => {
                if crate::is_valid_index(k) {
                    k.parse().ok()
                } else {
                    None
                }
            }
        }
    }

    /// Returns the segment as a key string.
    pub fn to_key(&self) -> String {
        match self {
            PathSegment::Index(i) => i.to_string(),
            PathSegment::Key(k) => k.clone(),
        }
    }

    pub fn is_index(&self) -> bool {
        matches!(self, PathSegment::Index(_))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Index(i) => write!(f, "{i}"),
            PathSegment::Key(k) => f.write_str(k),
        }
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<&String> for PathSegment {
    fn from(key: &String) -> Self {
        PathSegment::Key(key.clone())
    }
}
