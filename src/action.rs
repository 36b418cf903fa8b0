//! Action path definitions and validation.
//!
//! An action path identifies an invocable operation, written as a
//! slash-separated path such as `"controllers/AclActions"`. Paths form a
//! tree: a decision attached to `controllers` covers every action beneath it
//! unless a nearer decision overrides it.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A validated, slash-separated action path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionPath(String);

impl ActionPath {
    /// Parse and validate an action path.
    ///
    /// Rejects empty input, empty segments (leading, trailing, or doubled
    /// slashes), and NUL bytes.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidAction("path is empty".to_string()));
        }
        if trimmed.contains('\0') {
            return Err(Error::InvalidAction(format!(
                "path contains NUL byte: '{}'",
                trimmed.escape_default()
            )));
        }
        if trimmed.split('/').any(|segment| segment.trim().is_empty()) {
            return Err(Error::InvalidAction(format!(
                "path contains an empty segment: '{trimmed}'"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    /// Number of segments in the path.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// The parent node of this path, if any.
    pub fn parent(&self) -> Option<ActionPath> {
        self.0.rfind('/').map(|idx| ActionPath(self.0[..idx].to_string()))
    }

    /// The path itself followed by each ancestor up to the root segment.
    ///
    /// `a/b/c` yields `a/b/c`, `a/b`, `a`. This is the lookup order for
    /// nearest-decision resolution within a single subject.
    pub fn self_and_ancestors(&self) -> Vec<ActionPath> {
        let mut chain = vec![self.clone()];
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            chain.push(parent.clone());
            current = parent;
        }
        chain
    }

    /// Check whether `self` is an ancestor of (or equal to) `other`.
    pub fn covers(&self, other: &ActionPath) -> bool {
        self == other
            || (other.0.starts_with(&self.0) && other.0.as_bytes().get(self.0.len()) == Some(&b'/'))
    }
}

impl std::fmt::Display for ActionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ActionPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
