use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Directory and file names excluded from every traversal.
///
/// Matching is by exact path segment, never by glob.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "__pycache__",
    "__MACOSX",
    ".venv",
    "venv",
    ".tox",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    ".cache",
    "dist",
    "build",
    "target",
    ".next",
    ".nuxt",
    "coverage",
    ".nyc_output",
    "vendor",
    ".DS_Store",
];

/// A set of exact path-segment strings that exclude any entry containing them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IgnorePatterns {
    segments: BTreeSet<String>,
}

impl Default for IgnorePatterns {
    fn default() -> Self {
        DEFAULT_IGNORE_PATTERNS.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for IgnorePatterns {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter
                .into_iter()
                .map(Into::<String>::into)
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl IgnorePatterns {
    /// An empty set: nothing is ignored.
    pub fn none() -> Self {
        Self {
            segments: BTreeSet::new(),
        }
    }

    /// Returns true if `segment` is exactly one of the patterns.
    pub fn contains(&self, segment: &str) -> bool {
        self.segments.contains(segment)
    }

    /// Returns true if any `/`-separated segment of `path` is ignored.
    pub fn matches_path(&self, path: &str) -> bool {
        path.split('/').any(|seg| self.contains(seg))
    }

    /// Adds further patterns to the set.
    pub fn extend<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments
            .extend(extra.into_iter().map(Into::<String>::into).filter(|s| !s.is_empty()));
    }

    /// Iterates the patterns in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}
