//! Ingestion layer for uploaded project archives.
//!
//! This crate provides mechanisms for:
//! - Turning a flat list of archive entry names into a navigable tree.
//! - Reading and extracting ZIP archives.
//! - Walking an extracted directory while applying ignore patterns.
//!
//! # Examples
//!
//! ```
//! use artimine_discovery::{build_tree, IgnorePatterns};
//!
//! let names = ["proj/main.py", "proj/.git/config", "proj/tests/test_a.py"];
//! let tree = build_tree(names, &IgnorePatterns::default());
//! assert_eq!(tree.file_count, 2);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::path::PathBuf;
use thiserror::Error;

/// Archive reading, extraction, and tree construction.
pub mod archive;
/// Canonical ignore-pattern set shared by every traversal.
pub mod ignore;
/// Filesystem walker producing per-file metadata.
pub mod walker;

pub use archive::{
    build_tree, extract_archive, read_archive_names, read_archive_names_from_reader,
    ArchiveTree, DirectoryNode, FileNode, TreeNode,
};
pub use ignore::{IgnorePatterns, DEFAULT_IGNORE_PATTERNS};
pub use walker::{
    get_summary, relative_posix_path, DirectoryWalker, FileEntry, WalkResult, WalkSummary,
};

/// Errors raised by ingestion operations.
///
/// Only structural preconditions fail; unreadable individual files are
/// skipped during walks rather than reported here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The path handed to the walker does not exist or is not a directory.
    #[error("not a directory: {}", path.display())]
    InvalidDirectory {
        /// The offending path.
        path: PathBuf,
    },

    /// The input could not be opened as a ZIP archive.
    #[error("invalid zip archive: {reason}")]
    InvalidZip {
        /// Description from the archive reader.
        reason: String,
    },

    /// An I/O failure outside of per-file scanning.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;
