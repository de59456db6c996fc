use crate::{Error, IgnorePatterns, Result};
use pathdiff::diff_paths;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Path relative to the walked root, `/`-separated.
    pub relative_path: String,
    /// Location on disk.
    pub absolute_path: PathBuf,
    /// Basename.
    pub name: String,
    /// Size in bytes.
    pub size_bytes: u64,
}

/// Aggregate of a single walk.
#[derive(Debug, Clone, Serialize)]
pub struct WalkResult {
    /// Directory that was walked.
    pub root: PathBuf,
    /// Files in traversal order.
    pub files: Vec<FileEntry>,
    /// Sum of `files[..].size_bytes`.
    pub total_size_bytes: u64,
    /// Patterns that were applied.
    pub ignore_patterns: IgnorePatterns,
}

/// Totals projected from a [`WalkResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalkSummary {
    /// Number of files found.
    pub total_files: usize,
    /// Combined size of those files.
    pub total_size_bytes: u64,
}

/// Walks extracted project directories.
#[derive(Debug, Clone, Default)]
pub struct DirectoryWalker {
    default_ignore: IgnorePatterns,
}

impl DirectoryWalker {
    /// Creates a walker that falls back to `default_ignore` when a walk
    /// supplies no patterns of its own.
    pub fn new(default_ignore: IgnorePatterns) -> Self {
        Self { default_ignore }
    }

    /// Recursively collects every regular file under `directory`.
    ///
    /// Fails only if `directory` is missing or not a directory. Entries that
    /// cannot be read or stat'ed are skipped.
    pub fn walk(&self, directory: &Path, ignore: Option<&IgnorePatterns>) -> Result<WalkResult> {
        if !directory.is_dir() {
            return Err(Error::InvalidDirectory {
                path: directory.to_path_buf(),
            });
        }
        let ignore = ignore.unwrap_or(&self.default_ignore).clone();

        let mut files = Vec::new();
        let mut total_size_bytes = 0u64;

        let walker = WalkDir::new(directory)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| !ignore.contains(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(relative_path) = relative_posix_path(entry.path(), directory) else {
                continue;
            };
            if ignore.matches_path(&relative_path) {
                continue;
            }
            let size_bytes = match entry.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    tracing::debug!(error = %e, path = %entry.path().display(), "skipping file without metadata");
                    continue;
                }
            };

            total_size_bytes += size_bytes;
            files.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                absolute_path: entry.into_path(),
                relative_path,
                size_bytes,
            });
        }

        tracing::debug!(
            root = %directory.display(),
            files = files.len(),
            bytes = total_size_bytes,
            "walk complete"
        );

        Ok(WalkResult {
            root: directory.to_path_buf(),
            files,
            total_size_bytes,
            ignore_patterns: ignore,
        })
    }
}

/// Pure projection of a walk's totals.
pub fn get_summary(result: &WalkResult) -> WalkSummary {
    WalkSummary {
        total_files: result.files.len(),
        total_size_bytes: result.total_size_bytes,
    }
}

/// Returns `path` relative to `root` with `/` separators.
pub fn relative_posix_path(path: &Path, root: &Path) -> Option<String> {
    let rel = diff_paths(path, root)?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
