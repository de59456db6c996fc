use crate::{Error, IgnorePatterns, Result};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File};
use std::io::{self, Read, Seek};
use std::path::{Path, PathBuf};

/// A directory in an archive tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryNode {
    /// Last path segment; empty for the root.
    pub name: String,
    /// Full `/`-joined path from the archive root; empty for the root.
    pub path: String,
    /// Directories first, then files, each group sorted by name.
    pub children: Vec<TreeNode>,
}

/// A file leaf in an archive tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileNode {
    /// File name.
    pub name: String,
    /// Full `/`-joined path from the archive root.
    pub path: String,
}

/// Either kind of node in an archive tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    /// A directory with children.
    Directory(DirectoryNode),
    /// A file leaf.
    File(FileNode),
}

impl TreeNode {
    /// Node name regardless of kind.
    pub fn name(&self) -> &str {
        match self {
            TreeNode::Directory(d) => &d.name,
            TreeNode::File(f) => &f.name,
        }
    }

    /// Whether this node is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, TreeNode::Directory(_))
    }
}

impl DirectoryNode {
    /// Collects the paths of every file below this directory, depth first.
    pub fn file_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&DirectoryNode> = vec![self];
        while let Some(dir) = stack.pop() {
            for child in dir.children.iter().rev() {
                match child {
                    TreeNode::Directory(d) => stack.push(d),
                    TreeNode::File(f) => out.push(f.path.clone()),
                }
            }
        }
        out.sort();
        out
    }

    /// Looks up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name() == name)
    }

    fn sort_recursive(&mut self) {
        self.children.sort_by(|a, b| {
            b.is_dir()
                .cmp(&a.is_dir())
                .then_with(|| a.name().cmp(b.name()))
        });
        for child in &mut self.children {
            if let TreeNode::Directory(d) = child {
                d.sort_recursive();
            }
        }
    }
}

/// The tree built from an archive's entry names plus its file count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveTree {
    /// Root directory (`name == ""`, `path == ""`).
    pub root: DirectoryNode,
    /// Number of file leaves in the tree.
    pub file_count: usize,
}

/// Flat directory record used while inserting; converted to nodes at the end.
#[derive(Default)]
struct PendingDir {
    name: String,
    path: String,
    dirs: Vec<usize>,
    files: BTreeMap<String, String>,
}

/// Builder that memoizes directories by full path.
struct TreeBuilder {
    dirs: Vec<PendingDir>,
    by_path: HashMap<String, usize>,
}

impl TreeBuilder {
    fn new() -> Self {
        let mut by_path = HashMap::new();
        by_path.insert(String::new(), 0);
        Self {
            dirs: vec![PendingDir::default()],
            by_path,
        }
    }

    /// Returns the directory for `segments`, creating any missing ancestors.
    fn ensure_dir(&mut self, segments: &[&str]) -> usize {
        let mut current = 0;
        let mut path = String::new();
        for seg in segments {
            if !path.is_empty() {
                path.push('/');
            }
            path.push_str(seg);
            current = match self.by_path.get(&path) {
                Some(&idx) => idx,
                None => {
                    let idx = self.dirs.len();
                    self.dirs.push(PendingDir {
                        name: (*seg).to_string(),
                        path: path.clone(),
                        ..Default::default()
                    });
                    self.by_path.insert(path.clone(), idx);
                    let parent = &mut self.dirs[current];
                    // A prefix that was first seen as a file becomes a directory.
                    parent.files.remove(*seg);
                    parent.dirs.push(idx);
                    idx
                }
            };
        }
        current
    }

    fn insert(&mut self, raw: &str, is_dir_marker: bool, ignore: &IgnorePatterns) {
        let trimmed = raw.trim_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() || segments.iter().any(|s| ignore.contains(s)) {
            return;
        }
        if is_dir_marker {
            self.ensure_dir(&segments);
            return;
        }
        let (file_name, parents) = match segments.split_last() {
            Some(split) => split,
            None => return,
        };
        let full_path = segments.join("/");
        if self.by_path.contains_key(&full_path) {
            return;
        }
        let parent = self.ensure_dir(parents);
        self.dirs[parent]
            .files
            .insert((*file_name).to_string(), full_path);
    }

    fn finish(mut self) -> ArchiveTree {
        let mut file_count = 0;
        let mut root = self.materialize(0, &mut file_count);
        root.sort_recursive();
        ArchiveTree { root, file_count }
    }

    fn materialize(&mut self, idx: usize, file_count: &mut usize) -> DirectoryNode {
        let pending = std::mem::take(&mut self.dirs[idx]);
        let mut children = Vec::with_capacity(pending.dirs.len() + pending.files.len());
        for child in pending.dirs {
            children.push(TreeNode::Directory(self.materialize(child, file_count)));
        }
        for (name, path) in pending.files {
            *file_count += 1;
            children.push(TreeNode::File(FileNode { name, path }));
        }
        DirectoryNode {
            name: pending.name,
            path: pending.path,
            children,
        }
    }
}

/// Builds the archive tree from raw entry names.
///
/// Names ending in `/` are directory markers. Any entry with a segment in
/// `ignore` is dropped along with everything beneath it.
pub fn build_tree<I, S>(names: I, ignore: &IgnorePatterns) -> ArchiveTree
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = TreeBuilder::new();
    for name in names {
        let name = name.as_ref();
        builder.insert(name, name.ends_with('/'), ignore);
    }
    let tree = builder.finish();
    tracing::debug!(files = tree.file_count, "built archive tree");
    tree
}

fn invalid_zip(err: impl std::fmt::Display) -> Error {
    Error::InvalidZip {
        reason: err.to_string(),
    }
}

/// Lists the entry names of a ZIP archive on disk.
pub fn read_archive_names(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path).map_err(|e| invalid_zip(format!("{}: {e}", path.display())))?;
    read_archive_names_from_reader(file)
}

/// Lists the entry names of a ZIP archive from any seekable reader.
pub fn read_archive_names_from_reader<R: Read + Seek>(reader: R) -> Result<Vec<String>> {
    let archive = zip::ZipArchive::new(reader).map_err(invalid_zip)?;
    Ok(archive.file_names().map(str::to_string).collect())
}

/// Extracts every entry of the archive at `path` into `dest`.
///
/// Entries whose names would escape `dest` are skipped.
pub fn extract_archive(path: &Path, dest: &Path) -> Result<PathBuf> {
    let file = File::open(path).map_err(|e| invalid_zip(format!("{}: {e}", path.display())))?;
    let mut archive = zip::ZipArchive::new(file).map_err(invalid_zip)?;
    fs::create_dir_all(dest)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(invalid_zip)?;
        let Some(relative) = entry.enclosed_name() else {
            tracing::warn!(entry = entry.name(), "skipping archive entry outside destination");
            continue;
        };
        let target = dest.join(relative);
        if entry.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
    }

    tracing::debug!(entries = archive.len(), dest = %dest.display(), "extracted archive");
    Ok(dest.to_path_buf())
}
