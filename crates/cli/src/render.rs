use artimine_discovery::{ArchiveTree, DirectoryNode, TreeNode};
use serde::Serialize;
use std::io::{self, Write};

const INDENT: &str = "  ";

/// Writes `tree` as an indented listing; directories carry a trailing `/`.
pub(crate) fn write_tree(tree: &ArchiveTree, out: &mut dyn Write) -> io::Result<()> {
    write_children(&tree.root, 0, out)?;
    writeln!(out, "({} files)", tree.file_count)
}

fn write_children(dir: &DirectoryNode, depth: usize, out: &mut dyn Write) -> io::Result<()> {
    for child in &dir.children {
        let pad = INDENT.repeat(depth);
        match child {
            TreeNode::Directory(d) => {
                writeln!(out, "{pad}{}/", d.name)?;
                write_children(d, depth + 1, out)?;
            }
            TreeNode::File(f) => writeln!(out, "{pad}{}", f.name)?,
        }
    }
    Ok(())
}

/// Pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(value: &T, out: &mut dyn Write) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use artimine_discovery::{build_tree, IgnorePatterns};

    #[test]
    fn tree_lists_directories_before_files() {
        let tree = build_tree(
            ["proj/z.txt", "proj/src/main.py", "proj/a.txt"],
            &IgnorePatterns::default(),
        );
        let mut buf = Vec::new();
        write_tree(&tree, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "proj/\n  src/\n    main.py\n  a.txt\n  z.txt\n(3 files)\n"
        );
    }
}
