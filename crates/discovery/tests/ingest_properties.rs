use artimine_discovery::{
    build_tree, extract_archive, get_summary, read_archive_names, DirectoryNode, DirectoryWalker,
    IgnorePatterns, TreeNode,
};
use artimine_test_utils::ProjectFixture;
use proptest::prelude::*;
use std::collections::BTreeSet;

fn assert_ordered(dir: &DirectoryNode) {
    let first_file = dir
        .children
        .iter()
        .position(|c| !c.is_dir())
        .unwrap_or(dir.children.len());
    assert!(
        dir.children[first_file..].iter().all(|c| !c.is_dir()),
        "directory after file in {:?}",
        dir.path
    );
    let dirs: Vec<&str> = dir.children[..first_file].iter().map(TreeNode::name).collect();
    let files: Vec<&str> = dir.children[first_file..].iter().map(TreeNode::name).collect();
    let mut sorted_dirs = dirs.clone();
    sorted_dirs.sort();
    let mut sorted_files = files.clone();
    sorted_files.sort();
    assert_eq!(dirs, sorted_dirs);
    assert_eq!(files, sorted_files);
    for child in &dir.children {
        if let TreeNode::Directory(d) = child {
            assert_ordered(d);
        }
    }
}

fn entry_name() -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "src", "Z", ".git", "x.py"]), 1..5)
        .prop_flat_map(|segs| {
            let joined = segs.join("/");
            prop::bool::ANY.prop_map(move |dir| {
                if dir {
                    format!("{joined}/")
                } else {
                    joined.clone()
                }
            })
        })
}

proptest! {
    #[test]
    fn tree_children_are_dirs_first_then_alphabetical(names in prop::collection::vec(entry_name(), 0..40)) {
        let tree = build_tree(&names, &IgnorePatterns::default());
        assert_ordered(&tree.root);
        prop_assert_eq!(tree.file_count, tree.root.file_paths().len());
        prop_assert!(tree.root.file_paths().iter().all(|p| !p.split('/').any(|s| s == ".git")));
    }

    #[test]
    fn tree_is_independent_of_entry_order(mut names in prop::collection::vec(entry_name(), 0..30)) {
        let forward = build_tree(&names, &IgnorePatterns::none());
        names.reverse();
        let backward = build_tree(&names, &IgnorePatterns::none());
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn walk_total_equals_sum_of_sizes(sizes in prop::collection::vec(0usize..2048, 0..12)) {
        let fixture = ProjectFixture::new().unwrap();
        for (i, size) in sizes.iter().enumerate() {
            fixture.write(&format!("d{}/f{i}.bin", i % 3), &"x".repeat(*size)).unwrap();
        }
        let result = DirectoryWalker::default().walk(fixture.root(), None).unwrap();
        let sum: u64 = result.files.iter().map(|f| f.size_bytes).sum();
        prop_assert_eq!(result.total_size_bytes, sum);
        prop_assert_eq!(get_summary(&result).total_files, sizes.len());
    }
}

#[test]
fn rewalking_with_same_patterns_is_idempotent() {
    let fixture = ProjectFixture::with_files(&[
        ("src/app.js", "console.log(1)"),
        ("node_modules/left-pad/index.js", "module.exports = 1"),
        ("docs/guide.md", "# guide"),
    ])
    .unwrap();
    let walker = DirectoryWalker::default();
    let ignore: IgnorePatterns = [".git", "node_modules"].into_iter().collect();

    let first = walker.walk(fixture.root(), Some(&ignore)).unwrap();
    let second = walker.walk(fixture.root(), Some(&ignore)).unwrap();

    let paths = |r: &artimine_discovery::WalkResult| {
        r.files
            .iter()
            .map(|f| f.relative_path.clone())
            .collect::<BTreeSet<_>>()
    };
    assert_eq!(paths(&first), paths(&second));
    assert_eq!(first.total_size_bytes, second.total_size_bytes);
    assert_eq!(
        paths(&first),
        ["docs/guide.md", "src/app.js"]
            .into_iter()
            .map(String::from)
            .collect()
    );
}

#[test]
fn uploaded_archive_tree_matches_extracted_walk() {
    let fixture = ProjectFixture::new().unwrap();
    let archive = fixture
        .write_zip(
            "upload.zip",
            &[
                ("proj/main.py", "print('hi')"),
                ("proj/tests/test_a.py", "def test_a(): pass"),
                ("proj/.git/config", "[core]"),
                ("proj/node_modules/x.js", "1"),
            ],
        )
        .unwrap();
    let ignore: IgnorePatterns = [".git", "node_modules"].into_iter().collect();

    let names = read_archive_names(&archive).unwrap();
    let tree = build_tree(&names, &ignore);
    assert_eq!(tree.file_count, 2);
    assert_eq!(
        tree.root.file_paths(),
        vec!["proj/main.py", "proj/tests/test_a.py"]
    );

    let extracted = extract_archive(&archive, &fixture.root().join("extracted")).unwrap();
    let walk = DirectoryWalker::default()
        .walk(&extracted, Some(&ignore))
        .unwrap();
    let mut walked: Vec<_> = walk.files.iter().map(|f| f.relative_path.clone()).collect();
    walked.sort();
    assert_eq!(walked, tree.root.file_paths());
}
