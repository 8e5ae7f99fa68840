//! Tests for the file tree store.

use super::*;
use crate::config::{TreeConfig, VerifyMode};
use crate::error::TreeError;
use crate::types::{NodeKind, Stat};

fn tree() -> FileTree {
    let mut tree = FileTree::with_config(TreeConfig::new().with_verify(VerifyMode::Always));
    tree.init().unwrap();
    tree
}

#[test]
fn test_lifecycle() {
    let mut tree = FileTree::new();
    assert!(!tree.is_initialized());
    assert_eq!(tree.destroy(), Err(TreeError::NotInitialized));

    tree.init().unwrap();
    assert_eq!(tree.init(), Err(TreeError::AlreadyInitialized));
    assert_eq!(tree.serialize().as_deref(), Some(""));
    assert!(tree.validate());

    tree.insert_dir("a/b").unwrap();
    tree.destroy().unwrap();
    assert!(!tree.is_initialized());
    assert_eq!(tree.len(), 0);
    assert!(tree.root().is_none());
    assert!(tree.validate());

    // can be brought back up
    tree.init().unwrap();
    assert!(tree.is_empty());
}

#[test]
fn test_uninitialized_calls() {
    let mut tree = FileTree::new();
    assert_eq!(tree.insert_dir("a"), Err(TreeError::NotInitialized));
    assert_eq!(
        tree.insert_file("a/f", b"x".to_vec()),
        Err(TreeError::NotInitialized)
    );
    assert_eq!(tree.remove_dir("a"), Err(TreeError::NotInitialized));
    assert_eq!(tree.remove_file("a/f"), Err(TreeError::NotInitialized));
    assert_eq!(tree.stat("a"), Err(TreeError::NotInitialized));
    assert!(!tree.contains_dir("a"));
    assert!(!tree.contains_file("a/f"));
    assert_eq!(tree.file_contents("a/f"), None);
    assert_eq!(tree.replace_file_contents("a/f", Vec::new()), None);
    assert_eq!(tree.serialize(), None);
    assert!(tree.traverse("a").is_none());
    assert_eq!(tree.len(), 0);
    assert!(!tree.is_initialized());
}

#[test]
fn test_insert_dir_and_serialize() {
    let mut tree = tree();
    tree.insert_dir("a").unwrap();
    tree.insert_dir("a/b").unwrap();
    assert!(tree.contains_dir("a/b"));
    assert_eq!(tree.stat("a/b"), Ok(Stat::directory()));
    assert_eq!(tree.serialize().as_deref(), Some("a\na/b\n"));
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_insert_creates_chain() {
    let mut tree = tree();
    tree.insert_dir("a/b/c").unwrap();
    assert_eq!(tree.len(), 3);
    assert!(tree.contains_dir("a"));
    assert!(tree.contains_dir("a/b"));

    tree.insert_dir("a/x/y/z").unwrap();
    assert_eq!(tree.len(), 6);
    assert_eq!(
        tree.serialize().as_deref(),
        Some("a\na/b\na/b/c\na/x\na/x/y\na/x/y/z\n")
    );
}

#[test]
fn test_insert_twice_is_rejected() {
    let mut tree = tree();
    tree.insert_dir("a/b").unwrap();
    let before = tree.serialize();

    assert_eq!(
        tree.insert_dir("a/b"),
        Err(TreeError::AlreadyPresent("a/b".into()))
    );
    assert_eq!(tree.insert_dir("a"), Err(TreeError::AlreadyPresent("a".into())));
    assert_eq!(tree.serialize(), before);
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_conflicting_root() {
    let mut tree = tree();
    tree.insert_dir("a").unwrap();
    assert_eq!(
        tree.insert_dir("b/c"),
        Err(TreeError::ConflictingPath("b/c".into()))
    );
    // prefix but not at a segment boundary
    assert_eq!(
        tree.insert_dir("ab"),
        Err(TreeError::ConflictingPath("ab".into()))
    );
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_invalid_paths() {
    let mut tree = tree();
    tree.insert_dir("a").unwrap();
    for path in ["", "/a", "a/", "a//b"] {
        assert!(
            matches!(tree.insert_dir(path), Err(TreeError::InvalidPath(_))),
            "{path:?} accepted"
        );
    }
    assert!(matches!(
        tree.insert_file("a//f", Vec::new()),
        Err(TreeError::InvalidPath(_))
    ));
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_insert_file() {
    let mut tree = tree();
    tree.insert_dir("a").unwrap();
    tree.insert_file("a/f.txt", b"hello".to_vec()).unwrap();

    assert!(tree.contains_file("a/f.txt"));
    assert!(!tree.contains_dir("a/f.txt"));
    assert_eq!(tree.file_contents("a/f.txt"), Some(&b"hello"[..]));
    assert_eq!(tree.stat("a/f.txt"), Ok(Stat::file(5)));
    assert!(tree.stat("a/f.txt").unwrap().is_file());
}

#[test]
fn test_insert_file_creates_directories() {
    let mut tree = tree();
    tree.insert_dir("a").unwrap();
    tree.insert_file("a/x/y/f", b"1".to_vec()).unwrap();
    assert_eq!(tree.len(), 4);
    assert!(tree.contains_dir("a/x"));
    assert!(tree.contains_dir("a/x/y"));
    assert!(tree.contains_file("a/x/y/f"));
}

#[test]
fn test_file_never_becomes_root() {
    let mut tree = tree();
    assert_eq!(
        tree.insert_file("f", Vec::new()),
        Err(TreeError::ConflictingPath("f".into()))
    );
    assert_eq!(
        tree.insert_file("x/f.txt", Vec::new()),
        Err(TreeError::ConflictingPath("x/f.txt".into()))
    );
    assert!(tree.is_empty());
    assert!(tree.root().is_none());

    tree.insert_dir("a").unwrap();
    assert_eq!(
        tree.insert_file("x/f.txt", Vec::new()),
        Err(TreeError::ConflictingPath("x/f.txt".into()))
    );
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_insert_below_file() {
    let mut tree = tree();
    tree.insert_dir("a").unwrap();
    tree.insert_file("a/f", b"x".to_vec()).unwrap();
    let before = tree.serialize();

    assert_eq!(
        tree.insert_dir("a/f/g"),
        Err(TreeError::NotADirectory("a/f".into()))
    );
    assert_eq!(
        tree.insert_file("a/f/g/h", Vec::new()),
        Err(TreeError::NotADirectory("a/f".into()))
    );
    assert_eq!(
        tree.insert_file("a/f", Vec::new()),
        Err(TreeError::AlreadyPresent("a/f".into()))
    );
    assert_eq!(tree.serialize(), before);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.file_contents("a/f"), Some(&b"x"[..]));
}

#[test]
fn test_files_and_dirs_interleave() {
    let mut tree = tree();
    tree.insert_dir("r").unwrap();
    tree.insert_dir("r/b").unwrap();
    tree.insert_file("r/c", Vec::new()).unwrap();
    tree.insert_file("r/a", Vec::new()).unwrap();
    tree.insert_dir("r/b/x").unwrap();
    assert_eq!(
        tree.serialize().as_deref(),
        Some("r\nr/a\nr/b\nr/b/x\nr/c\n")
    );
}

#[test]
fn test_remove_subtree() {
    let mut tree = tree();
    tree.insert_dir("a/b/c").unwrap();
    tree.insert_file("a/b/f", b"x".to_vec()).unwrap();
    tree.insert_dir("a/d").unwrap();
    assert_eq!(tree.len(), 5);

    tree.remove_dir("a/b").unwrap();
    assert_eq!(tree.len(), 2);
    assert!(!tree.contains_dir("a/b"));
    assert!(!tree.contains_dir("a/b/c"));
    assert!(!tree.contains_file("a/b/f"));
    assert_eq!(tree.serialize().as_deref(), Some("a\na/d\n"));

    tree.remove_dir("a").unwrap();
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert_eq!(tree.serialize().as_deref(), Some(""));

    // a new root may be installed afterwards
    tree.insert_dir("z").unwrap();
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_remove_errors() {
    let mut tree = tree();
    tree.insert_dir("a/b").unwrap();
    tree.insert_file("a/f", Vec::new()).unwrap();

    assert_eq!(
        tree.remove_dir("a/c"),
        Err(TreeError::NoSuchPath("a/c".into()))
    );
    assert_eq!(tree.remove_dir("q"), Err(TreeError::NoSuchPath("q".into())));
    assert_eq!(
        tree.remove_dir("a/f"),
        Err(TreeError::NotADirectory("a/f".into()))
    );
    assert_eq!(
        tree.remove_file("a/b"),
        Err(TreeError::NotAFile("a/b".into()))
    );
    assert_eq!(tree.len(), 3);

    tree.remove_file("a/f").unwrap();
    assert!(!tree.contains_file("a/f"));
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_contains_checks_kind_and_exact_path() {
    let mut tree = tree();
    tree.insert_dir("a/b").unwrap();
    tree.insert_file("a/f", Vec::new()).unwrap();
    assert!(tree.contains("a", NodeKind::Directory));
    assert!(!tree.contains("a/b", NodeKind::File));
    assert!(!tree.contains("a/b/c", NodeKind::Directory));
    assert!(!tree.contains("a/bc", NodeKind::Directory));
    assert!(tree.contains("a/f", NodeKind::File));
}

#[test]
fn test_replace_contents() {
    let mut tree = tree();
    tree.insert_dir("a").unwrap();
    tree.insert_file("a/f", Vec::new()).unwrap();

    let old = tree.replace_file_contents("a/f", b"new".to_vec());
    assert_eq!(old, Some(Vec::new()));
    assert_eq!(tree.file_contents("a/f"), Some(&b"new"[..]));
    assert_eq!(tree.stat("a/f"), Ok(Stat::file(3)));

    assert_eq!(tree.replace_file_contents("a", b"x".to_vec()), None);
    assert_eq!(tree.replace_file_contents("a/g", b"x".to_vec()), None);
    assert_eq!(tree.file_contents("a"), None);
}

#[test]
fn test_stat_missing() {
    let mut tree = tree();
    assert_eq!(tree.stat("a"), Err(TreeError::NoSuchPath("a".into())));
    tree.insert_dir("a").unwrap();
    assert_eq!(tree.stat("a/b"), Err(TreeError::NoSuchPath("a/b".into())));
}

#[test]
fn test_traverse_returns_attachment_point() {
    let mut tree = tree();
    tree.insert_dir("a/b").unwrap();
    assert_eq!(tree.traverse("a/b").map(Node::path), Some("a/b"));
    assert_eq!(tree.traverse("a/b/c/d").map(Node::path), Some("a/b"));
    assert_eq!(tree.traverse("a/bc").map(Node::path), Some("a"));
    assert_eq!(tree.traverse("b").map(Node::path), None);
}

#[test]
fn test_valid_after_every_call() {
    let mut tree = tree();
    let steps: Vec<Box<dyn Fn(&mut FileTree) -> bool>> = vec![
        Box::new(|t: &mut FileTree| t.insert_dir("m").is_ok()),
        Box::new(|t: &mut FileTree| t.insert_dir("m/k/j").is_ok()),
        Box::new(|t: &mut FileTree| t.insert_file("m/k/f", b"abc".to_vec()).is_ok()),
        Box::new(|t: &mut FileTree| t.insert_dir("m/a").is_ok()),
        Box::new(|t: &mut FileTree| t.insert_dir("m/k").is_ok()),
        Box::new(|t: &mut FileTree| t.insert_file("m/z/y/x", Vec::new()).is_ok()),
        Box::new(|t: &mut FileTree| t.remove_file("m/k/f").is_ok()),
        Box::new(|t: &mut FileTree| t.remove_dir("m/z").is_ok()),
        Box::new(|t: &mut FileTree| t.remove_dir("m/k/j").is_ok()),
        Box::new(|t: &mut FileTree| t.remove_dir("nope").is_ok()),
    ];
    let expected = [true, true, true, true, false, true, true, true, true, false];
    for (step, want) in steps.iter().zip(expected) {
        assert_eq!(step(&mut tree), want);
        assert_eq!(tree.check(), Ok(()));
    }
    assert_eq!(tree.serialize().as_deref(), Some("m\nm/a\nm/k\n"));
    assert_eq!(tree.len(), 3);
}

#[test]
fn test_prefix_law_and_unique_paths() {
    let mut tree = tree();
    tree.insert_dir("r/a/b").unwrap();
    tree.insert_file("r/a/f", Vec::new()).unwrap();
    tree.insert_dir("r/c").unwrap();

    fn walk(node: &Node, seen: &mut Vec<String>) {
        seen.push(node.path().to_string());
        for child in node.children() {
            assert_eq!(child.path(), format!("{}/{}", node.path(), child.name()));
            assert_eq!(child.parent(), Some(node.id()));
            walk(child, seen);
        }
    }
    let mut seen = Vec::new();
    walk(tree.root().unwrap(), &mut seen);
    let total = seen.len();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), total);
    assert_eq!(total, tree.len());
}

#[test]
fn test_failed_chain_leaves_tree_unchanged() {
    let mut tree = tree();
    tree.insert_dir("a").unwrap();
    tree.insert_file("a/f", b"x".to_vec()).unwrap();
    let before = tree.serialize();
    let len = tree.len();

    // fail while building the j-th of the three new nodes
    for j in 1..=3 {
        node::fail_allocations_after(Some(j - 1));
        let result = tree.insert_dir("a/x/y/z");
        node::fail_allocations_after(None);

        assert_eq!(result, Err(TreeError::AllocationFailure), "segment {j}");
        assert_eq!(tree.len(), len);
        assert_eq!(tree.serialize(), before);
        assert_eq!(tree.check(), Ok(()));
        assert!(!tree.contains_dir("a/x"));
    }

    node::fail_allocations_after(Some(2));
    let result = tree.insert_file("a/x/y/g", b"y".to_vec());
    node::fail_allocations_after(None);
    assert_eq!(result, Err(TreeError::AllocationFailure));
    assert_eq!(tree.serialize(), before);

    // the same inserts go through once allocation succeeds
    tree.insert_dir("a/x/y/z").unwrap();
    tree.insert_file("a/x/y/g", b"y".to_vec()).unwrap();
    assert_eq!(tree.len(), len + 4);
}

#[test]
fn test_failed_root_chain_leaves_tree_empty() {
    let mut tree = tree();
    node::fail_allocations_after(Some(1));
    let result = tree.insert_dir("r/s/t");
    node::fail_allocations_after(None);

    assert_eq!(result, Err(TreeError::AllocationFailure));
    assert!(tree.is_empty());
    assert!(tree.root().is_none());
    assert_eq!(tree.serialize().as_deref(), Some(""));
    assert_eq!(tree.check(), Ok(()));
}

#[test]
fn test_node_ids_are_per_store() {
    let mut first = tree();
    let mut second = tree();
    first.insert_dir("a/b").unwrap();
    second.insert_dir("a").unwrap();

    assert_eq!(first.root().map(|n| n.id().get()), Some(1));
    assert_eq!(second.root().map(|n| n.id().get()), Some(1));
    let root = first.root().unwrap();
    assert_eq!(root.child(0).and_then(Node::parent), Some(root.id()));
    assert_ne!(root.child(0).map(Node::id), Some(root.id()));
}
