//! Read-only structural validation of a file tree.
//!
//! [`check`] walks the tree pre-order from the root and reports the first
//! broken invariant together with the node it was found at. A violation is
//! always an internal bug, never a normal error condition.

use thiserror::Error;

use super::node::{Node, strip_ancestor};
use crate::types::SEPARATOR;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("not initialized, but count is {0}")]
    UninitializedCount(usize),

    #[error("not initialized, but root {0} is present")]
    UninitializedRoot(String),

    #[error("count is 0, but root {0} is present")]
    EmptyWithRoot(String),

    #[error("root is absent, but count is {0}")]
    MissingRoot(usize),

    #[error("root {0} has a parent link")]
    RootHasParent(String),

    #[error("{0} has the same path as its parent")]
    SameAsParent(String),

    #[error("{child} is not a direct child of {parent}")]
    NotDirectChild { parent: String, child: String },

    #[error("children of {parent} are out of order at {child}")]
    OutOfOrder { parent: String, child: String },

    #[error("{child} does not link back to {parent}")]
    WrongParent { parent: String, child: String },

    #[error("count is {stored}, but the tree holds {actual} nodes")]
    CountMismatch { stored: usize, actual: usize },
}

/// Validate the whole store state: lifecycle flags, root, every node and
/// the node count.
pub fn check(initialized: bool, root: Option<&Node>, count: usize) -> Result<(), Violation> {
    if !initialized {
        if count != 0 {
            return Err(Violation::UninitializedCount(count));
        }
        if let Some(root) = root {
            return Err(Violation::UninitializedRoot(root.path().to_string()));
        }
    }

    let root = match root {
        Some(root) => root,
        None if count == 0 => return Ok(()),
        None => return Err(Violation::MissingRoot(count)),
    };
    if count == 0 {
        return Err(Violation::EmptyWithRoot(root.path().to_string()));
    }
    if root.parent().is_some() {
        return Err(Violation::RootHasParent(root.path().to_string()));
    }

    let actual = check_subtree(root)?;
    if actual != count {
        return Err(Violation::CountMismatch {
            stored: count,
            actual,
        });
    }
    Ok(())
}

pub fn is_valid(initialized: bool, root: Option<&Node>, count: usize) -> bool {
    check(initialized, root, count).is_ok()
}

/// Checks `child` against `parent`: distinct paths, and exactly one more
/// segment.
fn check_child_path(parent: &Node, child: &Node) -> Result<(), Violation> {
    if child.path() == parent.path() {
        return Err(Violation::SameAsParent(child.path().to_string()));
    }
    match strip_ancestor(parent.path(), child.path()) {
        Some(rest) if !rest.contains(SEPARATOR) => Ok(()),
        _ => Err(Violation::NotDirectChild {
            parent: parent.path().to_string(),
            child: child.path().to_string(),
        }),
    }
}

/// Pre-order walk below `node`; returns the number of nodes in the subtree.
fn check_subtree(node: &Node) -> Result<usize, Violation> {
    let children = node.children();

    for pair in children.windows(2) {
        if pair[0].compare(&pair[1]).is_ge() {
            return Err(Violation::OutOfOrder {
                parent: node.path().to_string(),
                child: pair[1].path().to_string(),
            });
        }
    }

    let mut total = 1;
    for child in children {
        if child.parent() != Some(node.id()) {
            return Err(Violation::WrongParent {
                parent: node.path().to_string(),
                child: child.path().to_string(),
            });
        }
        check_child_path(node, child)?;
        total += check_subtree(child)?;
    }
    Ok(total)
}
