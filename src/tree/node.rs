//! Internal node representation for the file tree.

use std::cmp::Ordering;

use crate::error::{TreeError, TreeResult};
use crate::types::{NodeId, NodeKind, SEPARATOR};

#[cfg(test)]
use std::cell::Cell;

/// A directory or file, identified by its full path.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    path: String,
    /// Non-owning link to the owning directory; `None` for the root and
    /// for nodes not yet linked.
    parent: Option<NodeId>,
    data: NodeData,
}

#[derive(Debug)]
enum NodeData {
    /// Children sorted by path, see [`Node::compare`].
    Dir { children: Vec<Node> },
    File { contents: Vec<u8> },
}

/// Returns what follows `ancestor` + separator in `path`, or `None` if
/// `path` is not strictly below `ancestor`.
pub(crate) fn strip_ancestor<'a>(ancestor: &str, path: &'a str) -> Option<&'a str> {
    path.strip_prefix(ancestor)?
        .strip_prefix(SEPARATOR)
        .filter(|rest| !rest.is_empty())
}

#[cfg(test)]
thread_local! {
    /// Node constructions left before allocation is made to fail.
    static ALLOCATIONS_LEFT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Make node construction on this thread fail with `AllocationFailure`
/// after `after` more successes; `None` lifts the limit.
#[cfg(test)]
pub(crate) fn fail_allocations_after(after: Option<usize>) {
    ALLOCATIONS_LEFT.with(|left| left.set(after));
}

#[cfg(test)]
fn take_allocation() -> TreeResult<()> {
    ALLOCATIONS_LEFT.with(|left| match left.get() {
        Some(0) => Err(TreeError::AllocationFailure),
        Some(n) => {
            left.set(Some(n - 1));
            Ok(())
        }
        None => Ok(()),
    })
}

/// Builds `parent.path + separator + name`, or just `name` without a parent.
fn build_path(parent: Option<&Node>, name: &str) -> TreeResult<String> {
    #[cfg(test)]
    take_allocation()?;

    let mut path = String::new();
    match parent {
        Some(parent) => {
            path.try_reserve_exact(parent.path.len() + SEPARATOR.len_utf8() + name.len())?;
            path.push_str(&parent.path);
            path.push(SEPARATOR);
        }
        None => path.try_reserve_exact(name.len())?,
    }
    path.push_str(name);
    Ok(path)
}

impl Node {
    /// Create a new directory with no children. The parent is only used to
    /// derive the path; the node is not linked into it.
    pub fn new_dir(id: NodeId, name: &str, parent: Option<&Node>) -> TreeResult<Self> {
        Ok(Node {
            id,
            path: build_path(parent, name)?,
            parent: None,
            data: NodeData::Dir {
                children: Vec::new(),
            },
        })
    }

    /// Create a new file owning `contents`. Not linked into `parent`.
    pub fn new_file(
        id: NodeId,
        name: &str,
        parent: Option<&Node>,
        contents: Vec<u8>,
    ) -> TreeResult<Self> {
        Ok(Node {
            id,
            path: build_path(parent, name)?,
            parent: None,
            data: NodeData::File { contents },
        })
    }

    /// Get the node identifier
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Get the full path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Final path segment
    pub fn name(&self) -> &str {
        self.path
            .rsplit_once(SEPARATOR)
            .map_or(self.path.as_str(), |(_, name)| name)
    }

    /// Get the node kind
    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Dir { .. } => NodeKind::Directory,
            NodeData::File { .. } => NodeKind::File,
        }
    }

    /// Check if this node is a directory
    pub fn is_dir(&self) -> bool {
        matches!(self.data, NodeData::Dir { .. })
    }

    /// Check if this node is a file
    pub fn is_file(&self) -> bool {
        matches!(self.data, NodeData::File { .. })
    }

    /// Get the parent link (None for the root or an unlinked node)
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in sorted order; always empty for files.
    pub fn children(&self) -> &[Node] {
        match &self.data {
            NodeData::Dir { children } => children.as_slice(),
            NodeData::File { .. } => &[],
        }
    }

    /// Get the number of children (0 for files)
    pub fn num_children(&self) -> usize {
        self.children().len()
    }

    /// Get the child at `index`, if any
    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children().get(index)
    }

    pub(crate) fn child_mut(&mut self, index: usize) -> Option<&mut Node> {
        match &mut self.data {
            NodeData::Dir { children } => children.get_mut(index),
            NodeData::File { .. } => None,
        }
    }

    /// Index of the child with exactly `path`, if any.
    pub(crate) fn find_child(&self, path: &str) -> Option<usize> {
        self.children()
            .binary_search_by(|child| child.path.as_str().cmp(path))
            .ok()
    }

    /// Get file contents (NotAFile for directories)
    pub fn contents(&self) -> TreeResult<&[u8]> {
        match &self.data {
            NodeData::File { contents } => Ok(contents.as_slice()),
            NodeData::Dir { .. } => Err(TreeError::NotAFile(self.path.clone())),
        }
    }

    /// Get file length (NotAFile for directories)
    pub fn length(&self) -> TreeResult<usize> {
        self.contents().map(<[u8]>::len)
    }

    /// Swap in new contents, returning the previous ones.
    pub fn replace_contents(&mut self, new_contents: Vec<u8>) -> TreeResult<Vec<u8>> {
        match &mut self.data {
            NodeData::File { contents } => Ok(std::mem::replace(contents, new_contents)),
            NodeData::Dir { .. } => Err(TreeError::NotAFile(self.path.clone())),
        }
    }

    /// Total order used for storage, search and validation: byte-wise path
    /// comparison. Directories and files interleave.
    pub fn compare(&self, other: &Node) -> Ordering {
        self.path.as_bytes().cmp(other.path.as_bytes())
    }

    /// Insert `child` at its sorted position and point its parent link here.
    ///
    /// Fails if this node is a file, if `child`'s path is not this path plus
    /// one segment, or if a child with that path already exists. On failure
    /// the children are untouched and `child` is dropped.
    pub fn link_child(&mut self, mut child: Node) -> TreeResult<()> {
        let id = self.id;
        let children = match &mut self.data {
            NodeData::Dir { children } => children,
            NodeData::File { .. } => return Err(TreeError::NotADirectory(self.path.clone())),
        };

        match strip_ancestor(&self.path, &child.path) {
            Some(rest) if !rest.contains(SEPARATOR) => {}
            _ => {
                return Err(TreeError::ParentChildMismatch {
                    parent: self.path.clone(),
                    child: child.path,
                });
            }
        }

        match children.binary_search_by(|c| c.compare(&child)) {
            Ok(_) => Err(TreeError::AlreadyPresent(child.path)),
            Err(index) => {
                children.try_reserve(1)?;
                child.parent = Some(id);
                children.insert(index, child);
                Ok(())
            }
        }
    }

    /// Remove the child with `path` and hand it back. Its parent link is
    /// left stale.
    pub fn unlink_child(&mut self, path: &str) -> TreeResult<Node> {
        let mismatch = || TreeError::ParentChildMismatch {
            parent: self.path.clone(),
            child: path.to_string(),
        };
        let index = self.find_child(path).ok_or_else(mismatch)?;
        match &mut self.data {
            NodeData::Dir { children } => Ok(children.remove(index)),
            NodeData::File { .. } => Err(mismatch()),
        }
    }

    /// Tear down this node and its whole subtree, children first.
    /// Returns the number of nodes destroyed.
    pub fn destroy(self) -> usize {
        match self.data {
            NodeData::Dir { children } => {
                1 + children.into_iter().map(Node::destroy).sum::<usize>()
            }
            NodeData::File { .. } => 1,
        }
    }

    /// Append without ordering or parent checks, for building broken trees.
    #[cfg(test)]
    pub(crate) fn push_unchecked(&mut self, child: Node) {
        if let NodeData::Dir { children } = &mut self.data {
            children.push(child);
        }
    }

    #[cfg(test)]
    pub(crate) fn set_parent(&mut self, parent: Option<NodeId>) {
        self.parent = parent;
    }
}
