//! Core FileTree implementation.

use tracing::{debug, error, trace};

use super::checker::{self, Violation};
use super::node::{Node, strip_ancestor};
use crate::config::TreeConfig;
use crate::error::{TreeError, TreeResult};
use crate::types::{NodeIds, NodeKind, SEPARATOR, Stat};

/// Child indices leading from the root to a node.
type Route = Vec<usize>;

/// In-memory hierarchical namespace of directories and files.
///
/// Starts uninitialized; every operation other than [`FileTree::init`]
/// fails (or reports absence) until `init` is called.
#[derive(Debug, Default)]
pub struct FileTree {
    initialized: bool,
    root: Option<Node>,
    count: usize,
    ids: NodeIds,
    config: TreeConfig,
}

/// Reject paths whose segments would not survive a split on the separator.
fn validate_path(path: &str) -> TreeResult<()> {
    if path.is_empty() {
        return Err(TreeError::InvalidPath("empty path".into()));
    }
    if path.split(SEPARATOR).any(str::is_empty) {
        return Err(TreeError::InvalidPath(format!("empty segment in {path}")));
    }
    Ok(())
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn init(&mut self) -> TreeResult<()> {
        if self.initialized {
            return Err(TreeError::AlreadyInitialized);
        }
        self.initialized = true;
        self.root = None;
        self.count = 0;
        self.verify();
        Ok(())
    }

    /// Free the whole tree and return to the uninitialized state.
    pub fn destroy(&mut self) -> TreeResult<()> {
        self.ensure_initialized()?;
        if let Some(root) = self.root.take() {
            self.count -= root.destroy();
        }
        self.initialized = false;
        debug!(count = self.count, "file tree destroyed");
        self.verify();
        Ok(())
    }

    fn ensure_initialized(&self) -> TreeResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(TreeError::NotInitialized)
        }
    }

    /// Run the invariant checker if the config asks for it. A violation is
    /// an internal bug and aborts.
    fn verify(&self) {
        if !self.config.verify.enabled() {
            return;
        }
        if let Err(violation) = self.check() {
            error!(%violation, "file tree invariant violated");
            panic!("file tree invariant violated: {violation}");
        }
    }

    /// Detailed form of [`FileTree::validate`].
    pub fn check(&self) -> Result<(), Violation> {
        checker::check(self.initialized, self.root.as_ref(), self.count)
    }

    pub fn validate(&self) -> bool {
        checker::is_valid(self.initialized, self.root.as_ref(), self.count)
    }

    /// Descend from the root towards `path`. Returns the route to the node
    /// with exactly that path or, failing that, to the deepest node whose
    /// path is a proper prefix of it. `None` if not even the root is.
    fn locate(&self, path: &str) -> Option<(Route, &Node)> {
        let mut node = self.root.as_ref()?;
        if node.path() != path && strip_ancestor(node.path(), path).is_none() {
            return None;
        }

        let mut route = Route::new();
        while let Some(rest) = strip_ancestor(node.path(), path) {
            let segment = rest.split(SEPARATOR).next().unwrap_or(rest);
            let child_path = &path[..path.len() - rest.len() + segment.len()];
            match node.find_child(child_path) {
                Some(index) => {
                    route.push(index);
                    node = &node.children()[index];
                }
                None => break,
            }
        }
        trace!(path, found = node.path(), "traversed");
        Some((route, node))
    }

    /// The node with exactly `path`, or the deepest existing ancestor of it.
    pub fn traverse(&self, path: &str) -> Option<&Node> {
        if !self.initialized {
            return None;
        }
        self.locate(path).map(|(_, node)| node)
    }

    /// The node with exactly `path`.
    fn find(&self, path: &str) -> Option<&Node> {
        self.traverse(path).filter(|node| node.path() == path)
    }

    fn node_at_mut(&mut self, route: &[usize]) -> Option<&mut Node> {
        let mut node = self.root.as_mut()?;
        for &index in route {
            node = node.child_mut(index)?;
        }
        Some(node)
    }

    pub fn insert_dir(&mut self, path: &str) -> TreeResult<()> {
        self.ensure_initialized()?;
        let result = self.insert_chain(path, None);
        self.verify();
        result
    }

    /// Insert a file, creating any missing intermediate directories below
    /// an existing directory.
    pub fn insert_file(&mut self, path: &str, contents: Vec<u8>) -> TreeResult<()> {
        self.ensure_initialized()?;
        let result = self.insert_chain(path, Some(contents));
        self.verify();
        result
    }

    /// Create the nodes from the attachment point down to `path`: all
    /// directories, or directories ending in a file when `contents` is
    /// given. The chain is built detached and linked in last, so any
    /// failure leaves the tree untouched.
    fn insert_chain(&mut self, path: &str, mut contents: Option<Vec<u8>>) -> TreeResult<()> {
        validate_path(path)?;
        let is_file = contents.is_some();

        let (route, head) = {
            let located = self.locate(path);
            let anchor = match &located {
                Some((_, node)) if node.path() == path => {
                    return Err(TreeError::AlreadyPresent(path.to_string()));
                }
                Some((_, node)) if node.is_file() => {
                    return Err(TreeError::NotADirectory(node.path().to_string()));
                }
                Some((_, node)) => Some(*node),
                None if self.root.is_some() || is_file => {
                    return Err(TreeError::ConflictingPath(path.to_string()));
                }
                None => None,
            };
            let rest = match anchor {
                Some(anchor) => strip_ancestor(anchor.path(), path)
                    .ok_or_else(|| TreeError::ConflictingPath(path.to_string()))?,
                None => path,
            };

            let segments: Vec<&str> = rest.split(SEPARATOR).collect();
            let mut chain: Vec<Node> = Vec::new();
            chain.try_reserve_exact(segments.len())?;
            for (i, segment) in segments.iter().enumerate() {
                let parent = chain.last().or(anchor);
                let node = match contents.take_if(|_| i + 1 == segments.len()) {
                    Some(contents) => {
                        Node::new_file(self.ids.fresh(), segment, parent, contents)?
                    }
                    None => Node::new_dir(self.ids.fresh(), segment, parent)?,
                };
                chain.push(node);
            }

            let mut head = chain.pop().ok_or_else(|| {
                TreeError::InvalidPath(format!("no segments to insert in {path}"))
            })?;
            while let Some(mut parent) = chain.pop() {
                parent.link_child(head)?;
                head = parent;
            }
            (located.map(|(route, _)| route), head)
        };

        let added = segments_below(&head);
        match route {
            Some(route) => {
                let anchor = self
                    .node_at_mut(&route)
                    .ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?;
                anchor.link_child(head)?;
            }
            None => self.root = Some(head),
        }
        self.count += added;
        debug!(path, added, count = self.count, "inserted");
        Ok(())
    }

    pub fn remove_dir(&mut self, path: &str) -> TreeResult<()> {
        self.remove(path, NodeKind::Directory)
    }

    pub fn remove_file(&mut self, path: &str) -> TreeResult<()> {
        self.remove(path, NodeKind::File)
    }

    /// Unlink the node at `path` and destroy its subtree.
    pub fn remove(&mut self, path: &str, expected: NodeKind) -> TreeResult<()> {
        self.ensure_initialized()?;
        let result = self.remove_at(path, expected);
        self.verify();
        result
    }

    fn remove_at(&mut self, path: &str, expected: NodeKind) -> TreeResult<()> {
        let route = match self.locate(path) {
            Some((route, node)) if node.path() == path => {
                match (node.kind(), expected) {
                    (NodeKind::File, NodeKind::Directory) => {
                        return Err(TreeError::NotADirectory(path.to_string()));
                    }
                    (NodeKind::Directory, NodeKind::File) => {
                        return Err(TreeError::NotAFile(path.to_string()));
                    }
                    _ => route,
                }
            }
            _ => return Err(TreeError::NoSuchPath(path.to_string())),
        };

        let removed = match route.split_last() {
            Some((_, parent_route)) => self
                .node_at_mut(parent_route)
                .ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?
                .unlink_child(path)?,
            None => self
                .root
                .take()
                .ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?,
        };
        let destroyed = removed.destroy();
        self.count -= destroyed;
        debug!(path, destroyed, count = self.count, "removed");
        Ok(())
    }

    pub fn contains(&self, path: &str, expected: NodeKind) -> bool {
        self.find(path).is_some_and(|node| node.kind() == expected)
    }

    pub fn contains_dir(&self, path: &str) -> bool {
        self.contains(path, NodeKind::Directory)
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.contains(path, NodeKind::File)
    }

    pub fn file_contents(&self, path: &str) -> Option<&[u8]> {
        self.find(path)?.contents().ok()
    }

    /// Swap the contents of the file at `path`, returning the old ones.
    pub fn replace_file_contents(&mut self, path: &str, contents: Vec<u8>) -> Option<Vec<u8>> {
        if !self.initialized {
            return None;
        }
        let route = match self.locate(path) {
            Some((route, node)) if node.path() == path && node.is_file() => route,
            _ => return None,
        };
        let old = self.node_at_mut(&route)?.replace_contents(contents).ok();
        debug!(path, "replaced file contents");
        self.verify();
        old
    }

    pub fn stat(&self, path: &str) -> TreeResult<Stat> {
        self.ensure_initialized()?;
        let node = self
            .find(path)
            .ok_or_else(|| TreeError::NoSuchPath(path.to_string()))?;
        Ok(match node.kind() {
            NodeKind::Directory => Stat::directory(),
            NodeKind::File => Stat::file(node.length()?),
        })
    }

    /// Every path in pre-order, each followed by a newline. `None` when
    /// uninitialized, empty for an empty tree.
    pub fn serialize(&self) -> Option<String> {
        if !self.initialized {
            return None;
        }
        let mut out = String::new();
        if let Some(root) = &self.root {
            write_preorder(root, &mut out);
        }
        Some(out)
    }
}

/// Number of nodes in a freshly built chain.
fn segments_below(node: &Node) -> usize {
    1 + node.children().iter().map(segments_below).sum::<usize>()
}

fn write_preorder(node: &Node, out: &mut String) {
    out.push_str(node.path());
    out.push('\n');
    for child in node.children() {
        write_preorder(child, out);
    }
}
