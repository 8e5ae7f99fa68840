//! Lock-guarded file tree implementing the async backend.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::backend::TreeBackend;
use crate::config::TreeConfig;
use crate::error::TreeResult;
use crate::tree::FileTree;
use crate::types::{NodeKind, Stat};

/// A single [`FileTree`] behind one lock. Every call holds the lock for its
/// whole duration, so the tree only ever sees one caller at a time.
#[derive(Debug, Clone)]
pub struct SharedTree {
    tree: Arc<RwLock<FileTree>>,
}

impl SharedTree {
    /// Create an initialized, empty tree.
    pub fn new() -> TreeResult<Self> {
        Self::with_config(TreeConfig::default())
    }

    pub fn with_config(config: TreeConfig) -> TreeResult<Self> {
        let mut tree = FileTree::with_config(config);
        tree.init()?;
        Ok(Self::from_tree(tree))
    }

    pub fn from_tree(tree: FileTree) -> Self {
        Self {
            tree: Arc::new(RwLock::new(tree)),
        }
    }

    // Poisoned locks are recovered, not propagated.
    pub fn read_tree(&self) -> RwLockReadGuard<'_, FileTree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write_tree(&self) -> RwLockWriteGuard<'_, FileTree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait]
impl TreeBackend for SharedTree {
    async fn insert_dir(&self, path: &str) -> TreeResult<()> {
        self.write_tree().insert_dir(path)
    }

    async fn insert_file(&self, path: &str, contents: Vec<u8>) -> TreeResult<()> {
        self.write_tree().insert_file(path, contents)
    }

    async fn remove(&self, path: &str, kind: NodeKind) -> TreeResult<()> {
        self.write_tree().remove(path, kind)
    }

    async fn contains(&self, path: &str, kind: NodeKind) -> bool {
        self.read_tree().contains(path, kind)
    }

    async fn stat(&self, path: &str) -> TreeResult<Stat> {
        self.read_tree().stat(path)
    }

    async fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.read_tree().file_contents(path).map(<[u8]>::to_vec)
    }

    async fn replace(&self, path: &str, contents: Vec<u8>) -> Option<Vec<u8>> {
        self.write_tree().replace_file_contents(path, contents)
    }

    async fn listing(&self) -> Option<String> {
        self.read_tree().serialize()
    }
}
