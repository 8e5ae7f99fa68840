//! Core types for the file tree: node kinds, node identity and stat results.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Path separator used by every stored path.
pub const SEPARATOR: char = '/';

/// Enum for distinguishing node types at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Directory,
    File,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Directory => f.write_str("directory"),
            NodeKind::File => f.write_str("file"),
        }
    }
}

/// Node identifier, unique within one store; used as the non-owning
/// parent link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

/// Hands out node identifiers for one store.
#[derive(Debug)]
pub struct NodeIds {
    next: AtomicU64,
}

impl NodeIds {
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    pub fn fresh(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for NodeIds {
    fn default() -> Self {
        Self::new()
    }
}

/// Node metadata returned by `stat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub kind: NodeKind,
    /// File length in bytes; `None` for directories.
    pub length: Option<usize>,
}

impl Stat {
    pub fn directory() -> Self {
        Self {
            kind: NodeKind::Directory,
            length: None,
        }
    }

    pub fn file(length: usize) -> Self {
        Self {
            kind: NodeKind::File,
            length: Some(length),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }
}
