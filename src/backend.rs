use crate::error::TreeResult;
use crate::types::{NodeKind, Stat};

/// Path operations of a file tree for async hosts.
#[async_trait::async_trait]
pub trait TreeBackend: Send + Sync + 'static {
    async fn insert_dir(&self, path: &str) -> TreeResult<()>;

    async fn insert_file(&self, path: &str, contents: Vec<u8>) -> TreeResult<()>;

    async fn remove(&self, path: &str, kind: NodeKind) -> TreeResult<()>;

    async fn contains(&self, path: &str, kind: NodeKind) -> bool;

    async fn stat(&self, path: &str) -> TreeResult<Stat>;

    /// Copy of the file's contents, or `None` if `path` is not a file.
    async fn read(&self, path: &str) -> Option<Vec<u8>>;

    /// Previous contents, or `None` if `path` is not a file.
    async fn replace(&self, path: &str, contents: Vec<u8>) -> Option<Vec<u8>>;

    async fn listing(&self) -> Option<String>;
}
