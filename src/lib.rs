//! filetree: an in-memory hierarchical namespace of directories and files,
//! addressed by slash-delimited paths.

pub mod backend;
pub mod config;
pub mod error;
pub mod shared;
pub mod tree;
pub mod types;

// Re-export
pub use backend::TreeBackend;
pub use config::{TreeConfig, VerifyMode};
pub use error::{TreeError, TreeResult};
pub use shared::SharedTree;
pub use tree::{FileTree, Node, Violation};
pub use types::*;
