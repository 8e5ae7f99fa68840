//! The file tree: nodes, the store that owns them, and the invariant checker.

pub mod checker;
pub mod node;
mod store;

#[cfg(test)]
mod tests;

pub use checker::Violation;
pub use node::Node;
pub use store::FileTree;
