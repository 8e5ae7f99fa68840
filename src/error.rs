use std::collections::TryReserveError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TreeError {
    #[error("not initialized")]
    NotInitialized,

    #[error("already initialized")]
    AlreadyInitialized,

    #[error("conflicting path: {0}")]
    ConflictingPath(String),

    #[error("already present: {0}")]
    AlreadyPresent(String),

    #[error("not a directory: {0}")]
    NotADirectory(String),

    #[error("not a file: {0}")]
    NotAFile(String),

    #[error("parent/child mismatch: {child} under {parent}")]
    ParentChildMismatch { parent: String, child: String },

    #[error("no such path: {0}")]
    NoSuchPath(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    // TryReserveError carries no serializable detail
    #[error("allocation failure")]
    AllocationFailure,
}

impl From<TryReserveError> for TreeError {
    fn from(_: TryReserveError) -> Self {
        TreeError::AllocationFailure
    }
}

pub type TreeResult<T> = Result<T, TreeError>;
