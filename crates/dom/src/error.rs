//! Error types for DOM operations
//!
//! Simple, flat error hierarchy. Malformed HTML is not in here: the parser
//! recovers from it and always yields a tree.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DomError>;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Input is not valid UTF-8 (valid up to byte {valid_up_to})")]
    InputDecoding { valid_up_to: usize },

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Node not found: {0}")]
    NodeNotFound(u32),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<std::str::Utf8Error> for DomError {
    fn from(err: std::str::Utf8Error) -> Self {
        DomError::InputDecoding {
            valid_up_to: err.valid_up_to(),
        }
    }
}

impl From<std::collections::TryReserveError> for DomError {
    fn from(err: std::collections::TryReserveError) -> Self {
        DomError::ResourceExhausted(err.to_string())
    }
}
