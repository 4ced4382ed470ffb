//! Error types for sccd

use thiserror::Error;

/// Main error type for sccd operations
#[derive(Error, Debug)]
pub enum SccdError {
    #[error("Invalid vertex: {vertex} (graph has {n} vertices)")]
    InvalidVertex { vertex: usize, n: usize },

    #[error("Invalid command: {input}")]
    InvalidCommand { input: String },

    #[error("Malformed edge line: {line}")]
    MalformedEdgeLine { line: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sccd operations
pub type Result<T> = std::result::Result<T, SccdError>;
