//! Error types for merkle_forest

use crate::model::Hash;
use thiserror::Error;

/// Result type alias for merkle_forest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in merkle_forest operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown root: {0}")]
    UnknownRoot(Hash),

    #[error("Malformed proof at node {index}: {reason}")]
    MalformedProof { index: usize, reason: String },

    #[error("Invalid diff: {0}")]
    InvalidDiff(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Index {index} out of bounds for tree of {len} leaves")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("Ordered proof does not match the root")]
    OrderedProofMismatch,

    #[error("Invalid height: expected {expected}, found {found}")]
    InvalidHeight { expected: u64, found: u64 },

    #[error("Height {requested} unavailable: retained heights are {oldest}..={newest}")]
    HeightUnavailable {
        requested: u64,
        oldest: u64,
        newest: u64,
    },

    #[error("Config error: {0}")]
    Config(String),
}
