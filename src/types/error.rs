//! Error types for recipe ranking and substitution operations.
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `From` implementations.
//! Errors fall into three groups: input errors (rejected before any external call),
//! upstream-unavailable errors (an external store failed), and everything else.
//! Empty results are never errors.

use crate::types::recipe::RecipeRef;
use std::fmt;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// External collaborator that an operation depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// Embedding service (query text -> vector)
    Embedding,
    /// Nearest-neighbor vector index
    VectorIndex,
    /// Recipe metadata store
    RecipeStore,
    /// Substitution property graph
    Graph,
}

impl Dependency {
    /// Get dependency name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::VectorIndex => "vector_index",
            Self::RecipeStore => "recipe_store",
            Self::Graph => "graph",
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for all engine operations.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Caller supplied an invalid request (empty ingredients, weight out of range, ...)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An external store is unreachable or returned an error
    #[error("Upstream {dependency} unavailable: {message}")]
    Unavailable {
        dependency: Dependency,
        message: String,
    },

    /// Index returned a reference the metadata store does not know
    #[error("Recipe not found: {0}")]
    RecipeNotFound(RecipeRef),

    /// Query embedding and index disagree on dimensionality
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Requested more neighbors than the index can return per query
    #[error("Requested {requested} neighbors, index returns at most {limit}")]
    PoolTooLarge { requested: usize, limit: usize },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML config parsing error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Bincode error (vector snapshots)
    #[error("Bincode error: {0}")]
    BincodeError(#[from] bincode::Error),

    /// CSV import error
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl EngineError {
    /// Create an input error with context.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an upstream-unavailable error for `dependency`.
    pub fn unavailable(dependency: Dependency, msg: impl Into<String>) -> Self {
        Self::Unavailable {
            dependency,
            message: msg.into(),
        }
    }

    /// Check if the caller sent a bad request.
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_) | Self::PoolTooLarge { .. })
    }

    /// Check if an external dependency failed.
    ///
    /// Retrying is the caller's policy; nothing in this crate retries.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// Dependency that failed, if this is an upstream error.
    pub fn dependency(&self) -> Option<Dependency> {
        match self {
            Self::Unavailable { dependency, .. } => Some(*dependency),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(err: reqwest::Error) -> Self {
        Self::unavailable(Dependency::Embedding, err.to_string())
    }
}

impl From<rocksdb::Error> for EngineError {
    fn from(err: rocksdb::Error) -> Self {
        Self::unavailable(Dependency::RecipeStore, err.to_string())
    }
}

impl From<neo4rs::Error> for EngineError {
    fn from(err: neo4rs::Error) -> Self {
        Self::unavailable(Dependency::Graph, err.to_string())
    }
}

impl From<tokio::task::JoinError> for EngineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::InternalError(format!("Worker task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let err = EngineError::invalid("ingredients must not be empty");
        assert!(err.is_input_error());
        assert!(!err.is_unavailable());
        assert_eq!(err.dependency(), None);

        let err = EngineError::unavailable(Dependency::Graph, "connection refused");
        assert!(err.is_unavailable());
        assert_eq!(err.dependency(), Some(Dependency::Graph));
        assert_eq!(err.to_string(), "Upstream graph unavailable: connection refused");
    }

    #[test]
    fn test_pool_too_large_is_input_error() {
        let err = EngineError::PoolTooLarge {
            requested: 200,
            limit: 100,
        };
        assert!(err.is_input_error());
        assert!(!err.is_unavailable());
    }

    #[test]
    fn test_io_error_is_not_upstream() {
        let err: EngineError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(!err.is_unavailable());
        assert!(!err.is_input_error());
    }
}
