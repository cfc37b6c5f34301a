//! Typed errors for the knowledge library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can tell a
//! fatal build failure apart from a degraded, search-time condition.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building, loading or searching the index.
#[derive(Debug, Error)]
pub enum KnowledgeError {
    /// Guideline corpus directory does not exist
    #[error("knowledge directory not found: {}", path.display())]
    CorpusNotFound { path: PathBuf },

    /// Corpus directory holds no usable documents
    #[error("no .txt documents found in {}", path.display())]
    EmptyCorpus { path: PathBuf },

    /// Documents were loaded but produced no text chunks
    #[error("corpus produced no chunks")]
    NoChunks,

    /// Embedding provider failed
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Index artifact missing on disk
    #[error("index not found at {}", path.display())]
    IndexNotFound { path: PathBuf },

    /// Index artifact present but unusable
    #[error("invalid index: {reason}")]
    InvalidIndex { reason: String },

    /// Index never loaded (search degrades instead of failing)
    #[error("knowledge base unavailable: {reason}")]
    Unavailable { reason: String },

    /// Invalid chunking or build configuration
    #[error("config error: {reason}")]
    Config { reason: String },

    /// Filesystem error
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal error
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors reported by an embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Configuration error (missing API key, invalid settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// API error (non-2xx response, rate limit, invalid request)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("parse error: {0}")]
    Parse(String),
}

/// Result type alias for knowledge operations.
pub type Result<T> = std::result::Result<T, KnowledgeError>;

/// Result type alias for embedding operations.
pub type EmbeddingResult<T> = std::result::Result<T, EmbeddingError>;

impl KnowledgeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
