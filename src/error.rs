//! Error types for the knowledge base.

use thiserror::Error;

use crate::generator::GeneratorError;

/// Result type alias using the knowledge base's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Content or tag id does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Malformed request (blank query, blank title, ...)
    #[error("invalid request: {0}")]
    Validation(String),

    /// Underlying SQLite failure; the enclosing transaction was rolled back
    #[error("store failure: {0}")]
    Store(#[from] rusqlite::Error),

    /// Stored vector bytes disagree with the recorded dimension count
    #[error("corrupt embedding for content {content_id}: {reason}")]
    CorruptEmbedding { content_id: i64, reason: String },

    /// Embedding or summarization call failed or timed out
    #[error("generator failure: {0}")]
    Generator(#[from] GeneratorError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn content_not_found(id: i64) -> Self {
        Self::NotFound {
            kind: "content",
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
