use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The key was never written, or its record has expired.
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("duplicate key: {0}")]
    Conflict(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
