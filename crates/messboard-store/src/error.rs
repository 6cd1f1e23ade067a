use std::path::PathBuf;

/// Errors from record store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store cannot be reached or is refusing requests.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Persisted data exists but cannot be decoded.
    #[error("corrupt store file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl StoreError {
    /// `true` for failures that mean "try again later" rather than a bug.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Io(_))
    }
}

/// Result alias for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    /// Refused to store an empty payload.
    #[error("empty blob payload")]
    Empty,

    /// The id is not one this store could have issued.
    #[error("invalid blob id: {0}")]
    InvalidId(String),

    /// The blob backend cannot be reached.
    #[error("blob store unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying blob backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for blob store operations.
pub type BlobResult<T> = Result<T, BlobError>;
