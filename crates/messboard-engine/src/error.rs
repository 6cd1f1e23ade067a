use messboard_store::StoreError;
use thiserror::Error;

/// Errors surfaced by lifecycle operations.
///
/// Blob-store failures never appear here: image cleanup is best-effort and
/// only logged.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Client input is missing a required field or carries a bad value.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("record not found: {0}")]
    NotFound(String),

    /// The record store could not be reached.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Anything else. The message is for logs, not for clients.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        if err.is_unavailable() {
            Self::StoreUnavailable(err.to_string())
        } else {
            Self::Unexpected(err.to_string())
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_classified() {
        let e: EngineError = StoreError::Unavailable("timeout".into()).into();
        assert!(matches!(e, EngineError::StoreUnavailable(_)));

        let e: EngineError = StoreError::Serialization("bad".into()).into();
        assert!(matches!(e, EngineError::Unexpected(_)));
    }
}
