use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid record id: {0}")]
    InvalidRecordId(String),

    #[error("unknown menu type {0:?}, expected one of: veg, non-veg, budget")]
    InvalidMenuCategory(String),
}
