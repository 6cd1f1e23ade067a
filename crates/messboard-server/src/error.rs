use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use messboard_engine::EngineError;
use messboard_store::BlobError;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

const INTERNAL_MESSAGE: &str = "internal server error";
const UNAVAILABLE_MESSAGE: &str = "record store temporarily unavailable";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("blob error: {0}")]
    Blob(#[from] BlobError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Status code and client-facing message. Internal detail stays in logs.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Engine(EngineError::Validation(msg)) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Engine(EngineError::NotFound(_)) => (StatusCode::NOT_FOUND, self.to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Engine(EngineError::StoreUnavailable(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                UNAVAILABLE_MESSAGE.to_string(),
            ),
            Self::Blob(BlobError::Empty) => {
                (StatusCode::BAD_REQUEST, BlobError::Empty.to_string())
            }
            Self::Blob(BlobError::InvalidId(id)) => {
                (StatusCode::NOT_FOUND, format!("blob not found: {id}"))
            }
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::PayloadTooLarge { .. } => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            Self::Engine(EngineError::Unexpected(_))
            | Self::Blob(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                INTERNAL_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "request rejected");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}
