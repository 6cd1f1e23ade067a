use std::future::Future;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, JsonRejection};
use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use messboard_engine::RecordInput;
use messboard_store::BlobRef;
use messboard_types::{ActiveRecord, RecordId};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

const DEFAULT_BLOB_TYPE: &str = "application/octet-stream";

/// Run `fut` on its own task so a dropped connection cannot cancel a write
/// halfway through.
async fn run_detached<F, T>(fut: F) -> ServerResult<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    tokio::spawn(fut)
        .await
        .map_err(|e| ServerError::Internal(format!("request task failed: {e}")))
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Active records, newest first. Never fails: a store outage yields `[]`.
pub async fn list_records(State(state): State<AppState>) -> Json<Vec<ActiveRecord>> {
    let now = state.engine.now();
    if state.config.sweep_on_read {
        let engine = state.engine.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.sweep(now).await {
                warn!(error = %e, "opportunistic sweep failed");
            }
        });
    }
    Json(state.engine.list_active(now).await)
}

pub async fn create_record(
    State(state): State<AppState>,
    payload: Result<Json<RecordInput>, JsonRejection>,
) -> ServerResult<(StatusCode, Json<ActiveRecord>)> {
    let Json(input) = payload.map_err(|e| ServerError::BadRequest(e.body_text()))?;
    let engine = state.engine.clone();
    let now = engine.now();
    let record = run_detached(async move { engine.create(input, now).await }).await??;
    Ok((StatusCode::CREATED, Json(state.engine.decorate(record, now))))
}

pub async fn delete_record(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> ServerResult<Json<Value>> {
    // An id that cannot name a record is reported the same as a missing one.
    let id: RecordId = raw_id
        .parse()
        .map_err(|_| ServerError::NotFound(format!("record not found: {raw_id}")))?;
    let engine = state.engine.clone();
    run_detached(async move { engine.delete_one(&id).await }).await??;
    Ok(Json(json!({
        "message": "Record deleted",
        "id": id,
    })))
}

/// Explicit sweep trigger.
pub async fn sweep_expired(State(state): State<AppState>) -> ServerResult<Json<Value>> {
    let engine = state.engine.clone();
    let now = engine.now();
    let report = run_detached(async move { engine.sweep(now).await }).await??;
    Ok(Json(json!({
        "message": format!("Deleted {} expired records", report.deleted_count),
        "deletedCount": report.deleted_count,
    })))
}

/// Store a raw image body and return its public URL and id.
pub async fn upload_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> ServerResult<Json<BlobRef>> {
    let limit = state.config.max_upload_bytes;
    let data = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge { limit }
        } else {
            ServerError::BadRequest(rejection.body_text())
        }
    })?;
    if data.is_empty() {
        return Err(ServerError::BadRequest("no image data provided".into()));
    }
    if data.len() > limit {
        return Err(ServerError::PayloadTooLarge { limit });
    }

    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let size = data.len();
    let blobs = state.blobs.clone();
    let blob =
        run_detached(async move { blobs.store(data, content_type.as_deref()).await }).await??;
    info!(blob = %blob.id, bytes = size, "image uploaded");
    Ok(Json(blob))
}

pub async fn get_blob(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ServerResult<Response> {
    let blob = state
        .blobs
        .fetch(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound(format!("blob not found: {id}")))?;
    let content_type = blob
        .content_type
        .unwrap_or_else(|| DEFAULT_BLOB_TYPE.to_string());
    Ok(([(CONTENT_TYPE, content_type)], blob.data).into_response())
}
