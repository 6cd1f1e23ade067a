use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::events;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all Messboard endpoints.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .route("/health", get(handler::health_handler))
        .route(
            "/records",
            get(handler::list_records)
                .post(handler::create_record)
                .delete(handler::sweep_expired),
        )
        .route("/records/expired", delete(handler::sweep_expired))
        .route("/records/:id", delete(handler::delete_record))
        .route("/upload", post(handler::upload_image))
        .route("/blobs/:id", get(handler::get_blob))
        .route("/events", get(events::events_handler))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
