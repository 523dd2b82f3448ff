//! HTTP gateway (Axum) for landmark verification.
//!
//! Used by the `landmark-verify` server binary. Every response carries an
//! [`LANDMARK_STATUS_HEADER`] describing the outcome.

pub mod error;
pub mod handler;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use error::{ErrorResponse, GatewayError};
pub use handler::{list_landmarks_handler, reload_handler, verify_handler};
pub use state::HandlerState;

/// Response header carrying the outcome label.
pub const LANDMARK_STATUS_HEADER: &str = "x-landmark-status";

pub const STATUS_HEALTHY: &str = "healthy";
pub const STATUS_READY: &str = "ready";
pub const STATUS_PENDING: &str = "pending";
pub const STATUS_MATCHED: &str = "matched";
pub const STATUS_NOT_MATCHED: &str = "not_matched";

pub fn create_router_with_state(state: HandlerState) -> Router {
    let body_limit = state.max_image_bytes;

    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/v1/landmarks", get(list_landmarks_handler))
        .route(
            "/v1/landmarks/{landmark}/verify",
            post(verify_handler).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/v1/references/reload", post(reload_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub generation: u64,
    pub landmarks: usize,
    pub references: usize,
    pub embedder_mode: &'static str,
}

pub(crate) fn status_headers(status: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(LANDMARK_STATUS_HEADER, HeaderValue::from_static(status));
    headers
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    (
        StatusCode::OK,
        status_headers(STATUS_HEALTHY),
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

/// Ready once the active snapshot holds at least one landmark.
#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let snapshot = state.verifier.store().snapshot();

    let is_ready = !snapshot.is_empty();
    let (status_code, status) = if is_ready {
        (StatusCode::OK, STATUS_READY)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, STATUS_PENDING)
    };
    let embedder_mode = if state.verifier.is_embedder_stub() {
        "stub"
    } else {
        "real"
    };

    (
        status_code,
        status_headers(status),
        Json(ReadyResponse {
            status,
            generation: snapshot.generation(),
            landmarks: snapshot.landmark_count(),
            references: snapshot.len(),
            embedder_mode,
        }),
    )
        .into_response()
}
