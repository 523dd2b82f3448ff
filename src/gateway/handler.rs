use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{info, instrument};

use crate::gateway::error::GatewayError;
use crate::gateway::state::HandlerState;
use crate::gateway::{STATUS_MATCHED, STATUS_NOT_MATCHED, STATUS_READY, status_headers};
use crate::store::LandmarkSummary;

/// `POST /v1/landmarks/{landmark}/verify` with the raw image as body.
#[instrument(skip(state, body), fields(body_len = body.len()))]
pub async fn verify_handler(
    State(state): State<HandlerState>,
    Path(landmark): Path<String>,
    body: Bytes,
) -> Result<Response, GatewayError> {
    let landmark = landmark.trim();
    if landmark.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "landmark must not be empty".to_string(),
        ));
    }

    let result = state.verifier.verify(landmark, &body).await?;

    let status = if result.matched {
        STATUS_MATCHED
    } else {
        STATUS_NOT_MATCHED
    };

    Ok((StatusCode::OK, status_headers(status), Json(result)).into_response())
}

#[derive(Debug, serde::Serialize)]
pub struct LandmarksResponse {
    pub generation: u64,
    pub landmarks: Vec<LandmarkSummary>,
}

/// `GET /v1/landmarks`.
#[instrument(skip(state))]
pub async fn list_landmarks_handler(State(state): State<HandlerState>) -> Response {
    let snapshot = state.verifier.store().snapshot();
    let body = LandmarksResponse {
        generation: snapshot.generation(),
        landmarks: snapshot.landmarks(),
    };

    (StatusCode::OK, status_headers(STATUS_READY), Json(body)).into_response()
}

/// `POST /v1/references/reload`: rebuilds the store from its artifact source.
#[instrument(skip(state))]
pub async fn reload_handler(State(state): State<HandlerState>) -> Result<Response, GatewayError> {
    let store = state.verifier.store();
    let outcome = store.reload().await?;

    info!(
        source = %store.source_description(),
        generation = outcome.generation(),
        "Reload requested over HTTP"
    );

    Ok((StatusCode::OK, status_headers(STATUS_READY), Json(outcome)).into_response())
}
