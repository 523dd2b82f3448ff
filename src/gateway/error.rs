use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::store::StoreError;
use crate::verify::VerifyError;

use super::status_headers;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Verification(#[from] VerifyError),

    #[error("reference reload failed: {0}")]
    ReloadFailed(#[from] StoreError),
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl GatewayError {
    /// HTTP status and `x-landmark-status` label.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::Verification(VerifyError::UnknownLandmark { .. }) => {
                (StatusCode::NOT_FOUND, "unknown_landmark")
            }
            GatewayError::Verification(VerifyError::EmbeddingFailed(e)) => {
                let status = match e {
                    _ if e.is_client_error() => StatusCode::UNPROCESSABLE_ENTITY,
                    EmbeddingError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, "embedding_failed")
            }
            GatewayError::Verification(VerifyError::Store(_)) | GatewayError::ReloadFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, label) = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, status_headers(label), body).into_response()
    }
}
