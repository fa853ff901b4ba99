//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use softhelp_rag::RagError;

/// An error rendered as an HTTP status with a JSON `detail` body.
#[derive(Debug)]
pub struct ApiError {
    /// The HTTP status to respond with.
    pub status: StatusCode,
    /// A human-readable description for the client.
    pub detail: String,
}

impl ApiError {
    /// A 400 with the given detail.
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, detail: detail.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<RagError> for ApiError {
    fn from(error: RagError) -> Self {
        let status = match &error {
            // The knowledge base is unusable; retrying won't help until it
            // is fixed and reindexed.
            RagError::CorpusNotFound(_) | RagError::EmptyCorpus(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            // An upstream hosted service failed.
            RagError::EmbeddingService { .. } | RagError::AnswerService { .. } => {
                StatusCode::BAD_GATEWAY
            }
            RagError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, detail: error.to_string() }
    }
}
