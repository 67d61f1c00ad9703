//! Mapping of flow errors onto HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use notion_mermaid_shared::NotionMermaidError;

/// Error body: `{"error": "<message>"}`.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Handler error wrapping the shared error type.
#[derive(Debug)]
pub(crate) struct ServerError(pub(crate) NotionMermaidError);

impl From<NotionMermaidError> for ServerError {
    fn from(err: NotionMermaidError) -> Self {
        Self(err)
    }
}

impl ServerError {
    /// Upstream failures (Notion, LLM) are gateway errors; everything else
    /// is a local fault.
    fn status(&self) -> StatusCode {
        if self.0.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::error!(status = %status, error = %self.0, "request failed");
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
