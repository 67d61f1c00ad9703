//! Diagram generation endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use notion_mermaid_core::FlowOutcome;

use crate::error::ServerError;
use crate::state::AppState;

/// Request body for POST /generate-mermaid-code.
#[derive(Debug, Deserialize)]
pub(crate) struct GenerateRequest {
    /// Title the caller expects the configured page to have.
    title: String,
}

/// Response body for POST /generate-mermaid-code.
#[derive(Debug, Serialize)]
pub(crate) struct GenerateResponse {
    /// Diagram source, or the mismatch message.
    mermaid_code: String,
}

/// Handle POST /generate-mermaid-code.
///
/// A title mismatch answers `409 Conflict` but keeps the legacy body
/// `{"mermaid_code": "Page title does not match"}`.
pub(crate) async fn generate_mermaid_code(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), ServerError> {
    let outcome = state.flow.run(&request.title).await?;

    let status = match outcome {
        FlowOutcome::Generated { .. } => StatusCode::OK,
        FlowOutcome::TitleMismatch { .. } => StatusCode::CONFLICT,
    };

    Ok((
        status,
        Json(GenerateResponse {
            mermaid_code: outcome.mermaid_code().to_string(),
        }),
    ))
}
