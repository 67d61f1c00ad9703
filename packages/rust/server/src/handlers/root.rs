//! Welcome endpoint.

use axum::Json;
use serde::Serialize;

/// Response for GET /.
#[derive(Serialize)]
pub(crate) struct WelcomeResponse {
    message: &'static str,
}

/// Handle GET /.
pub(crate) async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Mermaid API!",
    })
}
