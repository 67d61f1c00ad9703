//! HTTP API for notion-mermaid.
//!
//! Serves two routes on top of [`DiagramFlow`]:
//! - `GET /` returns a static welcome message
//! - `POST /generate-mermaid-code` takes `{"title": ...}` and answers
//!   `{"mermaid_code": ...}`
//!
//! CORS is open to every origin, method, and header.

mod app;
mod error;
mod handlers;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tracing::{error, info};

use notion_mermaid_core::DiagramFlow;
use notion_mermaid_shared::{NotionMermaidError, Result, ServerConfig};

use crate::state::AppState;

/// Build the router for `flow` without binding a socket.
pub fn router(flow: DiagramFlow) -> Router {
    app::create_router(Arc::new(AppState { flow }))
}

/// Bind `config.host:config.port` and serve until Ctrl-C.
pub async fn run_server(config: &ServerConfig, flow: DiagramFlow) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| {
            NotionMermaidError::config(format!(
                "invalid listen address {}:{}: {e}",
                config.host, config.port
            ))
        })?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| NotionMermaidError::Server(format!("failed to bind {addr}: {e}")))?;

    info!(address = %addr, page_id = %flow.page_id(), "starting server");

    axum::serve(listener, router(flow))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| NotionMermaidError::Server(e.to_string()))
}

/// Wait for shutdown signal (Ctrl-C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("failed to listen for Ctrl-C: {e}");
        return;
    }
    info!("shutdown signal received, stopping server");
}
