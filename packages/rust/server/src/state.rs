//! Application state.
//!
//! Shared state for all request handlers.

use notion_mermaid_core::DiagramFlow;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Fetch-flatten-generate flow for the configured page.
    pub(crate) flow: DiagramFlow,
}
