//! Error types for notion-mermaid.
//!
//! Library crates use [`NotionMermaidError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all notion-mermaid operations.
#[derive(Debug, thiserror::Error)]
pub enum NotionMermaidError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport failure talking to a remote service.
    #[error("network error: {0}")]
    Network(String),

    /// A remote API answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// LLM request or response error.
    #[error("llm error: {0}")]
    Llm(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// HTTP server startup or runtime failure.
    #[error("server error: {0}")]
    Server(String),

    /// Input validation error (malformed page id, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, NotionMermaidError>;

impl NotionMermaidError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True when the failure came from an upstream service rather than
    /// from local configuration or input.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Api { .. } | Self::Parse { .. } | Self::Llm(_)
        )
    }
}
