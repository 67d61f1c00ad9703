//! Shared types, error model, and configuration for notion-mermaid.
//!
//! This crate is the foundation depended on by all other notion-mermaid crates.
//! It provides:
//! - [`NotionMermaidError`] — the unified error type
//! - Domain types ([`Page`], [`Block`], [`FlattenedContent`], [`PageId`])
//! - Configuration ([`AppConfig`], config loading, secret lookup)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LlmConfig, NotionConfig, ServerConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, read_secret,
};
pub use error::{NotionMermaidError, Result};
pub use types::{
    Block, BlockKind, CodePayload, FlattenedContent, NamedProperty, Page, PageId, PropertyValue,
    RenderedProperty, RichText, SelectOption, TextPayload, plain_text,
};
