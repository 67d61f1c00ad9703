//! HTTP request handlers.

pub(crate) mod mermaid;
pub(crate) mod root;
