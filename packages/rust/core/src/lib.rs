//! Core domain logic for notion-mermaid.
//!
//! Ties the Notion fetcher, the content flattener, and the LLM call into a
//! single flow that turns one configured page into Mermaid flowchart code.

pub mod diagram;
pub mod flow;
pub mod prompt;

pub use diagram::{DiagramModel, GeminiModel, generate_diagram, strip_fences};
pub use flow::{DiagramFlow, FlowOutcome, TITLE_MISMATCH_MESSAGE};
