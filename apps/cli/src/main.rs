//! notion-mermaid CLI — serve the diagram API or run the flow once.
//!
//! Fetches a Notion page, flattens its blocks into text, and asks an LLM
//! for a Mermaid flowchart of the content.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
