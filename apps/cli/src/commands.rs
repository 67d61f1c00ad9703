//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use notion_mermaid_core::{DiagramFlow, FlowOutcome};
use notion_mermaid_notion::{NotionClient, NotionOptions};
use notion_mermaid_shared::{
    AppConfig, PageId, init_config, load_config, load_config_from, read_secret,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// notion-mermaid — turn a Notion page into a Mermaid flowchart.
#[derive(Parser)]
#[command(
    name = "notion-mermaid",
    version,
    about = "Fetch a Notion page, flatten it, and ask an LLM for a Mermaid flowchart.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.notion-mermaid/notion-mermaid.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Serve the HTTP API.
    Serve {
        /// Address to bind.
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on.
        #[arg(short, long)]
        port: Option<u16>,

        /// Page to serve (id or Notion URL).
        #[arg(long, env = "NOTION_PAGE_ID")]
        page_id: Option<String>,
    },

    /// Run the flow once and print the diagram.
    Generate {
        /// Title the page is expected to have.
        title: String,

        /// Page to use (id or Notion URL).
        #[arg(long, env = "NOTION_PAGE_ID")]
        page_id: Option<String>,
    },

    /// Fetch a page and print its flattened content as JSON.
    Fetch {
        /// Page to fetch (id or Notion URL).
        #[arg(long, env = "NOTION_PAGE_ID")]
        page_id: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "notion_mermaid=info,tower_http=info",
        1 => "notion_mermaid=debug,tower_http=debug",
        _ => "notion_mermaid=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve {
            host,
            port,
            page_id,
        } => cmd_serve(config, host, port, page_id).await,
        Command::Generate { title, page_id } => cmd_generate(config, &title, page_id).await,
        Command::Fetch { page_id } => cmd_fetch(config, page_id).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Load the config file named on the command line, or the default one.
fn resolve_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Apply a `--page-id` override to the config.
fn with_page_id(mut config: AppConfig, page_id: Option<String>) -> AppConfig {
    if let Some(id) = page_id {
        config.notion.page_id = id;
    }
    config
}

async fn cmd_serve(
    config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    page_id: Option<String>,
) -> Result<()> {
    let mut config = with_page_id(config, page_id);
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let flow = DiagramFlow::from_config(&config).wrap_err("failed to set up diagram flow")?;
    notion_mermaid_server::run_server(&config.server, flow).await?;
    Ok(())
}

async fn cmd_generate(config: AppConfig, title: &str, page_id: Option<String>) -> Result<()> {
    let config = with_page_id(config, page_id);
    let flow = DiagramFlow::from_config(&config).wrap_err("failed to set up diagram flow")?;

    info!(%title, "generating diagram");
    let outcome = flow.run(title).await?;
    if let FlowOutcome::TitleMismatch { page_title } = &outcome {
        info!(%page_title, "page has a different title");
    }
    println!("{}", outcome.mermaid_code());
    Ok(())
}

async fn cmd_fetch(config: AppConfig, page_id: Option<String>) -> Result<()> {
    let config = with_page_id(config, page_id);
    let page_id = PageId::parse(&config.notion.page_id)?;

    let token = read_secret(&config.notion.token_env)?;
    let client = NotionClient::new(token, &NotionOptions::from(&config.notion))?;

    let page = client.fetch_page(&page_id).await?;
    let content = notion_mermaid_markdown::flatten(&page);
    println!("{}", serde_json::to_string_pretty(&content)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}
