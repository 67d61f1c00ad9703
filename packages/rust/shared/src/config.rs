//! Application configuration for notion-mermaid.
//!
//! User config lives at `~/.notion-mermaid/notion-mermaid.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file, only the names of the
//! environment variables holding them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{NotionMermaidError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "notion-mermaid.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".notion-mermaid";

// ---------------------------------------------------------------------------
// Config structs (matching notion-mermaid.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Notion API settings.
    #[serde(default)]
    pub notion: NotionConfig,

    /// LLM settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// `[notion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Name of the env var holding the integration token.
    #[serde(default = "default_notion_token_env")]
    pub token_env: String,

    /// Page served by the diagram endpoint.
    #[serde(default = "default_page_id")]
    pub page_id: String,

    /// API base URL (without the `/v1` suffix).
    #[serde(default = "default_notion_api_base")]
    pub api_base: String,

    /// Value sent in the `Notion-Version` header.
    #[serde(default = "default_notion_version")]
    pub api_version: String,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token_env: default_notion_token_env(),
            page_id: default_page_id(),
            api_base: default_notion_api_base(),
            api_version: default_notion_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_notion_token_env() -> String {
    "NOTION_API".into()
}
fn default_page_id() -> String {
    "1f8e4db1914180329177d006eb1a8595".into()
}
fn default_notion_api_base() -> String {
    "https://api.notion.com".into()
}
fn default_notion_version() -> String {
    "2022-06-28".into()
}
fn default_timeout_secs() -> u64 {
    30
}

/// `[llm]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// Model used for diagram generation.
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL.
    #[serde(default = "default_llm_api_base")]
    pub api_base: String,

    /// Per-request timeout.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_llm_key_env(),
            model: default_model(),
            api_base: default_llm_api_base(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_llm_key_env() -> String {
    "GOOGLE_API_KEY".into()
}
fn default_model() -> String {
    "gemini-2.0-flash".into()
}
fn default_llm_api_base() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_llm_timeout_secs() -> u64 {
    60
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.notion-mermaid/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| NotionMermaidError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.notion-mermaid/notion-mermaid.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| NotionMermaidError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        NotionMermaidError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| NotionMermaidError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| NotionMermaidError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| NotionMermaidError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a secret from the named environment variable.
///
/// Fails with a config error when the variable is unset or empty.
pub fn read_secret(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(NotionMermaidError::config(format!(
            "secret not found. Set the {var_name} environment variable."
        ))),
    }
}
