//! Diagram generation: prompt the LLM with flattened page content and
//! clean the Mermaid code it returns.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use notion_mermaid_shared::{FlattenedContent, LlmConfig, NotionMermaidError, Result};

use crate::prompt;

/// User-Agent string for LLM requests.
const USER_AGENT: &str = concat!("notion-mermaid/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// DiagramModel
// ---------------------------------------------------------------------------

/// A single-shot text completion backend.
#[async_trait]
pub trait DiagramModel: Send + Sync {
    /// Send one prompt and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Build the prompt for `content`, ask the model, and strip code fences
/// from the answer. Model failures propagate unchanged; an answer that is
/// nothing but fences is an [`NotionMermaidError::Llm`] error.
#[instrument(skip_all, fields(title = %content.title, lines = content.content.len()))]
pub async fn generate_diagram(
    model: &dyn DiagramModel,
    content: &FlattenedContent,
) -> Result<String> {
    let prompt = prompt::mermaid_prompt(content)?;
    debug!(prompt_len = prompt.len(), "sending diagram prompt");

    let raw = model.complete(&prompt).await?;
    let code = strip_fences(&raw);
    if code.trim().is_empty() {
        return Err(NotionMermaidError::Llm("model returned no diagram".into()));
    }

    info!(code_len = code.len(), "diagram generated");
    Ok(code)
}

/// Remove Markdown code fence markers.
///
/// Text without any "```" is returned unchanged. Otherwise "```mermaid" and
/// then every remaining "```" are deleted and the result is trimmed. Only the
/// `mermaid` tag is special: any other tag stays in the text.
pub fn strip_fences(raw: &str) -> String {
    if !raw.contains("```") {
        return raw.to_string();
    }

    raw.replace("```mermaid", "")
        .replace("```", "")
        .trim()
        .to_string()
}

// ---------------------------------------------------------------------------
// Gemini backend
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Google Gemini `generateContent` client.
pub struct GeminiModel {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiModel {
    /// Create a client for the model named in `config`.
    pub fn new(api_key: impl Into<String>, config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotionMermaidError::Llm(format!("failed to build HTTP client: {e}")))?;

        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.api_base.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl DiagramModel for GeminiModel {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotionMermaidError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotionMermaidError::Llm(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(NotionMermaidError::Llm(format!("HTTP {status}: {message}")));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| NotionMermaidError::Llm(format!("invalid response JSON: {e}")))?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(NotionMermaidError::Llm("model returned no text".into()));
        }
        Ok(text)
    }
}
