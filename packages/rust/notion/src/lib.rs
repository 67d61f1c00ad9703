//! Notion page retrieval.
//!
//! Fetches a page's metadata and its full block tree from the Notion REST
//! API. Block children are listed page by page (following `next_cursor`)
//! and every block flagged `has_children` is expanded recursively, so the
//! returned [`Page`] carries the complete tree.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument};
use url::Url;

use notion_mermaid_shared::{Block, NotionConfig, NotionMermaidError, Page, PageId, Result};

/// Largest page size the block children endpoint accepts.
const PAGE_SIZE: &str = "100";

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY: usize = 300;

/// User-Agent string for Notion requests.
const USER_AGENT: &str = concat!("notion-mermaid/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// PageSource
// ---------------------------------------------------------------------------

/// Anything that can produce a fully expanded page.
///
/// The HTTP layer depends on this seam rather than on [`NotionClient`]
/// directly so tests can serve canned pages.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch page metadata plus the complete block tree.
    async fn fetch_page(&self, page_id: &PageId) -> Result<Page>;
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Connection settings for the Notion API.
#[derive(Debug, Clone)]
pub struct NotionOptions {
    /// Base URL, without the `/v1` suffix.
    pub api_base: String,
    /// Value of the `Notion-Version` header.
    pub api_version: String,
    /// Timeout for each HTTP request in seconds.
    pub timeout_secs: u64,
}

impl Default for NotionOptions {
    fn default() -> Self {
        Self::from(&NotionConfig::default())
    }
}

impl From<&NotionConfig> for NotionOptions {
    fn from(config: &NotionConfig) -> Self {
        Self {
            api_base: config.api_base.clone(),
            api_version: config.api_version.clone(),
            timeout_secs: config.timeout_secs,
        }
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// One page of a block children listing.
#[derive(Debug, Deserialize)]
struct BlockList {
    #[serde(default)]
    results: Vec<Block>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    next_cursor: Option<String>,
}

/// Error object returned by the API on non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

// ---------------------------------------------------------------------------
// NotionClient
// ---------------------------------------------------------------------------

/// Bearer-token client for the pages and blocks endpoints.
pub struct NotionClient {
    client: Client,
    base: Url,
    token: String,
    api_version: String,
}

impl NotionClient {
    /// Create a client authenticated with the given integration token.
    pub fn new(token: impl Into<String>, opts: &NotionOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(opts.timeout_secs))
            .build()
            .map_err(|e| {
                NotionMermaidError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base: base_url(&opts.api_base)?,
            token: token.into(),
            api_version: opts.api_version.clone(),
        })
    }

    /// Fetch a page and its complete block tree.
    ///
    /// Any failed request fails the whole call; nothing partial is returned.
    #[instrument(skip(self), fields(page_id = %page_id))]
    pub async fn fetch_page(&self, page_id: &PageId) -> Result<Page> {
        let mut page: Page = self
            .get_json(&format!("v1/pages/{page_id}"), &[])
            .await?;

        page.blocks = self.fetch_block_tree(page_id.as_str()).await?;

        info!(
            properties = page.properties.len(),
            root_blocks = page.blocks.len(),
            "page fetched"
        );
        Ok(page)
    }

    /// List the immediate children of a block, following pagination.
    ///
    /// An empty list means the block has no children; failures are errors.
    #[instrument(skip(self))]
    pub async fn list_children(&self, block_id: &str) -> Result<Vec<Block>> {
        let path = format!("v1/blocks/{block_id}/children");
        let mut blocks = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![("page_size", PAGE_SIZE)];
            if let Some(c) = cursor.as_deref() {
                query.push(("start_cursor", c));
            }

            let list: BlockList = self.get_json(&path, &query).await?;
            blocks.extend(list.results);

            match list.next_cursor {
                Some(next) if list.has_more => cursor = Some(next),
                _ => break,
            }
        }

        debug!(count = blocks.len(), "listed block children");
        Ok(blocks)
    }

    /// List children of `block_id` and expand every block that reports
    /// children of its own. Depth is bounded only by the server's flags.
    fn fetch_block_tree<'a>(
        &'a self,
        block_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Block>>> + Send + 'a>> {
        Box::pin(async move {
            let listed = self.list_children(block_id).await?;
            let mut blocks = Vec::with_capacity(listed.len());
            for block in listed {
                if block.has_children {
                    let children = self.fetch_block_tree(&block.id).await?;
                    blocks.push(block.with_children(children));
                } else {
                    blocks.push(block);
                }
            }
            Ok(blocks)
        })
    }

    /// GET an API path and decode the JSON body.
    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self
            .base
            .join(path)
            .map_err(|e| NotionMermaidError::validation(format!("bad API path {path}: {e}")))?;

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(&self.token)
            .header("Notion-Version", &self.api_version)
            .header(CONTENT_TYPE, "application/json")
            .query(query)
            .send()
            .await
            .map_err(|e| NotionMermaidError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NotionMermaidError::Network(format!("{url}: failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(NotionMermaidError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| NotionMermaidError::parse(format!("{url}: invalid JSON response: {e}")))
    }
}

#[async_trait]
impl PageSource for NotionClient {
    async fn fetch_page(&self, page_id: &PageId) -> Result<Page> {
        NotionClient::fetch_page(self, page_id).await
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse the API base, making sure relative joins append to its path.
fn base_url(raw: &str) -> Result<Url> {
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&with_slash)
        .map_err(|e| NotionMermaidError::config(format!("invalid Notion API base {raw:?}: {e}")))
}

/// Best-effort readable message from an error response body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) if !err.code.is_empty() => format!("{}: {}", err.code, err.message),
        _ => body.chars().take(MAX_ERROR_BODY).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notion_mermaid_shared::BlockKind;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE_ID: &str = "1f8e4db1914180329177d006eb1a8595";

    fn fixture(name: &str) -> String {
        std::fs::read_to_string(format!("../../../fixtures/json/{name}")).expect("read fixture")
    }

    fn client_for(server: &MockServer) -> NotionClient {
        let opts = NotionOptions {
            api_base: server.uri(),
            ..NotionOptions::default()
        };
        NotionClient::new("secret-token", &opts).unwrap()
    }

    fn empty_list() -> serde_json::Value {
        serde_json::json!({ "object": "list", "results": [], "has_more": false, "next_cursor": null })
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let base = base_url("http://localhost:3000/proxy").unwrap();
        assert_eq!(
            base.join("v1/pages/x").unwrap().as_str(),
            "http://localhost:3000/proxy/v1/pages/x"
        );
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"object":"error","status":404,"code":"object_not_found","message":"Could not find page"}"#;
        assert_eq!(api_error_message(body), "object_not_found: Could not find page");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_fetch_page_with_nested_children() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v1/pages/{PAGE_ID}")))
            .and(header("Authorization", "Bearer secret-token"))
            .and(header("Notion-Version", "2022-06-28"))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture("page.fixture.json")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/v1/blocks/{PAGE_ID}/children")))
            .and(header("Authorization", "Bearer secret-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixture("blocks.root.fixture.json")),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/blocks/b-list/children"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixture("blocks.child.fixture.json")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let page = client
            .fetch_page(&PageId::parse(PAGE_ID).unwrap())
            .await
            .unwrap();

        let names: Vec<&str> = page.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Summary", "title", "Category"]);
        assert_eq!(page.blocks.len(), 3);

        // Only the block flagged has_children gets a children list
        assert!(page.blocks[0].children.is_none());
        assert!(page.blocks[2].children.is_none());
        assert!(page.blocks[1].has_children);
        let children = page.blocks[1].children.as_ref().expect("children attached");
        assert_eq!(children.len(), 1);
        assert!(matches!(children[0].kind, BlockKind::NumberedListItem { .. }));
        assert_eq!(page.blocks[2].kind, BlockKind::Unsupported);
    }

    #[tokio::test]
    async fn test_list_children_follows_cursor() {
        let server = MockServer::start().await;

        let first = serde_json::json!({
            "object": "list",
            "results": [{ "id": "a", "type": "paragraph", "paragraph": { "rich_text": [] } }],
            "has_more": true,
            "next_cursor": "cursor-2"
        });
        let second = serde_json::json!({
            "object": "list",
            "results": [{ "id": "b", "type": "paragraph", "paragraph": { "rich_text": [] } }],
            "has_more": false,
            "next_cursor": null
        });

        Mock::given(method("GET"))
            .and(path("/v1/blocks/parent/children"))
            .and(query_param_is_missing("start_cursor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(first))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/blocks/parent/children"))
            .and(query_param("start_cursor", "cursor-2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(second))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let blocks = client.list_children("parent").await.unwrap();

        let ids: Vec<&str> = blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[tokio::test]
    async fn test_page_error_status_propagates() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v1/pages/{PAGE_ID}")))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "object": "error",
                "status": 404,
                "code": "object_not_found",
                "message": "Could not find page"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_page(&PageId::parse(PAGE_ID).unwrap())
            .await
            .unwrap_err();

        match err {
            NotionMermaidError::Api { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("object_not_found"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_child_fetch_failure_is_not_swallowed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v1/pages/{PAGE_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(fixture("page.fixture.json")))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path(format!("/v1/blocks/{PAGE_ID}/children")))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(fixture("blocks.root.fixture.json")),
            )
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/blocks/b-list/children"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_page(&PageId::parse(PAGE_ID).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, NotionMermaidError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_empty_children_is_ok() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/blocks/leaf/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(empty_list()))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let blocks = client.list_children("leaf").await.unwrap();
        assert!(blocks.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(format!("/v1/pages/{PAGE_ID}")))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .fetch_page(&PageId::parse(PAGE_ID).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, NotionMermaidError::Parse { .. }));
    }
}
