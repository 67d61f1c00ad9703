//! End-to-end flow: page id → Notion fetch → flatten → title gate → diagram.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use notion_mermaid_markdown::flatten;
use notion_mermaid_notion::{NotionClient, NotionOptions, PageSource};
use notion_mermaid_shared::{AppConfig, FlattenedContent, PageId, Result, read_secret};

use crate::diagram::{self, DiagramModel, GeminiModel};

/// Message returned in place of a diagram when the titles differ.
pub const TITLE_MISMATCH_MESSAGE: &str = "Page title does not match";

/// Result of a flow run that reached the title comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Titles matched and the model produced a diagram.
    Generated { mermaid_code: String },
    /// The configured page has a different title; no model call was made.
    TitleMismatch { page_title: String },
}

impl FlowOutcome {
    /// Text for the `mermaid_code` response field.
    pub fn mermaid_code(&self) -> &str {
        match self {
            Self::Generated { mermaid_code } => mermaid_code,
            Self::TitleMismatch { .. } => TITLE_MISMATCH_MESSAGE,
        }
    }
}

/// The configured page plus the collaborators needed to turn it into a
/// diagram. Holds no per-request state.
#[derive(Clone)]
pub struct DiagramFlow {
    pages: Arc<dyn PageSource>,
    model: Arc<dyn DiagramModel>,
    page_id: PageId,
}

impl DiagramFlow {
    pub fn new(pages: Arc<dyn PageSource>, model: Arc<dyn DiagramModel>, page_id: PageId) -> Self {
        Self {
            pages,
            model,
            page_id,
        }
    }

    /// Build the production flow: Notion client, Gemini model, and the
    /// page id from `config`. Secrets come from the configured env vars.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let page_id = PageId::parse(&config.notion.page_id)?;

        let notion_token = read_secret(&config.notion.token_env)?;
        let pages = NotionClient::new(notion_token, &NotionOptions::from(&config.notion))?;

        let llm_key = read_secret(&config.llm.api_key_env)?;
        let model = GeminiModel::new(llm_key, &config.llm)?;

        Ok(Self::new(Arc::new(pages), Arc::new(model), page_id))
    }

    pub fn page_id(&self) -> &PageId {
        &self.page_id
    }

    /// Fetch and flatten the configured page.
    pub async fn fetch_content(&self) -> Result<FlattenedContent> {
        let page = self.pages.fetch_page(&self.page_id).await?;
        Ok(flatten(&page))
    }

    /// Run the flow for a requested title.
    ///
    /// The model is only called when `requested_title` equals the page
    /// title exactly.
    #[instrument(skip(self), fields(page_id = %self.page_id))]
    pub async fn run(&self, requested_title: &str) -> Result<FlowOutcome> {
        info!("initiating flow");
        let content = self.fetch_content().await?;

        if content.title != requested_title {
            warn!(page_title = %content.title, "requested title does not match page");
            return Ok(FlowOutcome::TitleMismatch {
                page_title: content.title,
            });
        }

        let mermaid_code = diagram::generate_diagram(self.model.as_ref(), &content).await?;
        Ok(FlowOutcome::Generated { mermaid_code })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use notion_mermaid_shared::{
        Block, BlockKind, NamedProperty, NotionMermaidError, Page, PropertyValue, RichText,
        TextPayload,
    };

    use super::*;

    const PAGE_ID: &str = "1f8e4db1914180329177d006eb1a8595";

    struct StaticPage(Page);

    #[async_trait]
    impl PageSource for StaticPage {
        async fn fetch_page(&self, _page_id: &PageId) -> Result<Page> {
            Ok(self.0.clone())
        }
    }

    struct FailingPages;

    #[async_trait]
    impl PageSource for FailingPages {
        async fn fetch_page(&self, _page_id: &PageId) -> Result<Page> {
            Err(NotionMermaidError::Network("connection refused".into()))
        }
    }

    #[derive(Default)]
    struct CountingModel {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl DiagramModel for CountingModel {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NotionMermaidError::Llm("quota exceeded".into()));
            }
            assert!(prompt.contains("OSI Layer"));
            Ok("```mermaid\ngraph TD\nA[Physical] --> B[Network]\n```".into())
        }
    }

    fn text(s: &str) -> TextPayload {
        TextPayload {
            rich_text: vec![RichText::plain(s)],
        }
    }

    fn osi_page() -> Page {
        Page {
            id: PAGE_ID.into(),
            properties: vec![NamedProperty {
                name: "title".into(),
                value: PropertyValue::Title {
                    title: vec![RichText::plain("OSI Layer")],
                },
            }],
            blocks: vec![
                Block::new(BlockKind::Heading1 {
                    heading_1: text("Layers"),
                }),
                Block::new(BlockKind::Paragraph {
                    paragraph: text("Physical, Data Link, Network"),
                }),
            ],
        }
    }

    fn flow_with(pages: Arc<dyn PageSource>, model: Arc<CountingModel>) -> DiagramFlow {
        DiagramFlow::new(pages, model, PageId::parse(PAGE_ID).unwrap())
    }

    #[tokio::test]
    async fn matching_title_generates_clean_diagram() {
        let model = Arc::new(CountingModel::default());
        let flow = flow_with(Arc::new(StaticPage(osi_page())), Arc::clone(&model));

        let outcome = flow.run("OSI Layer").await.unwrap();

        let code = outcome.mermaid_code();
        assert!(!code.is_empty());
        assert!(!code.contains("```"));
        assert!(matches!(outcome, FlowOutcome::Generated { .. }));
        assert_eq!(model.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn mismatched_title_skips_model() {
        let model = Arc::new(CountingModel::default());
        let flow = flow_with(Arc::new(StaticPage(osi_page())), Arc::clone(&model));

        let outcome = flow.run("TCP/IP Model").await.unwrap();

        assert_eq!(outcome.mermaid_code(), TITLE_MISMATCH_MESSAGE);
        assert_eq!(
            outcome,
            FlowOutcome::TitleMismatch {
                page_title: "OSI Layer".into()
            }
        );
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn title_comparison_is_exact() {
        let model = Arc::new(CountingModel::default());
        let flow = flow_with(Arc::new(StaticPage(osi_page())), Arc::clone(&model));

        let outcome = flow.run("osi layer").await.unwrap();
        assert!(matches!(outcome, FlowOutcome::TitleMismatch { .. }));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn fetch_failure_propagates() {
        let model = Arc::new(CountingModel::default());
        let flow = flow_with(Arc::new(FailingPages), Arc::clone(&model));

        let err = flow.run("OSI Layer").await.unwrap_err();
        assert!(matches!(err, NotionMermaidError::Network(_)));
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn model_failure_propagates() {
        let model = Arc::new(CountingModel {
            fail: true,
            ..CountingModel::default()
        });
        let flow = flow_with(Arc::new(StaticPage(osi_page())), Arc::clone(&model));

        let err = flow.run("OSI Layer").await.unwrap_err();
        assert!(matches!(err, NotionMermaidError::Llm(_)));
    }

    #[tokio::test]
    async fn fetch_content_flattens_page() {
        let model = Arc::new(CountingModel::default());
        let flow = flow_with(Arc::new(StaticPage(osi_page())), model);

        let content = flow.fetch_content().await.unwrap();
        assert_eq!(content.title, "OSI Layer");
        assert_eq!(content.content, ["# Layers", "Physical, Data Link, Network"]);
    }
}
