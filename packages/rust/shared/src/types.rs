//! Core domain types: Notion pages, blocks, and the flattened content
//! handed to the diagram generator.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{NotionMermaidError, Result};

/// Length of a Notion object id without separators.
const PAGE_ID_LEN: usize = 32;

// ---------------------------------------------------------------------------
// PageId
// ---------------------------------------------------------------------------

/// A normalized Notion page identifier (32 hex characters, no dashes).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Normalize a raw page reference.
    ///
    /// Accepts a bare id (with or without dashes), a page URL, or a
    /// `Title-Slug-<id>` path segment. Only the trailing path segment is
    /// considered, and only its trailing 32 characters once dashes are gone.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let segment = trimmed.rsplit('/').next().unwrap_or(trimmed);
        let segment = segment
            .split(['?', '#'])
            .next()
            .unwrap_or(segment);

        let compact: String = segment.chars().filter(|c| *c != '-').collect();
        if compact.len() < PAGE_ID_LEN {
            return Err(NotionMermaidError::validation(format!(
                "page id too short: {raw:?}"
            )));
        }

        let id = compact
            .get(compact.len() - PAGE_ID_LEN..)
            .unwrap_or_default();
        if id.len() != PAGE_ID_LEN || !id.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(NotionMermaidError::validation(format!(
                "page id is not hexadecimal: {raw:?}"
            )));
        }

        Ok(Self(id.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for PageId {
    type Err = NotionMermaidError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// Rich text
// ---------------------------------------------------------------------------

/// One styled text run. Only the rendered plain text is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub plain_text: String,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            plain_text: text.into(),
        }
    }
}

/// Concatenate the plain text of a run sequence, in order.
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|r| r.plain_text.as_str()).collect()
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Payload shared by all text-bearing block types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
}

/// Payload of a `code` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodePayload {
    #[serde(default)]
    pub rich_text: Vec<RichText>,
    #[serde(default)]
    pub language: String,
}

/// Block type tag plus its type-specific payload, keyed by the tag the
/// way the Notion API lays it out (`"type": "code", "code": {...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph {
        paragraph: TextPayload,
    },
    #[serde(rename = "heading_1")]
    Heading1 {
        heading_1: TextPayload,
    },
    #[serde(rename = "heading_2")]
    Heading2 {
        heading_2: TextPayload,
    },
    #[serde(rename = "heading_3")]
    Heading3 {
        heading_3: TextPayload,
    },
    BulletedListItem {
        bulleted_list_item: TextPayload,
    },
    NumberedListItem {
        numbered_list_item: TextPayload,
    },
    Code {
        code: CodePayload,
    },
    /// Any block type this crate does not render.
    #[serde(other)]
    Unsupported,
}

/// A node of a page's content tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub id: String,

    /// Server-reported flag: children exist and need a follow-up fetch.
    #[serde(default)]
    pub has_children: bool,

    #[serde(flatten)]
    pub kind: BlockKind,

    /// Populated by the fetcher, and only when `has_children` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
}

impl Block {
    /// A childless block of the given kind.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            id: String::new(),
            has_children: false,
            kind,
            children: None,
        }
    }

    /// Attach fetched children, keeping `has_children` consistent.
    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = true;
        self.children = Some(children);
        self
    }
}

// ---------------------------------------------------------------------------
// Pages and properties
// ---------------------------------------------------------------------------

/// Selected option of a `select` property.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    #[serde(default)]
    pub name: String,
}

/// A page property value, tagged by its Notion type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PropertyValue {
    Title {
        #[serde(default)]
        title: Vec<RichText>,
    },
    RichText {
        #[serde(default)]
        rich_text: Vec<RichText>,
    },
    Select {
        #[serde(default)]
        select: Option<SelectOption>,
    },
    #[serde(other)]
    Unsupported,
}

/// A property together with its name, in API order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedProperty {
    pub name: String,
    pub value: PropertyValue,
}

/// A Notion page: metadata plus its root-level blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub id: String,

    /// Properties in the order the API returned them.
    #[serde(default, deserialize_with = "deserialize_properties")]
    pub properties: Vec<NamedProperty>,

    /// Root blocks, attached by the fetcher.
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// Read the `properties` object into an ordered list.
fn deserialize_properties<'de, D>(deserializer: D) -> std::result::Result<Vec<NamedProperty>, D::Error>
where
    D: Deserializer<'de>,
{
    struct PropertiesVisitor;

    impl<'de> Visitor<'de> for PropertiesVisitor {
        type Value = Vec<NamedProperty>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of page properties")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut out = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, value)) = map.next_entry::<String, PropertyValue>()? {
                out.push(NamedProperty { name, value });
            }
            Ok(out)
        }
    }

    deserializer.deserialize_map(PropertiesVisitor)
}

// ---------------------------------------------------------------------------
// FlattenedContent
// ---------------------------------------------------------------------------

/// A non-title property rendered to a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedProperty {
    pub name: String,
    pub value: String,
}

/// Readable form of a page: title, rendered properties, and one line per
/// rendered block in pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlattenedContent {
    pub title: String,
    #[serde(default)]
    pub properties: Vec<RenderedProperty>,
    #[serde(default)]
    pub content: Vec<String>,
}

impl FlattenedContent {
    /// Serialized form embedded into LLM prompts.
    pub fn to_prompt_text(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| NotionMermaidError::parse(format!("failed to serialize content: {e}")))
    }
}
