//! Page-to-text flattening.
//!
//! Turns a fetched Notion [`Page`] into [`FlattenedContent`]: the page
//! title, its simple properties rendered as strings, and one Markdown-ish
//! line per recognized block in pre-order (a block's own line comes before
//! the lines of its children).

mod render;

use tracing::{debug, instrument};

use notion_mermaid_shared::{
    Block, FlattenedContent, NamedProperty, Page, PropertyValue, RenderedProperty, plain_text,
};

// ---------------------------------------------------------------------------
// Flattener
// ---------------------------------------------------------------------------

/// Flatten a page into its title, rendered properties, and content lines.
#[instrument(skip_all, fields(page_id = %page.id))]
pub fn flatten(page: &Page) -> FlattenedContent {
    let title = extract_title(&page.properties);
    let properties = render_properties(&page.properties);

    let mut content = Vec::new();
    flatten_blocks(&page.blocks, &mut content);

    debug!(
        title = %title,
        properties = properties.len(),
        lines = content.len(),
        "page flattened"
    );

    FlattenedContent {
        title,
        properties,
        content,
    }
}

/// Append the lines of `blocks` (and their descendants) to `out`.
///
/// Children are visited even when their parent rendered no line.
pub fn flatten_blocks(blocks: &[Block], out: &mut Vec<String>) {
    for block in blocks {
        if let Some(line) = render::render_line(&block.kind) {
            out.push(line);
        }
        if let Some(children) = &block.children {
            flatten_blocks(children, out);
        }
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

/// Text of the first `title`-typed property, or empty if there is none.
pub fn extract_title(properties: &[NamedProperty]) -> String {
    properties
        .iter()
        .find_map(|p| match &p.value {
            PropertyValue::Title { title } => Some(plain_text(title)),
            _ => None,
        })
        .unwrap_or_default()
}

/// Render every non-title property with a supported type.
///
/// Unset selects and unsupported types are skipped.
fn render_properties(properties: &[NamedProperty]) -> Vec<RenderedProperty> {
    properties
        .iter()
        .filter_map(|p| {
            let value = match &p.value {
                PropertyValue::RichText { rich_text } => plain_text(rich_text),
                PropertyValue::Select { select: Some(option) } => option.name.clone(),
                PropertyValue::Title { .. }
                | PropertyValue::Select { select: None }
                | PropertyValue::Unsupported => return None,
            };
            Some(RenderedProperty {
                name: p.name.clone(),
                value,
            })
        })
        .collect()
}
