//! Single-block rendering: one Markdown-ish line per recognized block.

use notion_mermaid_shared::{BlockKind, plain_text};

/// Marker placed before bulleted list items.
const BULLET: &str = "•";

/// Render a block's own line, without its children.
///
/// Returns `None` for unsupported block types and for blocks whose text
/// is empty.
pub(crate) fn render_line(kind: &BlockKind) -> Option<String> {
    let line = match kind {
        BlockKind::Paragraph { paragraph } => non_empty(plain_text(&paragraph.rich_text))?,
        BlockKind::Heading1 { heading_1 } => heading(1, &plain_text(&heading_1.rich_text))?,
        BlockKind::Heading2 { heading_2 } => heading(2, &plain_text(&heading_2.rich_text))?,
        BlockKind::Heading3 { heading_3 } => heading(3, &plain_text(&heading_3.rich_text))?,
        BlockKind::BulletedListItem { bulleted_list_item } => {
            let text = non_empty(plain_text(&bulleted_list_item.rich_text))?;
            format!("{BULLET} {text}")
        }
        // Ordinals are not tracked across siblings; every item renders as "1."
        BlockKind::NumberedListItem { numbered_list_item } => {
            let text = non_empty(plain_text(&numbered_list_item.rich_text))?;
            format!("1. {text}")
        }
        BlockKind::Code { code } => {
            let text = non_empty(plain_text(&code.rich_text))?;
            format!("```{}\n{text}\n```", code.language)
        }
        BlockKind::Unsupported => return None,
    };
    Some(line)
}

fn heading(level: usize, text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    Some(format!("{} {text}", "#".repeat(level)))
}

fn non_empty(text: String) -> Option<String> {
    (!text.is_empty()).then_some(text)
}
