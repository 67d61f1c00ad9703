//! Mermaid instruction template.

use notion_mermaid_shared::{FlattenedContent, Result};

/// Placeholder replaced with the serialized page content.
const CONTENT_PLACEHOLDER: &str = "{content}";

/// Instruction template sent to the model. The Mermaid caveats are part of
/// the instructions and must reach the model unchanged.
pub const MERMAID_PROMPT: &str = "\
You are a mermaid expert. You are given a content for a software and you have to convert it into mermaid flowchart code.


Please make sure that the mermaid code is correct and can be rendered by mermaid. Make simple mermaid code not more than 6 lines
Example of mermaid code :

   \"graph TD
    A[Enter Chart Definition] --> B(Preview)
    B --> C[decide]
    C --> D[Keep]
    C --> E[Edit Definition]
    E --> B
    D --> F[Save Image and Code]
    F --> B\"


And make sure that it has nothing else except the mermaid code.Also don't add any styling to mermaid
Some recommendation:
If you are using the word \"end\" in a Flowchart node, capitalize the entire word or any of the letters (e.g., \"End\" or \"END\"), or apply this workaround. Typing \"end\" in all lowercase letters will break the Flowchart.
If you are using the letter \"o\" or \"x\" as the first letter in a connecting Flowchart node, add a space before the letter or capitalize the letter (e.g., \"dev--- ops\", \"dev---Ops\").

Typing \"A---oB\" will create a circle edge.

Typing \"A---xB\" will create a cross edge.
Possible FlowChart orientations are:

TB - Top to bottom
TD - Top-down/ same as top to bottom
BT - Bottom to top
RL - Right to left
LR - Left to right

The content is as follows:
{content}
";

/// Fill the template with the page content.
pub fn mermaid_prompt(content: &FlattenedContent) -> Result<String> {
    let text = content.to_prompt_text()?;
    Ok(MERMAID_PROMPT.replace(CONTENT_PLACEHOLDER, &text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_embedded_at_the_end() {
        let content = FlattenedContent {
            title: "OSI Layer".into(),
            properties: vec![],
            content: vec!["# Physical".into(), "• Bits on a wire".into()],
        };
        let prompt = mermaid_prompt(&content).unwrap();

        assert!(!prompt.contains(CONTENT_PLACEHOLDER));
        let tail = prompt.split("The content is as follows:").nth(1).unwrap();
        assert!(tail.contains("OSI Layer"));
        assert!(tail.contains("• Bits on a wire"));
    }

    #[test]
    fn caveats_pass_through_verbatim() {
        let prompt = mermaid_prompt(&FlattenedContent::default()).unwrap();
        assert!(prompt.contains("Typing \"end\" in all lowercase letters will break the Flowchart."));
        assert!(prompt.contains("\"dev--- ops\", \"dev---Ops\""));
        assert!(prompt.contains("not more than 6 lines"));
    }
}
