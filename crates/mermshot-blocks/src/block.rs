//! Mermaid fenced block detection.

use std::sync::LazyLock;

use regex::Regex;

/// Opening `mermaid` fence up to the next generic closing fence.
///
/// The lazy body stops at the first closing fence, so matches never overlap.
/// An opening fence without a closing fence produces no match.
static MERMAID_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```mermaid\r?\n(.*?)```").unwrap());

const CLOSING_FENCE: &str = "```";

/// A Mermaid block located in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramBlock {
    /// Diagram source between the fences, trimmed.
    pub content: String,
    /// Byte offset of the opening fence.
    pub start_index: usize,
    /// Byte offset just past the closing fence.
    pub end_index: usize,
    /// Exact document text in `start_index..end_index`, fences included.
    pub full_match: String,
}

impl DiagramBlock {
    /// Length of the span in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    /// Whether the span is empty. Always `false` for extracted blocks.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fence text with the diagram source swapped for `content`.
    ///
    /// The fences and the whitespace around the source are kept as they
    /// appear in the document.
    #[must_use]
    pub fn with_content(&self, content: &str) -> String {
        let fence = &self.full_match;
        let open_len = fence.find('\n').map_or(0, |i| i + 1);
        let inner = &fence[open_len..fence.len() - CLOSING_FENCE.len()];
        let start = open_len + (inner.len() - inner.trim_start().len());
        let end = start + self.content.len();
        format!("{}{content}{}", &fence[..start], &fence[end..])
    }
}

/// Find all Mermaid blocks in document order.
///
/// Only ```` ```mermaid ```` fences are matched; every other fenced block is
/// left to the caller untouched.
#[must_use]
pub fn extract(document: &str) -> Vec<DiagramBlock> {
    MERMAID_FENCE
        .captures_iter(document)
        .map(|caps| {
            let whole = caps.get(0).unwrap();
            DiagramBlock {
                content: caps[1].trim().to_owned(),
                start_index: whole.start(),
                end_index: whole.end(),
                full_match: whole.as_str().to_owned(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_with_content_keeps_fences_and_padding() {
        let doc = "```mermaid\n\n  graph TD\n  A-->B\n\n```";
        let block = &extract(doc)[0];

        assert_eq!(block.content, "graph TD\n  A-->B");
        assert_eq!(
            block.with_content("graph TD\n  A --> B"),
            "```mermaid\n\n  graph TD\n  A --> B\n\n```"
        );
    }

    #[test]
    fn test_with_content_crlf() {
        let doc = "```mermaid\r\ngraph LR\r\n```";
        let block = &extract(doc)[0];

        assert_eq!(block.with_content("flowchart LR"), "```mermaid\r\nflowchart LR\r\n```");
    }

    #[test]
    fn test_extract_single_block() {
        let doc = "# Doc\n\n```mermaid\ngraph TD\n  A[Start] --> B[End]\n```\n";

        let blocks = extract(doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "graph TD\n  A[Start] --> B[End]");
        assert_eq!(blocks[0].start_index, 7);
        assert_eq!(blocks[0].end_index, doc.len() - 1);
        assert_eq!(
            blocks[0].full_match,
            "```mermaid\ngraph TD\n  A[Start] --> B[End]\n```"
        );
    }

    #[test]
    fn test_extract_multiple_blocks_in_order() {
        let doc = "```mermaid\ngraph TD\n  A --> B\n```\n\ntext\n\n```mermaid\nsequenceDiagram\n  A->>B: hi\n```\n";

        let blocks = extract(doc);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content, "graph TD\n  A --> B");
        assert_eq!(blocks[1].content, "sequenceDiagram\n  A->>B: hi");
        assert!(blocks[0].end_index <= blocks[1].start_index);
    }

    #[test]
    fn test_full_match_is_document_span() {
        let doc = "a\n```mermaid\nflowchart LR\n  X --> Y\n```\nb\n```mermaid\npie\n```\n";

        for block in extract(doc) {
            assert_eq!(&doc[block.start_index..block.end_index], block.full_match);
            assert!(block.end_index > block.start_index);
            assert!(!block.is_empty());
        }
    }

    #[test]
    fn test_extract_no_blocks() {
        let doc = "# Plain\n\n```rust\nfn main() {}\n```\n";

        assert!(extract(doc).is_empty());
    }

    #[test]
    fn test_extract_ignores_other_languages() {
        let doc = "```javascript\nconsole.log('hello');\n```\n\n```mermaid\ngraph TD\n  A --> B\n```\n";

        let blocks = extract(doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "graph TD\n  A --> B");
    }

    #[test]
    fn test_unterminated_block_is_discarded() {
        let doc = "```mermaid\ngraph TD\n  A --> B\n";

        assert!(extract(doc).is_empty());
    }

    #[test]
    fn test_content_is_trimmed() {
        let doc = "```mermaid\n\n   graph TD\n  A --> B   \n\n```";

        let blocks = extract(doc);

        assert_eq!(blocks[0].content, "graph TD\n  A --> B");
    }

    #[test]
    fn test_crlf_fence() {
        let doc = "```mermaid\r\ngraph TD\r\n  A --> B\r\n```\r\n";

        let blocks = extract(doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "graph TD\r\n  A --> B");
    }

    #[test]
    fn test_multibyte_offsets() {
        let doc = "Überblick → Diagramm\n```mermaid\ngraph TD\n  A[Größe] --> B\n```\n";

        let blocks = extract(doc);

        assert_eq!(blocks.len(), 1);
        assert_eq!(&doc[blocks[0].start_index..blocks[0].end_index], blocks[0].full_match);
        assert!(blocks[0].content.contains("Größe"));
    }
}
