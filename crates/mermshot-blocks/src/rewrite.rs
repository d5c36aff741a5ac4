//! Position-stable multi-block substitution.

use crate::block::DiagramBlock;

/// Error returned by [`rewrite`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RewriteError {
    /// Number of replacements differs from number of blocks.
    #[error("{blocks} blocks but {replacements} replacements")]
    CountMismatch {
        /// Number of blocks.
        blocks: usize,
        /// Number of replacements.
        replacements: usize,
    },
    /// Block span does not match the document it is applied to.
    #[error("block {index} does not match the document at {start}..{end}")]
    StaleBlock {
        /// Zero-based block index.
        index: usize,
        /// Span start in the original document.
        start: usize,
        /// Span end in the original document.
        end: usize,
    },
    /// Blocks are not in ascending, non-overlapping order.
    #[error("block {index} overlaps or precedes the previous block")]
    OutOfOrder {
        /// Zero-based block index.
        index: usize,
    },
}

/// Replace every block span in `document` with the replacement at the same index.
///
/// `blocks` must come from [`extract`](crate::extract) on this exact
/// `document`. Substitutions run left to right on a single output buffer and
/// each block's position is shifted by the cumulative length drift of the
/// substitutions before it. The output is never re-scanned, so a replacement
/// that happens to contain a fence cannot create a new block in this pass.
pub fn rewrite(
    document: &str,
    blocks: &[DiagramBlock],
    replacements: &[String],
) -> Result<String, RewriteError> {
    if blocks.len() != replacements.len() {
        return Err(RewriteError::CountMismatch {
            blocks: blocks.len(),
            replacements: replacements.len(),
        });
    }

    let mut output = document.to_owned();
    let mut drift: isize = 0;
    let mut previous_end = 0;

    for (index, (block, replacement)) in blocks.iter().zip(replacements).enumerate() {
        if block.start_index < previous_end {
            return Err(RewriteError::OutOfOrder { index });
        }
        if document.get(block.start_index..block.end_index) != Some(block.full_match.as_str()) {
            return Err(RewriteError::StaleBlock {
                index,
                start: block.start_index,
                end: block.end_index,
            });
        }

        let start = block.start_index.saturating_add_signed(drift);
        output.replace_range(start..start + block.len(), replacement);

        drift += signed_len(replacement) - signed_len(&block.full_match);
        previous_end = block.end_index;
    }

    Ok(output)
}

fn signed_len(s: &str) -> isize {
    isize::try_from(s.len()).unwrap_or(isize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;
    use pretty_assertions::assert_eq;

    const DOC: &str = "# Title\n\n```mermaid\ngraph TD\n  A --> B\n```\n\nMiddle text.\n\n```mermaid\nsequenceDiagram\n  Alice->>Bob: Hello\n```\n\nEnd.\n";

    /// Reference result: untouched text between blocks joined with replacements.
    fn splice(document: &str, blocks: &[DiagramBlock], replacements: &[String]) -> String {
        let mut result = String::new();
        let mut cursor = 0;
        for (block, replacement) in blocks.iter().zip(replacements) {
            result.push_str(&document[cursor..block.start_index]);
            result.push_str(replacement);
            cursor = block.end_index;
        }
        result.push_str(&document[cursor..]);
        result
    }

    #[test]
    fn test_rewrite_shorter_replacements() {
        let blocks = extract(DOC);
        let replacements = vec![
            "![Mermaid Diagram 1](images/doc-diagram-1.png)".to_owned(),
            "![Mermaid Diagram 2](images/doc-diagram-2.png)".to_owned(),
        ];

        let output = rewrite(DOC, &blocks, &replacements).unwrap();

        assert_eq!(
            output,
            "# Title\n\n![Mermaid Diagram 1](images/doc-diagram-1.png)\n\nMiddle text.\n\n![Mermaid Diagram 2](images/doc-diagram-2.png)\n\nEnd.\n"
        );
    }

    #[test]
    fn test_rewrite_matches_splice_for_any_lengths() {
        let blocks = extract(DOC);

        for first in [0, 1, 5, 40, 200] {
            for second in [0, 3, 80, 500] {
                let replacements = vec!["x".repeat(first), "y".repeat(second)];

                let output = rewrite(DOC, &blocks, &replacements).unwrap();

                assert_eq!(output, splice(DOC, &blocks, &replacements));
            }
        }
    }

    #[test]
    fn test_rewrite_does_not_rescan_inserted_fences() {
        let blocks = extract(DOC);
        let replacements = vec![
            "```mermaid\ngraph LR\n  Z --> Q\n```".to_owned(),
            "done".to_owned(),
        ];

        let output = rewrite(DOC, &blocks, &replacements).unwrap();

        assert_eq!(output, splice(DOC, &blocks, &replacements));
        assert!(output.contains("done\n\nEnd."));
    }

    #[test]
    fn test_rewrite_preserves_other_fences() {
        let doc = "```javascript\nconsole.log('hello');\n```\n\n```mermaid\ngraph TD\n  A --> B\n```\n\n```python\nprint(1)\n```\n";
        let blocks = extract(doc);

        let output = rewrite(doc, &blocks, &["IMG".to_owned()]).unwrap();

        assert_eq!(
            output,
            "```javascript\nconsole.log('hello');\n```\n\nIMG\n\n```python\nprint(1)\n```\n"
        );
    }

    #[test]
    fn test_rewrite_no_blocks_is_identity() {
        let doc = "plain text\n";

        assert_eq!(rewrite(doc, &[], &[]).unwrap(), doc);
    }

    #[test]
    fn test_rewrite_count_mismatch() {
        let blocks = extract(DOC);

        let err = rewrite(DOC, &blocks, &["only one".to_owned()]).unwrap_err();

        assert_eq!(
            err,
            RewriteError::CountMismatch {
                blocks: 2,
                replacements: 1
            }
        );
    }

    #[test]
    fn test_rewrite_rejects_stale_blocks() {
        let blocks = extract(DOC);
        let edited = DOC.replacen("# Title", "# A longer title", 1);

        let err = rewrite(&edited, &blocks, &["a".to_owned(), "b".to_owned()]).unwrap_err();

        assert!(matches!(err, RewriteError::StaleBlock { index: 0, .. }));
    }

    #[test]
    fn test_rewrite_rejects_out_of_order_blocks() {
        let mut blocks = extract(DOC);
        blocks.reverse();

        let err = rewrite(DOC, &blocks, &["a".to_owned(), "b".to_owned()]).unwrap_err();

        assert_eq!(err, RewriteError::OutOfOrder { index: 1 });
    }
}
