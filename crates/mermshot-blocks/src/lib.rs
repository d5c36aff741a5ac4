//! Mermaid block extraction and document rewriting.
//!
//! This crate finds ```` ```mermaid ```` fenced blocks in a markdown document
//! and substitutes them with arbitrary replacement text:
//! - [`extract`] returns every block with its byte span in the original document
//! - [`rewrite`] replaces all spans in one left-to-right pass, correcting each
//!   position by the length drift of earlier substitutions
//! - [`naming`] computes image filenames and the markdown image references
//!   that replace the blocks
//!
//! # Example
//!
//! ```
//! use mermshot_blocks::{extract, rewrite};
//!
//! let doc = "# Title\n\n```mermaid\ngraph TD\n  A --> B\n```\n\nText\n";
//! let blocks = extract(doc);
//! assert_eq!(blocks.len(), 1);
//! assert_eq!(blocks[0].content, "graph TD\n  A --> B");
//!
//! let output = rewrite(doc, &blocks, &["![Mermaid Diagram 1](d-1.png)".to_owned()]).unwrap();
//! assert_eq!(output, "# Title\n\n![Mermaid Diagram 1](d-1.png)\n\nText\n");
//! ```

mod block;
pub mod naming;
mod rewrite;

pub use block::{DiagramBlock, extract};
pub use rewrite::{RewriteError, rewrite};
