//! Markdown Mermaid conversion pipeline.
//!
//! Ties block extraction, syntax repair and rendering together:
//! - [`Converter::convert_file`] reads a document, renders every Mermaid block
//!   through one shared [`RenderSession`](mermshot_render::RenderSession) and
//!   writes `{name}-converted.md` with image references in place of the blocks
//! - [`ConversionOptions`] selects image settings, validate-only mode and
//!   auto-fix
//! - [`ConversionResult`] reports written files and per-diagram syntax findings
//!
//! Diagrams render sequentially; the first failure aborts the document.

mod converter;
mod error;
mod options;

pub use converter::{BlockIssues, ConversionResult, ConvertedDocument, Converter};
pub use error::ConvertError;
pub use options::ConversionOptions;
