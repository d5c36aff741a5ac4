//! Conversion error types.

use std::path::PathBuf;

use mermshot_blocks::RewriteError;
use mermshot_render::RenderError;

/// Error returned when a document cannot be converted.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    /// The document contains no Mermaid blocks.
    #[error("No Mermaid diagrams found in the markdown file")]
    NoDiagrams,

    /// Reading the document or writing an output failed.
    #[error("Failed to access {}: {source}", path.display())]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A diagram failed to render. The conversion stops at the first failure.
    #[error("Diagram {index}: {source}")]
    Render {
        /// 1-based diagram index.
        index: usize,
        /// Underlying render error.
        source: RenderError,
    },

    /// Block substitution failed.
    #[error("Failed to rewrite document: {0}")]
    Rewrite(#[from] RewriteError),
}

impl ConvertError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { path, source }
    }
}
