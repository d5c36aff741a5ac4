//! Document conversion pipeline.

use std::path::{Path, PathBuf};

use mermshot_blocks::naming::{
    converted_document_path, document_base_name, fixed_document_path, image_file_name,
    image_reference, relative_reference,
};
use mermshot_blocks::{DiagramBlock, extract, rewrite};
use mermshot_render::{BrowserLauncher, RenderError, RenderSession};
use tracing::{debug, info, warn};

use crate::error::ConvertError;
use crate::options::ConversionOptions;

/// Syntax findings for one diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIssues {
    /// 1-based diagram index.
    pub index: usize,
    /// Potential problems found in the original source.
    pub issues: Vec<String>,
    /// Repairs applied (only with auto-fix).
    pub fixes: Vec<String>,
}

/// In-memory outcome of converting a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    /// Document with every block replaced by an image reference.
    /// `None` in validate-only mode.
    pub content: Option<String>,
    /// Original document with repaired blocks, if auto-fix changed anything.
    pub fixed: Option<String>,
    /// Syntax findings, one entry per affected diagram.
    pub issues: Vec<BlockIssues>,
    /// Written images in diagram order.
    pub images: Vec<PathBuf>,
}

/// Outcome of [`Converter::convert_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Converted document path. `None` in validate-only mode.
    pub output_file: Option<PathBuf>,
    /// Directory holding the images.
    pub image_directory: PathBuf,
    /// Number of diagrams rendered.
    pub converted_count: usize,
    /// Auto-fixed copy of the original, if one was written.
    pub fixed_file: Option<PathBuf>,
    /// Syntax findings, one entry per affected diagram.
    pub issues: Vec<BlockIssues>,
    /// Written images in diagram order.
    pub images: Vec<PathBuf>,
}

/// Converts markdown documents through a shared render session.
///
/// All diagrams of all documents go through the same browser; call
/// [`shutdown`](Self::shutdown) when done.
///
/// # Example
///
/// ```ignore
/// use std::path::Path;
/// use mermshot_convert::{ConversionOptions, Converter};
/// use mermshot_render::{ChromiumLauncher, RenderSession};
///
/// let mut converter = Converter::new(RenderSession::new(ChromiumLauncher::new()));
/// let result = converter
///     .convert_file(Path::new("docs/guide.md"), &ConversionOptions::new("docs/images"))
///     .await?;
/// converter.shutdown().await?;
/// ```
pub struct Converter<L: BrowserLauncher> {
    session: RenderSession<L>,
}

impl<L: BrowserLauncher> Converter<L> {
    /// Create a converter rendering through `session`.
    #[must_use]
    pub fn new(session: RenderSession<L>) -> Self {
        Self { session }
    }

    /// The underlying render session.
    pub fn session(&self) -> &RenderSession<L> {
        &self.session
    }

    /// Close the browser if one is running.
    pub async fn shutdown(&mut self) -> Result<(), RenderError> {
        self.session.shutdown().await
    }

    /// Convert the document at `path` and persist the results next to it.
    ///
    /// Writes `{name}-converted.md`, plus `{name}-fixed.md` when auto-fix
    /// changed a block. Validate-only mode writes nothing. The input file is
    /// never modified.
    pub async fn convert_file(
        &mut self,
        path: &Path,
        options: &ConversionOptions,
    ) -> Result<ConversionResult, ConvertError> {
        let document = tokio::fs::read_to_string(path)
            .await
            .map_err(ConvertError::io(path))?;

        let converted = self.convert_str(&document, path, options).await?;

        let fixed_file = match &converted.fixed {
            Some(fixed) if !options.validate_only => {
                let fixed_path = fixed_document_path(path);
                write_document(&fixed_path, fixed).await?;
                Some(fixed_path)
            }
            _ => None,
        };

        let output_file = match &converted.content {
            Some(content) => {
                let output_path = converted_document_path(path);
                write_document(&output_path, content).await?;
                Some(output_path)
            }
            None => None,
        };

        Ok(ConversionResult {
            output_file,
            image_directory: options.output_dir.clone(),
            converted_count: converted.images.len(),
            fixed_file,
            issues: converted.issues,
            images: converted.images,
        })
    }

    /// Convert `document` in memory.
    ///
    /// `document_path` is used for image names and for the relative image
    /// references; it does not have to exist. Images are written to the
    /// output directory, documents are not.
    pub async fn convert_str(
        &mut self,
        document: &str,
        document_path: &Path,
        options: &ConversionOptions,
    ) -> Result<ConvertedDocument, ConvertError> {
        let mut blocks = extract(document);
        if blocks.is_empty() {
            return Err(ConvertError::NoDiagrams);
        }
        debug!(count = blocks.len(), "Found Mermaid diagrams");

        let mut issues = Vec::new();
        let mut fixed = None;

        if options.checks_syntax() {
            let check = check_blocks(&blocks, options.auto_fix);
            issues = check.issues;
            if check.changed {
                let repaired = rewrite(document, &blocks, &check.replacements)?;
                blocks = extract(&repaired);
                fixed = Some(repaired);
            }
        }

        if options.validate_only {
            return Ok(ConvertedDocument {
                content: None,
                fixed,
                issues,
                images: Vec::new(),
            });
        }

        let source = fixed.as_deref().unwrap_or(document);

        tokio::fs::create_dir_all(&options.output_dir)
            .await
            .map_err(ConvertError::io(&options.output_dir))?;

        let spec = options.render_spec();
        let base_name = document_base_name(document_path);
        let mut images = Vec::with_capacity(blocks.len());
        let mut references = Vec::with_capacity(blocks.len());

        for (i, block) in blocks.iter().enumerate() {
            let index = i + 1;
            let image_path = options
                .output_dir
                .join(image_file_name(&base_name, index, spec.format.as_str()));

            debug!(index, total = blocks.len(), "Converting diagram");
            self.session
                .render_diagram_to_image(&block.content, &image_path, &spec)
                .await
                .map_err(|source| ConvertError::Render { index, source })?;

            references.push(image_reference(
                index,
                &relative_reference(document_path, &image_path),
            ));
            images.push(image_path);
        }

        let content = rewrite(source, &blocks, &references)?;
        info!(count = images.len(), "Converted Mermaid diagrams");

        Ok(ConvertedDocument {
            content: Some(content),
            fixed,
            issues,
            images,
        })
    }
}

/// Result of checking all blocks of a document.
struct BlockCheck {
    issues: Vec<BlockIssues>,
    /// Fence text per block, repaired where a fix applied.
    replacements: Vec<String>,
    changed: bool,
}

/// Validate every block and, with `auto_fix`, repair it.
fn check_blocks(blocks: &[DiagramBlock], auto_fix: bool) -> BlockCheck {
    let mut check = BlockCheck {
        issues: Vec::new(),
        replacements: Vec::with_capacity(blocks.len()),
        changed: false,
    };

    for (i, block) in blocks.iter().enumerate() {
        let index = i + 1;
        let problems = mermshot_syntax::validate(&block.content);
        for problem in &problems {
            debug!(index, "Diagram issue: {problem}");
        }

        let mut fixes = Vec::new();
        let mut replacement = block.full_match.clone();
        if auto_fix {
            let result = mermshot_syntax::fix(&block.content);
            if result.is_changed() {
                for change in &result.changes {
                    warn!(index, "Applied fix: {change}");
                }
                replacement = block.with_content(&result.fixed);
                check.changed |= replacement != block.full_match;
                fixes = result.changes;
            }
        }

        if !problems.is_empty() || !fixes.is_empty() {
            check.issues.push(BlockIssues {
                index,
                issues: problems,
                fixes,
            });
        }
        check.replacements.push(replacement);
    }

    check
}

async fn write_document(path: &Path, content: &str) -> Result<(), ConvertError> {
    tokio::fs::write(path, content)
        .await
        .map_err(ConvertError::io(path))?;
    debug!(path = %path.display(), "Wrote document");
    Ok(())
}
