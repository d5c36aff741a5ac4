//! Conversion options.

use std::path::PathBuf;

use mermshot_render::{ImageFormat, RenderSpec};

/// Validated settings for one document conversion.
///
/// Ranges are checked by the caller (CLI or config layer); the pipeline uses
/// the values as given.
///
/// # Example
///
/// ```
/// use mermshot_convert::ConversionOptions;
/// use mermshot_render::ImageFormat;
///
/// let options = ConversionOptions::new("docs/images")
///     .format(ImageFormat::Jpeg)
///     .quality(70)
///     .auto_fix(true);
/// assert_eq!(options.render_spec().effective_quality(), Some(70));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOptions {
    /// Directory receiving the images, created if missing.
    pub output_dir: PathBuf,
    /// Image format.
    pub format: ImageFormat,
    /// JPEG quality (1..=100).
    pub quality: u8,
    /// Device scale factor (1..=5).
    pub scale: f64,
    /// Check every block for syntax issues even without `validate_only` or `auto_fix`.
    pub verbose: bool,
    /// Report syntax issues without rendering or writing anything.
    pub validate_only: bool,
    /// Repair blocks before rendering and keep a fixed copy of the document.
    pub auto_fix: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self::new("./images")
    }
}

impl ConversionOptions {
    /// Options with default render settings writing images to `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        let spec = RenderSpec::default();
        Self {
            output_dir: output_dir.into(),
            format: spec.format,
            quality: spec.quality,
            scale: spec.scale,
            verbose: false,
            validate_only: false,
            auto_fix: false,
        }
    }

    /// Set the image format.
    #[must_use]
    pub fn format(mut self, format: ImageFormat) -> Self {
        self.format = format;
        self
    }

    /// Set JPEG quality.
    #[must_use]
    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Set the device scale factor.
    #[must_use]
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Enable syntax checks on every conversion.
    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Only report syntax issues.
    #[must_use]
    pub fn validate_only(mut self, validate_only: bool) -> Self {
        self.validate_only = validate_only;
        self
    }

    /// Repair blocks before rendering.
    #[must_use]
    pub fn auto_fix(mut self, auto_fix: bool) -> Self {
        self.auto_fix = auto_fix;
        self
    }

    /// Per-diagram render settings.
    #[must_use]
    pub fn render_spec(&self) -> RenderSpec {
        RenderSpec {
            format: self.format,
            quality: self.quality,
            scale: self.scale,
        }
    }

    /// Whether blocks are checked for syntax issues.
    pub(crate) fn checks_syntax(&self) -> bool {
        self.validate_only || self.auto_fix || self.verbose
    }
}
