//! Per-render output settings and session options.

use std::time::Duration;

use crate::consts::{
    DEFAULT_PAGE_LOAD_TIMEOUT, DEFAULT_RENDER_TIMEOUT, DEFAULT_SCRIPT_URL, DEFAULT_SETTLE_TIMEOUT,
};

/// Raster format of rendered diagrams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Lossless PNG (default).
    #[default]
    Png,
    /// Lossy JPEG with configurable quality.
    Jpeg,
}

impl ImageFormat {
    /// Parse format from a user-supplied name (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpeg" => Some(Self::Jpeg),
            _ => None,
        }
    }

    /// Format name, also used as the file extension.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// Whether quality applies to this format.
    #[must_use]
    pub fn is_lossy(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output settings for one diagram render.
///
/// Ranges (JPEG `quality` in 1..=100, `scale` in 1..=5) are validated by the
/// caller before a spec is built; the renderer uses the values as given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderSpec {
    /// Output raster format.
    pub format: ImageFormat,
    /// JPEG quality, ignored for PNG.
    pub quality: u8,
    /// Device scale factor of the page.
    pub scale: f64,
}

impl Default for RenderSpec {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            quality: 85,
            scale: 2.0,
        }
    }
}

impl RenderSpec {
    /// Quality to pass to the screenshot, only for lossy formats.
    #[must_use]
    pub fn effective_quality(&self) -> Option<u8> {
        self.format.is_lossy().then_some(self.quality)
    }
}

/// Bounded waits applied to each render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTimeouts {
    /// Loading the page shell and its scripts.
    pub page_load: Duration,
    /// Waiting for `renderComplete` or `renderError`.
    pub render: Duration,
    /// Waiting for the `data-processed` marker.
    pub settle: Duration,
}

impl Default for RenderTimeouts {
    fn default() -> Self {
        Self {
            page_load: DEFAULT_PAGE_LOAD_TIMEOUT,
            render: DEFAULT_RENDER_TIMEOUT,
            settle: DEFAULT_SETTLE_TIMEOUT,
        }
    }
}

/// Session-wide rendering options.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// URL of the Mermaid script loaded by the page shell.
    pub script_url: String,
    /// Per-render timeouts.
    pub timeouts: RenderTimeouts,
    /// Forward in-page console output and uncaught errors to the log.
    pub verbose: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            script_url: DEFAULT_SCRIPT_URL.to_owned(),
            timeouts: RenderTimeouts::default(),
            verbose: false,
        }
    }
}
