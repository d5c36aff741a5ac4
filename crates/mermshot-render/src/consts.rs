//! Internal constants for diagram rendering.

use std::time::Duration;

/// Mermaid script loaded by the page shell.
pub const DEFAULT_SCRIPT_URL: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

/// Viewport size in CSS pixels. Large enough that diagrams capped at 2000px fit.
pub const VIEWPORT_WIDTH: u32 = 2400;
pub const VIEWPORT_HEIGHT: u32 = 1600;

/// Margin added around the diagram bounding box on every side, in CSS pixels.
pub const CLIP_MARGIN: f64 = 10.0;

/// Timeout for loading the page shell and its scripts.
pub const DEFAULT_PAGE_LOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout for Mermaid to report completion or failure.
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(45);

/// Timeout for the `data-processed` marker after completion is reported.
pub const DEFAULT_SETTLE_TIMEOUT: Duration = Duration::from_secs(15);

/// Interval between in-page flag checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);
