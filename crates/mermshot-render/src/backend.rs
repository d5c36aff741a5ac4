//! Browser backend abstraction.
//!
//! The render protocol in [`RenderSession`](crate::RenderSession) only needs a
//! handful of page primitives. These traits describe them so the protocol can
//! run against Chromium in production and against an in-memory mock in tests.

use serde_json::Value;

use crate::error::RenderError;
use crate::spec::ImageFormat;

/// Rectangle on the page in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Grow the box by `margin` on all four sides.
    #[must_use]
    pub fn expand(self, margin: f64) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + 2.0 * margin,
            height: self.height + 2.0 * margin,
        }
    }
}

/// Page viewport configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageViewport {
    pub width: u32,
    pub height: u32,
    pub device_scale_factor: f64,
}

/// Screenshot request for a clipped region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureRequest {
    pub clip: BoundingBox,
    pub format: ImageFormat,
    /// Set only for lossy formats.
    pub quality: Option<u8>,
}

/// Starts browser instances.
#[allow(async_fn_in_trait)]
pub trait BrowserLauncher {
    type Browser: DiagramBrowser;

    /// Launch a new headless browser process.
    async fn launch(&self) -> Result<Self::Browser, RenderError>;
}

/// A running browser that can open independent pages.
#[allow(async_fn_in_trait)]
pub trait DiagramBrowser {
    type Page: DiagramPage;

    /// Open a fresh page context.
    async fn new_page(&self) -> Result<Self::Page, RenderError>;

    /// Close the browser process.
    async fn close(self) -> Result<(), RenderError>;
}

/// A single page context, owned by one render call.
#[allow(async_fn_in_trait)]
pub trait DiagramPage {
    type Element;

    /// Set viewport size and device scale factor.
    async fn set_viewport(&self, viewport: PageViewport) -> Result<(), RenderError>;

    /// Forward in-page console messages and uncaught errors to the log.
    async fn forward_diagnostics(&mut self) -> Result<(), RenderError>;

    /// Replace the page document and wait for navigation to finish.
    async fn set_content(&self, html: &str) -> Result<(), RenderError>;

    /// Evaluate a JavaScript expression. `undefined` maps to `Value::Null`.
    async fn evaluate(&self, expression: &str) -> Result<Value, RenderError>;

    /// First element matching `selector`, if any.
    async fn find_element(&self, selector: &str) -> Result<Option<Self::Element>, RenderError>;

    /// Bounding box of `element`, if it has one.
    async fn bounding_box(&self, element: &Self::Element)
    -> Result<Option<BoundingBox>, RenderError>;

    /// Capture the requested region as encoded image bytes.
    async fn capture(&self, request: CaptureRequest) -> Result<Vec<u8>, RenderError>;

    /// Close the page context.
    async fn close(self) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_expand() {
        let bbox = BoundingBox {
            x: 100.0,
            y: 50.0,
            width: 300.0,
            height: 200.0,
        };

        assert_eq!(
            bbox.expand(10.0),
            BoundingBox {
                x: 90.0,
                y: 40.0,
                width: 320.0,
                height: 220.0,
            }
        );
    }
}
