//! Chromium backend over the DevTools protocol.

use std::path::PathBuf;

use chromiumoxide::cdp::browser_protocol::emulation::SetDeviceMetricsOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, Viewport};
use chromiumoxide::cdp::js_protocol::runtime::{EventConsoleApiCalled, EventExceptionThrown};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::backend::{
    BoundingBox, BrowserLauncher, CaptureRequest, DiagramBrowser, DiagramPage, PageViewport,
};
use crate::error::RenderError;
use crate::spec::ImageFormat;

impl From<CdpError> for RenderError {
    fn from(err: CdpError) -> Self {
        Self::Browser(err.to_string())
    }
}

/// Launches headless Chromium without a sandbox.
///
/// The executable is auto-detected unless set with
/// [`with_executable`](Self::with_executable).
#[derive(Debug, Clone, Default)]
pub struct ChromiumLauncher {
    executable: Option<PathBuf>,
}

impl ChromiumLauncher {
    /// Create a launcher that auto-detects the browser executable.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific browser executable.
    #[must_use]
    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }
}

impl BrowserLauncher for ChromiumLauncher {
    type Browser = ChromiumBrowser;

    async fn launch(&self) -> Result<ChromiumBrowser, RenderError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-setuid-sandbox");
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "Browser handler event failed");
                }
            }
        });

        Ok(ChromiumBrowser { browser, handler })
    }
}

/// Running Chromium process and its protocol event loop.
pub struct ChromiumBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl DiagramBrowser for ChromiumBrowser {
    type Page = ChromiumPage;

    async fn new_page(&self) -> Result<ChromiumPage, RenderError> {
        let page = self.browser.new_page("about:blank").await?;
        Ok(ChromiumPage {
            page,
            listeners: Vec::new(),
        })
    }

    async fn close(mut self) -> Result<(), RenderError> {
        let closed = self.browser.close().await;
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Failed to wait for browser exit");
        }
        self.handler.abort();
        closed?;
        Ok(())
    }
}

/// One Chromium tab.
pub struct ChromiumPage {
    page: Page,
    listeners: Vec<JoinHandle<()>>,
}

impl DiagramPage for ChromiumPage {
    type Element = Element;

    async fn set_viewport(&self, viewport: PageViewport) -> Result<(), RenderError> {
        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                i64::from(viewport.width),
                i64::from(viewport.height),
                viewport.device_scale_factor,
                false,
            ))
            .await?;
        Ok(())
    }

    async fn forward_diagnostics(&mut self) -> Result<(), RenderError> {
        let mut console = self.page.event_listener::<EventConsoleApiCalled>().await?;
        self.listeners.push(tokio::spawn(async move {
            while let Some(event) = console.next().await {
                let text = event
                    .args
                    .iter()
                    .map(|arg| match (&arg.value, &arg.description) {
                        (Some(Value::String(s)), _) => s.clone(),
                        (Some(v), _) => v.to_string(),
                        (None, Some(d)) => d.clone(),
                        (None, None) => String::new(),
                    })
                    .collect::<Vec<_>>()
                    .join(" ");
                debug!(kind = ?event.r#type, "Browser console: {text}");
            }
        }));

        let mut exceptions = self.page.event_listener::<EventExceptionThrown>().await?;
        self.listeners.push(tokio::spawn(async move {
            while let Some(event) = exceptions.next().await {
                let details = &event.exception_details;
                let message = details
                    .exception
                    .as_ref()
                    .and_then(|e| e.description.clone())
                    .unwrap_or_else(|| details.text.clone());
                warn!("Browser page error: {message}");
            }
        }));

        Ok(())
    }

    async fn set_content(&self, html: &str) -> Result<(), RenderError> {
        self.page.set_content(html).await?;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, RenderError> {
        let result = self.page.evaluate(expression).await?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn find_element(&self, selector: &str) -> Result<Option<Element>, RenderError> {
        let elements = self.page.find_elements(selector).await?;
        Ok(elements.into_iter().next())
    }

    async fn bounding_box(&self, element: &Element) -> Result<Option<BoundingBox>, RenderError> {
        Ok(element.bounding_box().await.ok().map(|b| BoundingBox {
            x: b.x,
            y: b.y,
            width: b.width,
            height: b.height,
        }))
    }

    async fn capture(&self, request: CaptureRequest) -> Result<Vec<u8>, RenderError> {
        let format = match request.format {
            ImageFormat::Png => CaptureScreenshotFormat::Png,
            ImageFormat::Jpeg => CaptureScreenshotFormat::Jpeg,
        };
        let clip = request.clip;
        let mut params = ScreenshotParams::builder().format(format).clip(Viewport {
            x: clip.x,
            y: clip.y,
            width: clip.width,
            height: clip.height,
            scale: 1.0,
        });
        if let Some(quality) = request.quality {
            params = params.quality(i64::from(quality));
        }

        Ok(self.page.screenshot(params.build()).await?)
    }

    async fn close(self) -> Result<(), RenderError> {
        for listener in &self.listeners {
            listener.abort();
        }
        self.page.close().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ChromiumSession;
    use crate::spec::RenderSpec;

    const LABELLED_FLOW: &str =
        "graph TD\n    A[Start<br/>here] --> B{Ready?}\n    B -->|yes| C[Done]\n    B -->|no| A";

    // Needs a local Chrome or Chromium and network access to load Mermaid.
    #[tokio::test]
    #[ignore]
    async fn test_renders_png_and_jpeg_in_chromium() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("flow-diagram-1.png");
        let jpeg = dir.path().join("flow-diagram-2.jpeg");
        let mut session = ChromiumSession::new(ChromiumLauncher::new());

        session
            .render_diagram_to_image(LABELLED_FLOW, &png, &RenderSpec::default())
            .await
            .unwrap();
        session
            .render_diagram_to_image(
                LABELLED_FLOW,
                &jpeg,
                &RenderSpec {
                    format: ImageFormat::Jpeg,
                    quality: 90,
                    ..RenderSpec::default()
                },
            )
            .await
            .unwrap();
        session.shutdown().await.unwrap();

        let png_bytes = std::fs::read(&png).unwrap();
        assert!(png_bytes.len() > 8);
        assert!(png_bytes.starts_with(b"\x89PNG\r\n\x1a\n"));

        let jpeg_bytes = std::fs::read(&jpeg).unwrap();
        assert!(jpeg_bytes.len() > 2);
        assert!(jpeg_bytes.starts_with(&[0xFF, 0xD8]));
    }

    // Needs a local Chrome or Chromium and network access to load Mermaid.
    #[tokio::test]
    #[ignore]
    async fn test_reports_mermaid_parse_error_in_chromium() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = ChromiumSession::new(ChromiumLauncher::new());

        let err = session
            .render_diagram_to_image(
                "graph TD\n    A -->",
                &dir.path().join("broken.png"),
                &RenderSpec::default(),
            )
            .await
            .unwrap_err();
        session.shutdown().await.unwrap();

        assert!(matches!(err, RenderError::Engine(_)), "got: {err:?}");
        assert!(!dir.path().join("broken.png").exists());
    }
}
