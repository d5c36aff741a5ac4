//! Shared browser session and the per-diagram render protocol.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::backend::{BrowserLauncher, CaptureRequest, DiagramBrowser, DiagramPage, PageViewport};
use crate::consts::{CLIP_MARGIN, POLL_INTERVAL, VIEWPORT_HEIGHT, VIEWPORT_WIDTH};
use crate::error::{RenderError, WaitStage};
use crate::shell::{
    DIAGRAM_PROCESSED, DIAGRAM_SELECTOR, DOCUMENT_READY, RENDER_ERROR, RENDER_SETTLED, page_shell,
};
use crate::spec::{RenderSpec, SessionOptions};

/// Owner of the single browser instance used for all renders.
///
/// The browser is launched on the first [`acquire`](Self::acquire) and reused
/// until [`shutdown`](Self::shutdown); each render opens and closes its own
/// page. Renders take `&mut self`, so they run one at a time.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use mermshot_render::{ChromiumLauncher, RenderSession, RenderSpec};
///
/// # async fn demo() -> Result<(), mermshot_render::RenderError> {
/// let mut session = RenderSession::new(ChromiumLauncher::default());
/// session
///     .render_diagram_to_image("graph TD\n  A --> B", Path::new("out.png"), &RenderSpec::default())
///     .await?;
/// session.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct RenderSession<L: BrowserLauncher> {
    launcher: L,
    browser: Option<L::Browser>,
    options: SessionOptions,
}

impl<L: BrowserLauncher> RenderSession<L> {
    /// Create a session that launches browsers with `launcher`. Nothing is
    /// started until the first render.
    #[must_use]
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            browser: None,
            options: SessionOptions::default(),
        }
    }

    /// Set session-wide rendering options.
    #[must_use]
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether a browser is currently running.
    pub fn is_launched(&self) -> bool {
        self.browser.is_some()
    }

    /// Return the running browser, launching it on first use.
    pub async fn acquire(&mut self) -> Result<&L::Browser, RenderError> {
        if self.browser.is_none() {
            debug!("Launching headless browser");
            self.browser = Some(self.launcher.launch().await?);
        }
        self.browser
            .as_ref()
            .ok_or_else(|| RenderError::Launch("browser missing after launch".to_owned()))
    }

    /// Close the browser if one is running.
    ///
    /// Safe to call repeatedly; a later [`acquire`](Self::acquire) launches a
    /// new browser.
    pub async fn shutdown(&mut self) -> Result<(), RenderError> {
        if let Some(browser) = self.browser.take() {
            debug!("Closing headless browser");
            browser.close().await?;
        }
        Ok(())
    }

    /// Render `source` and write the cropped image to `output_path`.
    ///
    /// The page opened for this call is closed on every path, including
    /// failures and timeouts.
    pub async fn render_diagram_to_image(
        &mut self,
        source: &str,
        output_path: &Path,
        spec: &RenderSpec,
    ) -> Result<(), RenderError> {
        debug!(
            chars = source.len(),
            output = %output_path.display(),
            "Rendering diagram"
        );

        let mut page = self.acquire().await?.new_page().await?;
        let rendered = render_on_page(&mut page, &self.options, source, spec).await;
        let closed = page.close().await;

        let image = rendered?;
        closed?;

        tokio::fs::write(output_path, &image)
            .await
            .map_err(|source| RenderError::Io {
                path: output_path.to_path_buf(),
                source,
            })?;

        info!(
            output = %output_path.display(),
            bytes = image.len(),
            "Rendered diagram"
        );
        Ok(())
    }
}

/// Drive one page through the render protocol and return the image bytes.
async fn render_on_page<P: DiagramPage>(
    page: &mut P,
    options: &SessionOptions,
    source: &str,
    spec: &RenderSpec,
) -> Result<Vec<u8>, RenderError> {
    let timeouts = options.timeouts;

    if options.verbose {
        page.forward_diagnostics().await?;
    }

    page.set_viewport(PageViewport {
        width: VIEWPORT_WIDTH,
        height: VIEWPORT_HEIGHT,
        device_scale_factor: spec.scale,
    })
    .await?;

    let html = page_shell(source, &options.script_url);
    bounded(WaitStage::PageLoad, timeouts.page_load, page.set_content(&html)).await?;
    wait_until(&*page, DOCUMENT_READY, WaitStage::PageLoad, timeouts.page_load).await?;

    wait_until(&*page, RENDER_SETTLED, WaitStage::RenderComplete, timeouts.render).await?;

    if let Some(message) = engine_error(page.evaluate(RENDER_ERROR).await?) {
        return Err(RenderError::Engine(message));
    }

    wait_until(&*page, DIAGRAM_PROCESSED, WaitStage::Processed, timeouts.settle).await?;

    let element = page
        .find_element(DIAGRAM_SELECTOR)
        .await?
        .ok_or(RenderError::ElementNotFound)?;
    let bbox = page
        .bounding_box(&element)
        .await?
        .ok_or(RenderError::Dimensions)?;
    debug!(
        x = bbox.x,
        y = bbox.y,
        width = bbox.width,
        height = bbox.height,
        "Measured diagram"
    );

    page.capture(CaptureRequest {
        clip: bbox.expand(CLIP_MARGIN),
        format: spec.format,
        quality: spec.effective_quality(),
    })
    .await
}

/// Run `future` with a time limit, mapping expiry to [`RenderError::Timeout`].
async fn bounded<T>(
    stage: WaitStage,
    timeout: Duration,
    future: impl Future<Output = Result<T, RenderError>>,
) -> Result<T, RenderError> {
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| RenderError::Timeout { stage, timeout })?
}

/// Poll `expression` until it is truthy or `timeout` expires.
async fn wait_until<P: DiagramPage>(
    page: &P,
    expression: &str,
    stage: WaitStage,
    timeout: Duration,
) -> Result<(), RenderError> {
    bounded(stage, timeout, async {
        loop {
            if is_truthy(&page.evaluate(expression).await?) {
                return Ok(());
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    })
    .await
}

/// JavaScript truthiness for a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Message of a reported Mermaid failure, if any.
fn engine_error(value: Value) -> Option<String> {
    if !is_truthy(&value) {
        return None;
    }
    Some(match value {
        Value::String(message) => message,
        other => other.to_string(),
    })
}
