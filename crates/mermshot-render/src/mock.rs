//! Mock browser backend for testing.
//!
//! Provides [`MockLauncher`] for exercising the render protocol without a
//! browser. Every launcher clone shares the same recorded [`MockStats`].

use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::backend::{
    BoundingBox, BrowserLauncher, CaptureRequest, DiagramBrowser, DiagramPage, PageViewport,
};
use crate::error::RenderError;
use crate::shell::{DIAGRAM_PROCESSED, DIAGRAM_SELECTOR, DOCUMENT_READY, RENDER_ERROR, RENDER_SETTLED};

/// How the in-page Mermaid run ends.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RenderOutcome {
    /// `renderComplete` becomes true.
    #[default]
    Complete,
    /// `renderError` is set to the message.
    Error(String),
    /// Neither flag is ever set.
    Hang,
}

/// Scripted page behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct MockBehavior {
    /// Fail every launch with this message.
    pub launch_error: Option<String>,
    /// Result of the Mermaid run.
    pub outcome: RenderOutcome,
    /// Whether the container gets the `data-processed` marker.
    pub processed: bool,
    /// Whether `#diagram` exists.
    pub element: bool,
    /// Bounding box reported for `#diagram`.
    pub bounds: Option<BoundingBox>,
    /// Bytes returned by every capture.
    pub image: Vec<u8>,
    /// Fail renders whose source contains this text with an engine error.
    pub fail_on: Option<String>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            launch_error: None,
            outcome: RenderOutcome::Complete,
            processed: true,
            element: true,
            bounds: Some(BoundingBox {
                x: 20.0,
                y: 20.0,
                width: 400.0,
                height: 300.0,
            }),
            image: b"\x89PNG\r\n\x1a\nmock".to_vec(),
            fail_on: None,
        }
    }
}

/// Calls recorded across all browsers and pages of a launcher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockStats {
    pub launches: usize,
    pub browsers_closed: usize,
    pub pages_opened: usize,
    pub pages_closed: usize,
    pub diagnostics_forwarded: usize,
    pub viewports: Vec<PageViewport>,
    pub contents: Vec<String>,
    pub captures: Vec<CaptureRequest>,
}

#[derive(Debug)]
struct Shared {
    behavior: MockBehavior,
    stats: Mutex<MockStats>,
}

impl Shared {
    fn record(&self, f: impl FnOnce(&mut MockStats)) {
        f(&mut self.stats.lock().unwrap());
    }
}

/// Mock launcher for testing.
///
/// # Example
///
/// ```ignore
/// use mermshot_render::{MockBehavior, MockLauncher, RenderSession};
///
/// let launcher = MockLauncher::new(MockBehavior::default());
/// let mut session = RenderSession::new(launcher.clone());
/// // ... render ...
/// assert_eq!(launcher.stats().launches, 1);
/// ```
#[derive(Debug, Clone)]
pub struct MockLauncher {
    shared: Arc<Shared>,
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self::new(MockBehavior::default())
    }
}

impl MockLauncher {
    /// Create a launcher whose pages follow `behavior`.
    #[must_use]
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            shared: Arc::new(Shared {
                behavior,
                stats: Mutex::new(MockStats::default()),
            }),
        }
    }

    /// Snapshot of the recorded calls.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn stats(&self) -> MockStats {
        self.shared.stats.lock().unwrap().clone()
    }
}

impl BrowserLauncher for MockLauncher {
    type Browser = MockBrowser;

    async fn launch(&self) -> Result<MockBrowser, RenderError> {
        if let Some(message) = &self.shared.behavior.launch_error {
            return Err(RenderError::Launch(message.clone()));
        }
        self.shared.record(|s| s.launches += 1);
        Ok(MockBrowser {
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Browser handed out by [`MockLauncher`].
#[derive(Debug)]
pub struct MockBrowser {
    shared: Arc<Shared>,
}

impl DiagramBrowser for MockBrowser {
    type Page = MockPage;

    async fn new_page(&self) -> Result<MockPage, RenderError> {
        self.shared.record(|s| s.pages_opened += 1);
        Ok(MockPage {
            shared: Arc::clone(&self.shared),
            content: Mutex::new(String::new()),
        })
    }

    async fn close(self) -> Result<(), RenderError> {
        self.shared.record(|s| s.browsers_closed += 1);
        Ok(())
    }
}

/// Page handed out by [`MockBrowser`].
#[derive(Debug)]
pub struct MockPage {
    shared: Arc<Shared>,
    content: Mutex<String>,
}

impl MockPage {
    fn outcome(&self) -> RenderOutcome {
        let behavior = &self.shared.behavior;
        match &behavior.fail_on {
            Some(needle) if self.content.lock().unwrap().contains(needle.as_str()) => {
                RenderOutcome::Error(format!("Parse error near {needle}"))
            }
            _ => behavior.outcome.clone(),
        }
    }
}

impl DiagramPage for MockPage {
    type Element = ();

    async fn set_viewport(&self, viewport: PageViewport) -> Result<(), RenderError> {
        self.shared.record(|s| s.viewports.push(viewport));
        Ok(())
    }

    async fn forward_diagnostics(&mut self) -> Result<(), RenderError> {
        self.shared.record(|s| s.diagnostics_forwarded += 1);
        Ok(())
    }

    async fn set_content(&self, html: &str) -> Result<(), RenderError> {
        self.shared.record(|s| s.contents.push(html.to_owned()));
        html.clone_into(&mut *self.content.lock().unwrap());
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, RenderError> {
        let outcome = self.outcome();

        let value = match expression {
            DOCUMENT_READY => Value::Bool(true),
            RENDER_SETTLED => Value::Bool(outcome != RenderOutcome::Hang),
            RENDER_ERROR => match outcome {
                RenderOutcome::Error(message) => Value::String(message),
                _ => Value::Null,
            },
            DIAGRAM_PROCESSED => Value::Bool(self.shared.behavior.processed),
            _ => Value::Null,
        };
        Ok(value)
    }

    async fn find_element(&self, selector: &str) -> Result<Option<()>, RenderError> {
        Ok((selector == DIAGRAM_SELECTOR && self.shared.behavior.element).then_some(()))
    }

    async fn bounding_box(&self, _element: &()) -> Result<Option<BoundingBox>, RenderError> {
        Ok(self.shared.behavior.bounds)
    }

    async fn capture(&self, request: CaptureRequest) -> Result<Vec<u8>, RenderError> {
        self.shared.record(|s| s.captures.push(request));
        Ok(self.shared.behavior.image.clone())
    }

    async fn close(self) -> Result<(), RenderError> {
        self.shared.record(|s| s.pages_closed += 1);
        Ok(())
    }
}
