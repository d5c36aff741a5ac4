//! Headless browser rendering of Mermaid diagrams.
//!
//! This crate turns Mermaid source into a cropped PNG or JPEG by loading it
//! into a page shell inside a headless browser:
//! - [`RenderSession`] owns one lazily launched browser shared by all renders
//!   and runs the per-diagram protocol (viewport, load, wait, measure, capture)
//! - [`BrowserLauncher`], [`DiagramBrowser`] and [`DiagramPage`] abstract the
//!   browser so the protocol is backend independent
//! - [`ChromiumLauncher`] drives Chromium over the `DevTools` protocol
//! - [`MockLauncher`] for testing (behind `mock` feature flag)
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use mermshot_render::{ChromiumSession, ChromiumLauncher, RenderSpec};
//!
//! let mut session = ChromiumSession::new(ChromiumLauncher::new());
//! session
//!     .render_diagram_to_image("graph TD\n  A --> B", Path::new("d-1.png"), &RenderSpec::default())
//!     .await?;
//! session.shutdown().await?;
//! ```

mod backend;
mod chromium;
mod consts;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod session;
mod shell;
mod spec;

pub use backend::{
    BoundingBox, BrowserLauncher, CaptureRequest, DiagramBrowser, DiagramPage, PageViewport,
};
pub use chromium::{ChromiumBrowser, ChromiumLauncher, ChromiumPage};
pub use consts::{
    DEFAULT_PAGE_LOAD_TIMEOUT, DEFAULT_RENDER_TIMEOUT, DEFAULT_SCRIPT_URL, DEFAULT_SETTLE_TIMEOUT,
};
pub use error::{RenderError, WaitStage};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockBehavior, MockBrowser, MockLauncher, MockPage, MockStats, RenderOutcome};
pub use session::RenderSession;
pub use spec::{ImageFormat, RenderSpec, RenderTimeouts, SessionOptions};

/// Session backed by headless Chromium.
pub type ChromiumSession = RenderSession<ChromiumLauncher>;
