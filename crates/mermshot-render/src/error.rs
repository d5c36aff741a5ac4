//! Rendering error types.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Bounded wait that can time out during a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    /// Page shell and scripts loading.
    PageLoad,
    /// Mermaid reporting completion or failure.
    RenderComplete,
    /// Mermaid marking the container as processed.
    Processed,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PageLoad => "page load",
            Self::RenderComplete => "diagram render",
            Self::Processed => "diagram post-processing",
        })
    }
}

/// Error returned when a diagram cannot be rendered.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The browser process could not be started.
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    /// Browser protocol failure.
    #[error("Browser error: {0}")]
    Browser(String),

    /// A bounded wait expired.
    #[error("Timed out after {}s waiting for {stage}", timeout.as_secs_f64())]
    Timeout {
        /// Which wait expired.
        stage: WaitStage,
        /// Configured limit.
        timeout: Duration,
    },

    /// Mermaid reported a failure.
    #[error("Mermaid render failed: {0}")]
    Engine(String),

    /// The diagram container is missing from the page.
    #[error("Failed to find diagram element")]
    ElementNotFound,

    /// The diagram container has no measurable box.
    #[error("Failed to get diagram dimensions")]
    Dimensions,

    /// The image could not be written.
    #[error("Failed to write {}: {source}", path.display())]
    Io {
        /// Output image path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message() {
        let err = RenderError::Timeout {
            stage: WaitStage::RenderComplete,
            timeout: Duration::from_secs(45),
        };

        assert_eq!(err.to_string(), "Timed out after 45s waiting for diagram render");
    }

    #[test]
    fn test_engine_message() {
        let err = RenderError::Engine("Parse error on line 2".to_owned());

        assert_eq!(err.to_string(), "Mermaid render failed: Parse error on line 2");
    }

    #[test]
    fn test_io_message_includes_path() {
        let err = RenderError::Io {
            path: PathBuf::from("/tmp/out.png"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };

        assert!(err.to_string().contains("/tmp/out.png"));
        assert!(err.to_string().contains("denied"));
    }
}
