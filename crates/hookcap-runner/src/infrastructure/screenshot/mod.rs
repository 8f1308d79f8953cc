//! Screen-capture library contract.
//!
//! The actual capture is performed by an external library; the orchestrator
//! only depends on this trait: hand it a destination path, get the image
//! bytes back or a typed failure.  Production wiring plugs a real
//! implementation in here; tests use [`mock::MockScreenCapturer`].

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub mod mock;

/// Error type for one-shot screen captures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScreenshotError {
    /// The capture library reported a failure.
    #[error("screen capture failed: {0}")]
    Capture(String),
}

/// Trait abstracting the external screen-capture library.
#[async_trait]
pub trait ScreenCapturer: Send + Sync {
    /// Captures the screen, writing the image to `destination`, and
    /// returns the captured image bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ScreenshotError::Capture`] when the library fails.
    async fn capture(&self, destination: &Path) -> Result<Vec<u8>, ScreenshotError>;
}
