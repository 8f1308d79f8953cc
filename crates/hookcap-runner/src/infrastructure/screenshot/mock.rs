//! Mock screen capturer for testing.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ScreenCapturer, ScreenshotError};

/// A [`ScreenCapturer`] double that returns a fixed frame and records every
/// destination it was asked to write.
pub struct MockScreenCapturer {
    frame: Vec<u8>,
    fail_with: Option<String>,
    destinations: Mutex<Vec<PathBuf>>,
}

impl MockScreenCapturer {
    /// Succeeds with `frame` on every capture.
    pub fn returning(frame: Vec<u8>) -> Self {
        Self {
            frame,
            fail_with: None,
            destinations: Mutex::new(Vec::new()),
        }
    }

    /// Fails every capture with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            frame: Vec::new(),
            fail_with: Some(message.to_string()),
            destinations: Mutex::new(Vec::new()),
        }
    }

    /// Destinations passed to `capture`, in call order.
    pub fn destinations(&self) -> Vec<PathBuf> {
        self.destinations.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl ScreenCapturer for MockScreenCapturer {
    async fn capture(&self, destination: &Path) -> Result<Vec<u8>, ScreenshotError> {
        self.destinations
            .lock()
            .expect("lock poisoned")
            .push(destination.to_path_buf());

        match &self.fail_with {
            Some(message) => Err(ScreenshotError::Capture(message.clone())),
            None => Ok(self.frame.clone()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
