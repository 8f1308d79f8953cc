//! Executable-permission handling for built helpers.
//!
//! A freshly compiled helper must carry the executable bit before it can be
//! spawned.  On Windows hosts that concept does not exist, so the step is
//! skipped entirely — no command is issued, not even a no-op one.

use std::path::Path;
use std::sync::Arc;

use hookcap_core::HostPlatform;
use thiserror::Error;
use tracing::{debug, info};

use crate::infrastructure::exec::CommandExecutor;

/// Error type for permission setting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PermissionError {
    /// `chmod` ran but exited non-zero.
    #[error("chmod +x {path} exited with code {exit_code}")]
    CommandFailed { path: String, exit_code: i32 },

    /// `chmod` could not be launched.
    #[error("could not launch chmod: {0}")]
    Unavailable(String),
}

/// `true` on hosts where files carry an executable bit.
pub fn executable_bit_applies(platform: HostPlatform) -> bool {
    !matches!(platform, HostPlatform::Windows)
}

/// Marks built binaries executable through the injected executor.
pub struct PermissionSetter {
    executor: Arc<dyn CommandExecutor>,
    host: HostPlatform,
}

impl PermissionSetter {
    pub fn new(executor: Arc<dyn CommandExecutor>, host: HostPlatform) -> Self {
        Self { executor, host }
    }

    /// Makes `path` executable, or skips entirely on hosts without the
    /// executable-bit concept.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionError::CommandFailed`] with the exit code on a
    /// non-zero chmod exit, or [`PermissionError::Unavailable`] when chmod
    /// cannot be launched.
    pub async fn make_executable(&self, path: &Path) -> Result<(), PermissionError> {
        if !executable_bit_applies(self.host) {
            debug!("host {} has no executable bit; skipping chmod", self.host);
            return Ok(());
        }

        let display_path = path.to_string_lossy().into_owned();
        let args = vec!["+x".to_string(), display_path.clone()];

        let output = self
            .executor
            .run("chmod", &args)
            .await
            .map_err(|e| PermissionError::Unavailable(e.to_string()))?;

        if output.success() {
            info!("executable permissions set for {display_path}");
            Ok(())
        } else {
            Err(PermissionError::CommandFailed {
                path: display_path,
                // A signal-terminated chmod carries no code; report -1.
                exit_code: output.exit_code.unwrap_or(-1),
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
