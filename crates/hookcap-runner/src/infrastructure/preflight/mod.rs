//! Platform prerequisite gates.
//!
//! Some hosts need setup before any helper can be built or spawned:
//!
//! - **Linux** – the helpers link against X11 extension libraries, so the
//!   `libxrandr-dev` and `libxtst-dev` packages must be installed.
//! - **macOS** – the event tap requires elevated privileges; `sudo -v`
//!   validates (and caches) them up front.
//! - **Windows** – no gate.
//!
//! A failed gate is fatal to the entire run: nothing is built, nothing is
//! spawned.

use std::sync::Arc;

use hookcap_core::HostPlatform;
use thiserror::Error;
use tracing::{debug, info};

use crate::infrastructure::exec::CommandExecutor;

/// Development packages the Linux helpers require.
const LINUX_PACKAGES: [&str; 2] = ["libxrandr-dev", "libxtst-dev"];

/// Error type for preflight gates.  Every variant is process-fatal.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PreflightError {
    /// Installing the required development packages failed.
    #[error("required package install failed (exit {exit_code}): {stderr}")]
    PackageInstall { exit_code: i32, stderr: String },

    /// Elevated privileges could not be obtained.
    #[error("failed to obtain elevated privileges (exit {exit_code})")]
    Privileges { exit_code: i32 },

    /// The gate command itself could not be launched.
    #[error("could not run preflight command: {0}")]
    Unavailable(String),
}

/// Runs the host's prerequisite gate before the pipeline starts.
pub struct PreflightGate {
    executor: Arc<dyn CommandExecutor>,
    host: HostPlatform,
}

impl PreflightGate {
    pub fn new(executor: Arc<dyn CommandExecutor>, host: HostPlatform) -> Self {
        Self { executor, host }
    }

    /// Checks the gate for the configured host.
    ///
    /// # Errors
    ///
    /// Any error returned here must abort the whole orchestration run.
    pub async fn check(&self) -> Result<(), PreflightError> {
        match self.host {
            HostPlatform::Linux => self.install_linux_packages().await,
            HostPlatform::MacOs => self.validate_privileges().await,
            HostPlatform::Windows => {
                debug!("no preflight gate on windows");
                Ok(())
            }
        }
    }

    async fn install_linux_packages(&self) -> Result<(), PreflightError> {
        // `-y` keeps apt-get from waiting on a confirmation prompt nobody
        // is there to answer.
        let mut args = vec!["apt-get".to_string(), "install".to_string(), "-y".to_string()];
        args.extend(LINUX_PACKAGES.iter().map(|p| p.to_string()));

        let output = self
            .executor
            .run("sudo", &args)
            .await
            .map_err(|e| PreflightError::Unavailable(e.to_string()))?;

        if output.success() {
            info!("required packages installed");
            Ok(())
        } else {
            Err(PreflightError::PackageInstall {
                exit_code: output.exit_code.unwrap_or(-1),
                stderr: output.stderr,
            })
        }
    }

    async fn validate_privileges(&self) -> Result<(), PreflightError> {
        let args = vec!["-v".to_string()];
        let output = self
            .executor
            .run("sudo", &args)
            .await
            .map_err(|e| PreflightError::Unavailable(e.to_string()))?;

        if output.success() {
            info!("administrative privileges obtained");
            Ok(())
        } else {
            Err(PreflightError::Privileges {
                exit_code: output.exit_code.unwrap_or(-1),
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::exec::mock::ScriptedExecutor;

    fn gate(host: HostPlatform) -> (PreflightGate, Arc<ScriptedExecutor>) {
        let executor = Arc::new(ScriptedExecutor::new());
        let gate = PreflightGate::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>, host);
        (gate, executor)
    }

    #[tokio::test]
    async fn test_linux_gate_installs_x11_dev_packages() {
        // Arrange
        let (gate, executor) = gate(HostPlatform::Linux);

        // Act
        gate.check().await.expect("gate");

        // Assert
        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "sudo");
        assert_eq!(
            calls[0].args,
            vec!["apt-get", "install", "-y", "libxrandr-dev", "libxtst-dev"]
        );
    }

    #[tokio::test]
    async fn test_linux_gate_failure_is_fatal_with_stderr() {
        // Arrange
        let (gate, executor) = gate(HostPlatform::Linux);
        executor.push_failure(100, "Unable to locate package libxtst-dev");

        // Act
        let result = gate.check().await;

        // Assert
        assert_eq!(
            result,
            Err(PreflightError::PackageInstall {
                exit_code: 100,
                stderr: "Unable to locate package libxtst-dev".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_macos_gate_validates_sudo() {
        let (gate, executor) = gate(HostPlatform::MacOs);

        gate.check().await.expect("gate");

        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "sudo");
        assert_eq!(calls[0].args, vec!["-v"]);
    }

    #[tokio::test]
    async fn test_macos_gate_denial_is_fatal() {
        let (gate, executor) = gate(HostPlatform::MacOs);
        executor.push_failure(1, "Sorry, try again.");

        let result = gate.check().await;

        assert_eq!(result, Err(PreflightError::Privileges { exit_code: 1 }));
    }

    #[tokio::test]
    async fn test_windows_has_no_gate() {
        let (gate, executor) = gate(HostPlatform::Windows);

        gate.check().await.expect("gate");

        assert_eq!(executor.call_count(), 0);
    }
}
