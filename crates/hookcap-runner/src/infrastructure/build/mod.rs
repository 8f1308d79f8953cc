//! Helper compilation.
//!
//! Turns a [`BuildJob`] into the exact toolchain invocation for its target
//! (templates live in `hookcap_core::domain::toolchain`) and runs it through
//! the [`CommandExecutor`] seam.  The builder holds no mutable state, so any
//! number of builds can run concurrently without coordination.

use std::path::PathBuf;
use std::sync::Arc;

use hookcap_core::{compile_command, TargetTag};
use thiserror::Error;
use tracing::{debug, info};

use crate::infrastructure::exec::CommandExecutor;

/// Error type for helper builds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuildError {
    /// The toolchain ran and reported failure; carries its stderr text.
    #[error("toolchain failed for {target}: {stderr}")]
    Compile { target: TargetTag, stderr: String },

    /// The toolchain binary could not be started at all.
    #[error("could not launch toolchain: {0}")]
    ToolchainUnavailable(String),
}

/// One compilation request: source in, binary out, for one target.
#[derive(Debug, Clone)]
pub struct BuildJob {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
    pub target: TargetTag,
}

/// Compiles helper sources through the injected executor.
pub struct HelperBuilder {
    executor: Arc<dyn CommandExecutor>,
}

impl HelperBuilder {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Runs the toolchain for `job` to completion.
    ///
    /// Resolves on a zero exit status.  The produced binary lives on the
    /// filesystem at `job.output_path`; no binary bytes are held in memory.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Compile`] with the toolchain's stderr on a
    /// non-zero exit, or [`BuildError::ToolchainUnavailable`] when the
    /// compiler cannot be launched.
    pub async fn build(&self, job: &BuildJob) -> Result<(), BuildError> {
        let command = compile_command(&job.source_path, &job.output_path, job.target);
        debug!("compiling helper: {command}");

        let output = self
            .executor
            .run(&command.program, &command.args)
            .await
            .map_err(|e| BuildError::ToolchainUnavailable(e.to_string()))?;

        if output.success() {
            info!("helper compiled for {}", job.target);
            Ok(())
        } else {
            Err(BuildError::Compile {
                target: job.target,
                stderr: output.stderr,
            })
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::exec::mock::ScriptedExecutor;

    fn linux64_job() -> BuildJob {
        BuildJob {
            source_path: PathBuf::from("a.c"),
            output_path: PathBuf::from("bin/x"),
            target: TargetTag::Linux64,
        }
    }

    #[tokio::test]
    async fn test_build_issues_the_documented_template() {
        // Arrange
        let executor = Arc::new(ScriptedExecutor::new());
        let builder = HelperBuilder::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>);

        // Act
        builder.build(&linux64_job()).await.expect("build");

        // Assert – exactly one toolchain call with the linux64 argv.
        let calls = executor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, "gcc");
        assert_eq!(calls[0].args, vec!["-o", "bin/x", "a.c", "-lX11"]);
    }

    #[tokio::test]
    async fn test_build_failure_carries_toolchain_stderr() {
        // Arrange
        let executor = Arc::new(ScriptedExecutor::new());
        executor.push_failure(1, "a.c:1: undefined reference to XOpenDisplay");
        let builder = HelperBuilder::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>);

        // Act
        let result = builder.build(&linux64_job()).await;

        // Assert
        assert_eq!(
            result,
            Err(BuildError::Compile {
                target: TargetTag::Linux64,
                stderr: "a.c:1: undefined reference to XOpenDisplay".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_build_reports_unlaunchable_toolchain() {
        let executor = Arc::new(ScriptedExecutor::new());
        executor.push_launch_failure("gcc not installed");
        let builder = HelperBuilder::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>);

        let result = builder.build(&linux64_job()).await;

        assert!(matches!(result, Err(BuildError::ToolchainUnavailable(_))));
    }

    #[tokio::test]
    async fn test_concurrent_builds_share_no_state() {
        // Arrange – two jobs for different targets through one builder.
        let executor = Arc::new(ScriptedExecutor::new());
        let builder = HelperBuilder::new(Arc::clone(&executor) as Arc<dyn CommandExecutor>);

        let mut win_job = linux64_job();
        win_job.target = TargetTag::Win64;
        win_job.output_path = PathBuf::from("bin/y");

        // Act – run both builds concurrently.
        let linux_job = linux64_job();
        let (a, b) = tokio::join!(builder.build(&linux_job), builder.build(&win_job));

        // Assert
        a.expect("linux build");
        b.expect("windows build");
        assert_eq!(executor.call_count(), 2);
    }
}
