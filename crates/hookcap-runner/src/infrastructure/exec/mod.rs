//! Command execution seam.
//!
//! The builder, the permission setter, and the preflight gates all need to
//! run an external program to completion and inspect its exit status and
//! output.  They share one trait, [`CommandExecutor`], so a single test
//! double can script every external command in the pipeline.
//!
//! The production implementation, [`SystemExecutor`], runs commands through
//! `tokio::process::Command` — the invocation itself is non-blocking and
//! multiple commands can be in flight on one cooperative event loop.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

pub mod mock;

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// The process exit code; `None` when terminated by a signal.
    pub exit_code: Option<i32>,
    /// Captured stdout, lossily decoded.
    pub stdout: String,
    /// Captured stderr, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// `true` only for a clean zero exit.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// A successful empty output, handy as a scripted default.
    pub fn ok() -> Self {
        Self {
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }
}

/// Error type for command launching.
///
/// A command that *ran* but exited non-zero is not an `ExecError`; callers
/// inspect [`CommandOutput::exit_code`] for that.  This error means the
/// program could not be started at all (not found, not executable, ...).
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Trait abstracting "run this argv to completion and capture its output".
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs `program` with `args`, waiting for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::Launch`] when the program cannot be started.
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError>;
}

/// Production executor backed by `tokio::process::Command`.
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        debug!("running command: {program} {}", args.join(" "));
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| ExecError::Launch {
                program: program.to_string(),
                source,
            })?;

        Ok(CommandOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
