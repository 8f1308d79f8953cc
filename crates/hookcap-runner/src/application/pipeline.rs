//! The capture pipeline use case.
//!
//! Orchestrates one capability end to end: compile the helper for the
//! resolved target, mark it executable, launch it under supervision, and
//! pump its three raw streams through the capability's translator into the
//! [`EventBus`].
//!
//! All infrastructure is injected behind traits ([`CommandExecutor`],
//! [`HelperLauncher`]), so the whole use case runs against doubles in
//! tests.  Stage failures are reported to the bus — failing its
//! `first_event` accessor — and returned to the caller; runtime stderr
//! chunks become non-fatal `Error` events instead.
//!
//! Ordering: the translator taps attach before pumping starts, data events
//! are published in stream order, and the terminal event is guaranteed to
//! be the last event any subscriber observes for this process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use hookcap_core::{Capability, HostArch, HostPlatform, TargetError, TargetTag};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::event_bus::EventBus;
use crate::application::translators::translator_for;
use crate::infrastructure::build::{BuildError, BuildJob, HelperBuilder};
use crate::infrastructure::exec::CommandExecutor;
use crate::infrastructure::permissions::{PermissionError, PermissionSetter};
use crate::infrastructure::process::{
    HelperSupervisor, SpawnError, StreamSettings, SubscribeError, SupervisedHelper,
};

/// Error type for a capability pipeline run.
///
/// Cloneable so the same failure can be handed to the bus's first-event
/// accessor and returned to the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The helper did not compile.
    #[error(transparent)]
    Build(#[from] BuildError),

    /// The built helper could not be marked executable.
    #[error(transparent)]
    Permission(#[from] PermissionError),

    /// The helper process failed to start.
    #[error("failed to spawn helper: {message}")]
    Spawn { message: String },

    /// An internal stream tap could not be attached.
    #[error(transparent)]
    Subscribe(#[from] SubscribeError),
}

impl From<SpawnError> for PipelineError {
    fn from(error: SpawnError) -> Self {
        PipelineError::Spawn {
            message: error.to_string(),
        }
    }
}

/// Maps this process's host names onto the domain enums.
///
/// # Errors
///
/// Returns [`TargetError`] when the platform or architecture has no known
/// spelling; the caller treats that as fatal.
pub fn detect_host() -> Result<(HostPlatform, HostArch), TargetError> {
    let platform: HostPlatform = std::env::consts::OS.parse()?;
    let arch: HostArch = std::env::consts::ARCH.parse()?;
    Ok((platform, arch))
}

/// Where helper sources live and where built binaries land.
#[derive(Debug, Clone)]
pub struct HelperPaths {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Trait abstracting helper launching, so tests can substitute a scripted
/// process for a real spawn.
pub trait HelperLauncher: Send + Sync {
    /// Launches the binary at `binary` under supervision.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] when the process cannot be started.
    fn launch(
        &self,
        binary: &Path,
        streams: &StreamSettings,
    ) -> Result<Box<dyn SupervisedHelper>, SpawnError>;
}

/// Production launcher backed by [`HelperSupervisor`].
pub struct SystemLauncher;

impl HelperLauncher for SystemLauncher {
    fn launch(
        &self,
        binary: &Path,
        streams: &StreamSettings,
    ) -> Result<Box<dyn SupervisedHelper>, SpawnError> {
        HelperSupervisor::spawn(binary, *streams).map(|s| Box::new(s) as Box<dyn SupervisedHelper>)
    }
}

/// The capture pipeline for one capability on one resolved target.
pub struct CapturePipeline {
    capability: Capability,
    host: HostPlatform,
    target: TargetTag,
    paths: HelperPaths,
    streams: StreamSettings,
    executor: Arc<dyn CommandExecutor>,
    launcher: Arc<dyn HelperLauncher>,
}

impl CapturePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        capability: Capability,
        host: HostPlatform,
        target: TargetTag,
        paths: HelperPaths,
        streams: StreamSettings,
        executor: Arc<dyn CommandExecutor>,
        launcher: Arc<dyn HelperLauncher>,
    ) -> Self {
        Self {
            capability,
            host,
            target,
            paths,
            streams,
            executor,
            launcher,
        }
    }

    /// Runs the pipeline to completion: build, permissions, launch, then
    /// translate events until the helper exits.
    ///
    /// # Errors
    ///
    /// Returns the stage error that aborted the run.  Every returned error
    /// is also reported to `bus`, so `first_event` observers see it too.
    pub async fn run(&self, bus: &EventBus) -> Result<(), PipelineError> {
        let run_id = Uuid::new_v4();
        let binary_name = self.capability.binary_name(self.target);
        info!("capture run {run_id}: building {binary_name}");

        // ── Build ─────────────────────────────────────────────────────────────
        let job = BuildJob {
            source_path: self.paths.source_dir.join(self.capability.source_file_name()),
            output_path: self.paths.output_dir.join(&binary_name),
            target: self.target,
        };

        let builder = HelperBuilder::new(Arc::clone(&self.executor));
        if let Err(e) = builder.build(&job).await {
            return Err(self.fail(bus, e.into()));
        }

        // ── Permissions ───────────────────────────────────────────────────────
        let permissions = PermissionSetter::new(Arc::clone(&self.executor), self.host);
        if let Err(e) = permissions.make_executable(&job.output_path).await {
            return Err(self.fail(bus, e.into()));
        }

        // ── Launch ────────────────────────────────────────────────────────────
        let mut helper = match self.launcher.launch(&job.output_path, &self.streams) {
            Ok(helper) => helper,
            Err(e) => return Err(self.fail(bus, e.into())),
        };

        // Taps attach before pumping starts, so the first chunk cannot be
        // missed.
        let mut stdout_rx = helper
            .subscribe_stdout()
            .map_err(|e| self.fail(bus, e.into()))?;
        let mut stderr_rx = helper
            .subscribe_stderr()
            .map_err(|e| self.fail(bus, e.into()))?;
        let mut exit_rx = helper
            .subscribe_exit()
            .map_err(|e| self.fail(bus, e.into()))?;

        helper.start();
        info!("capture run {run_id}: helper {binary_name} running");

        // ── Translate ─────────────────────────────────────────────────────────
        let mut translator = translator_for(self.capability);
        let mut stdout_open = true;
        let mut stderr_open = true;

        loop {
            tokio::select! {
                // Data streams take priority over the exit signal, so
                // queued chunks are always translated first.
                biased;

                chunk = stdout_rx.recv(), if stdout_open => match chunk {
                    Ok(chunk) => bus.publish(translator.on_stdout(&chunk)),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("stdout tap lagged; {missed} chunks missed");
                    }
                    Err(broadcast::error::RecvError::Closed) => stdout_open = false,
                },

                chunk = stderr_rx.recv(), if stderr_open => match chunk {
                    Ok(chunk) => bus.publish(translator.on_stderr(&chunk)),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("stderr tap lagged; {missed} chunks missed");
                    }
                    Err(broadcast::error::RecvError::Closed) => stderr_open = false,
                },

                exit = exit_rx.recv() => {
                    match exit {
                        Ok(signal) => {
                            // Chunks published before the exit signal may
                            // still sit in the taps; flush them so the
                            // terminal event stays last.
                            while let Ok(chunk) = stdout_rx.try_recv() {
                                bus.publish(translator.on_stdout(&chunk));
                            }
                            while let Ok(chunk) = stderr_rx.try_recv() {
                                bus.publish(translator.on_stderr(&chunk));
                            }
                            bus.publish(translator.on_exit(signal));
                        }
                        Err(e) => warn!("exit stream closed without a signal: {e}"),
                    }
                    break;
                }
            }
        }

        info!("capture run {run_id} finished");
        Ok(())
    }

    fn fail(&self, bus: &EventBus, error: PipelineError) -> PipelineError {
        error!("capture pipeline for {} aborted: {error}", self.capability);
        bus.report_failure(error.clone());
        error
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
