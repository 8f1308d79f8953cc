//! Helper process supervision.
//!
//! A spawned helper exposes exactly three raw signals, each on its own
//! subscribable stream: stdout chunks, stderr chunks, and one exit signal.
//! The [`StreamHub`] owns the three channels; [`HelperSupervisor`] spawns
//! the binary, pumps both pipes to EOF, then reaps the child and publishes
//! the exit signal.
//!
//! # Ordering guarantees
//!
//! - Within one stream, chunks are published in arrival order.
//! - The exit signal is published exactly once, and only after every chunk
//!   read before termination has been published.  Subscribers that poll
//!   data streams before the exit stream therefore always observe all data
//!   first.
//! - Interleaving *between* stdout and stderr is unspecified.
//!
//! # What is a broadcast channel? (for beginners)
//!
//! A `tokio::sync::broadcast` channel clones every sent value to every
//! active receiver, each of which consumes at its own pace from a bounded
//! ring buffer.  That makes it a natural fit for "many listeners per
//! stream": subscribing is just creating another receiver.  The hub wraps
//! subscription with an explicit ceiling so exhausting the listener slots
//! is a typed error, never a silent drop.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::sync::broadcast;
use tracing::{debug, warn};

pub mod mock;

/// Default per-stream listener ceiling: at least 20 external subscribers,
/// with headroom for the pipeline's own three taps.
pub const DEFAULT_MAX_STREAM_LISTENERS: usize = 24;

/// Default broadcast ring-buffer capacity per stream.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Pipe read buffer size; one read yields at most one published chunk.
const READ_BUF_SIZE: usize = 4096;

/// Tuning for the three streams of one supervised process.
#[derive(Debug, Clone, Copy)]
pub struct StreamSettings {
    /// Maximum concurrently attached listeners per stream.
    pub max_listeners: usize,
    /// Broadcast ring-buffer capacity per stream.
    pub channel_capacity: usize,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_STREAM_LISTENERS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Lifecycle of one supervised helper process.
///
/// `Terminated` is absorbing: once entered, the state never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// Created, not yet launched.
    Starting,
    /// The OS process is running.
    Running,
    /// The process has exited.  `exit_code` is `None` when it was killed
    /// by a signal.
    Terminated { exit_code: Option<i32> },
}

/// The one-shot exit signal published on the exit stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSignal {
    pub exit_code: Option<i32>,
}

/// Error type for helper spawning.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("failed to spawn helper {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("helper {path} has no piped {stream} handle")]
    MissingPipe { path: String, stream: &'static str },
}

/// Error type for stream subscription.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscribeError {
    /// The stream already has its full complement of listeners.  The
    /// ceiling is configuration, so the caller's options are to raise it
    /// or to drop a listener — never to silently lose events.
    #[error("listener ceiling reached: {active} of {ceiling} slots in use")]
    CeilingReached { active: usize, ceiling: usize },
}

/// Which pipe a pump task is draining.
#[derive(Debug, Clone, Copy)]
enum PipeKind {
    Stdout,
    Stderr,
}

impl fmt::Display for PipeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipeKind::Stdout => f.write_str("stdout"),
            PipeKind::Stderr => f.write_str("stderr"),
        }
    }
}

// ── Stream hub ────────────────────────────────────────────────────────────────

/// The three demultiplexed streams of one supervised process.
pub struct StreamHub {
    stdout_tx: broadcast::Sender<Vec<u8>>,
    stderr_tx: broadcast::Sender<Vec<u8>>,
    exit_tx: broadcast::Sender<ExitSignal>,
    max_listeners: usize,
}

impl StreamHub {
    pub fn new(settings: StreamSettings) -> Self {
        let (stdout_tx, _) = broadcast::channel(settings.channel_capacity);
        let (stderr_tx, _) = broadcast::channel(settings.channel_capacity);
        let (exit_tx, _) = broadcast::channel(settings.channel_capacity);
        Self {
            stdout_tx,
            stderr_tx,
            exit_tx,
            max_listeners: settings.max_listeners,
        }
    }

    /// Attaches a listener to the stdout chunk stream.
    ///
    /// # Errors
    ///
    /// Returns [`SubscribeError::CeilingReached`] when the stream already
    /// has `max_listeners` active receivers.
    pub fn subscribe_stdout(&self) -> Result<broadcast::Receiver<Vec<u8>>, SubscribeError> {
        self.guarded(&self.stdout_tx)
    }

    /// Attaches a listener to the stderr chunk stream.
    pub fn subscribe_stderr(&self) -> Result<broadcast::Receiver<Vec<u8>>, SubscribeError> {
        self.guarded(&self.stderr_tx)
    }

    /// Attaches a listener to the exit stream.
    pub fn subscribe_exit(&self) -> Result<broadcast::Receiver<ExitSignal>, SubscribeError> {
        self.guarded(&self.exit_tx)
    }

    fn guarded<T: Clone>(
        &self,
        tx: &broadcast::Sender<T>,
    ) -> Result<broadcast::Receiver<T>, SubscribeError> {
        let active = tx.receiver_count();
        if active >= self.max_listeners {
            return Err(SubscribeError::CeilingReached {
                active,
                ceiling: self.max_listeners,
            });
        }
        Ok(tx.subscribe())
    }

    // A send error only means nobody is listening yet; the chunk is then
    // intentionally dropped, like output written before any pipe reader.
    pub(crate) fn publish_stdout(&self, chunk: Vec<u8>) {
        let _ = self.stdout_tx.send(chunk);
    }

    pub(crate) fn publish_stderr(&self, chunk: Vec<u8>) {
        let _ = self.stderr_tx.send(chunk);
    }

    pub(crate) fn publish_exit(&self, signal: ExitSignal) {
        let _ = self.exit_tx.send(signal);
    }
}

// ── Supervision ───────────────────────────────────────────────────────────────

/// Launch-side contract for a supervised helper.
///
/// The production implementation is [`HelperSupervisor`]; tests use
/// [`mock::MockHelperProcess`].  `start` is separate from construction so
/// callers can attach their listeners before the first chunk is published.
pub trait SupervisedHelper: Send {
    fn subscribe_stdout(&self) -> Result<broadcast::Receiver<Vec<u8>>, SubscribeError>;
    fn subscribe_stderr(&self) -> Result<broadcast::Receiver<Vec<u8>>, SubscribeError>;
    fn subscribe_exit(&self) -> Result<broadcast::Receiver<ExitSignal>, SubscribeError>;

    /// Begins pumping the process streams.  Idempotent; the second and
    /// later calls do nothing.
    fn start(&mut self);

    fn state(&self) -> ProcessState;
}

/// IO handles held between spawn and start.
struct ChildIo {
    child: tokio::process::Child,
    stdout: tokio::process::ChildStdout,
    stderr: tokio::process::ChildStderr,
}

/// Supervises exactly one spawned helper binary.
pub struct HelperSupervisor {
    hub: Arc<StreamHub>,
    state: Arc<Mutex<ProcessState>>,
    io: Option<ChildIo>,
}

impl HelperSupervisor {
    /// Spawns the binary at `path` with piped stdout/stderr.
    ///
    /// The child starts running immediately, but nothing is read from its
    /// pipes until [`SupervisedHelper::start`] is called — the OS buffers
    /// early output, so listeners attached in between lose nothing.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError::Io`] when the OS refuses the spawn.
    pub fn spawn(path: &Path, settings: StreamSettings) -> Result<Self, SpawnError> {
        let display_path = path.to_string_lossy().into_owned();

        let mut child = tokio::process::Command::new(path)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SpawnError::Io {
                path: display_path.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| SpawnError::MissingPipe {
            path: display_path.clone(),
            stream: "stdout",
        })?;
        let stderr = child.stderr.take().ok_or_else(|| SpawnError::MissingPipe {
            path: display_path.clone(),
            stream: "stderr",
        })?;

        debug!("helper {display_path} spawned (pid {:?})", child.id());

        Ok(Self {
            hub: Arc::new(StreamHub::new(settings)),
            state: Arc::new(Mutex::new(ProcessState::Running)),
            io: Some(ChildIo {
                child,
                stdout,
                stderr,
            }),
        })
    }

    /// The hub carrying this process's three streams.
    pub fn hub(&self) -> Arc<StreamHub> {
        Arc::clone(&self.hub)
    }
}

impl SupervisedHelper for HelperSupervisor {
    fn subscribe_stdout(&self) -> Result<broadcast::Receiver<Vec<u8>>, SubscribeError> {
        self.hub.subscribe_stdout()
    }

    fn subscribe_stderr(&self) -> Result<broadcast::Receiver<Vec<u8>>, SubscribeError> {
        self.hub.subscribe_stderr()
    }

    fn subscribe_exit(&self) -> Result<broadcast::Receiver<ExitSignal>, SubscribeError> {
        self.hub.subscribe_exit()
    }

    fn start(&mut self) {
        let Some(io) = self.io.take() else {
            return;
        };

        let hub = Arc::clone(&self.hub);
        let state = Arc::clone(&self.state);

        tokio::spawn(async move {
            let ChildIo {
                mut child,
                stdout,
                stderr,
            } = io;

            // Both pipes drain concurrently; the exit signal is not
            // published until both have hit EOF, so every chunk is already
            // in its channel when the exit lands.
            tokio::join!(
                pump_pipe(stdout, &hub, PipeKind::Stdout),
                pump_pipe(stderr, &hub, PipeKind::Stderr),
            );

            let exit_code = match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!("failed to reap helper: {e}");
                    None
                }
            };

            *state.lock().expect("lock poisoned") = ProcessState::Terminated { exit_code };
            hub.publish_exit(ExitSignal { exit_code });
            debug!("helper exited with {exit_code:?}");
        });
    }

    fn state(&self) -> ProcessState {
        *self.state.lock().expect("lock poisoned")
    }
}

/// Reads `reader` to EOF, publishing each chunk on its stream.
///
/// A read failure is surfaced to listeners as a diagnostic chunk on the
/// stderr stream, then the pump stops; it never vanishes silently.
async fn pump_pipe<R>(mut reader: R, hub: &StreamHub, pipe: PipeKind)
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = [0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => match pipe {
                PipeKind::Stdout => hub.publish_stdout(buf[..n].to_vec()),
                PipeKind::Stderr => hub.publish_stderr(buf[..n].to_vec()),
            },
            Err(e) => {
                warn!("{pipe} read failed: {e}");
                hub.publish_stderr(format!("{pipe} read failed: {e}").into_bytes());
                break;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
