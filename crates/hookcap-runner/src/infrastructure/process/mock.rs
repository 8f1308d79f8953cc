//! Mock supervised helper for testing.
//!
//! Allows tests to feed synthetic stdout/stderr chunks and a close signal
//! through a real [`StreamHub`] without spawning an OS process.  Chunks can
//! be *scripted* (queued up front, replayed when `start` is called — the
//! same call order the pipeline uses) or *injected* live after listeners
//! are attached.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use super::{ExitSignal, ProcessState, StreamHub, StreamSettings, SubscribeError, SupervisedHelper};

/// One queued signal for scripted replay.
#[derive(Debug, Clone)]
enum ScriptItem {
    Stdout(Vec<u8>),
    Stderr(Vec<u8>),
    Close(Option<i32>),
}

/// A mock implementation of [`SupervisedHelper`].
pub struct MockHelperProcess {
    hub: Arc<StreamHub>,
    state: Arc<Mutex<ProcessState>>,
    script: Mutex<VecDeque<ScriptItem>>,
}

impl MockHelperProcess {
    pub fn new(settings: StreamSettings) -> Self {
        Self {
            hub: Arc::new(StreamHub::new(settings)),
            state: Arc::new(Mutex::new(ProcessState::Starting)),
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// The hub backing this mock, for extra test-side subscriptions.
    pub fn hub(&self) -> Arc<StreamHub> {
        Arc::clone(&self.hub)
    }

    /// Shared state handle, observable after the mock is boxed away.
    pub fn state_handle(&self) -> Arc<Mutex<ProcessState>> {
        Arc::clone(&self.state)
    }

    // ── Scripted replay ───────────────────────────────────────────────────────

    /// Queues a stdout chunk to be published when `start` runs.
    pub fn script_stdout(&self, chunk: &[u8]) {
        self.push(ScriptItem::Stdout(chunk.to_vec()));
    }

    /// Queues a stderr chunk to be published when `start` runs.
    pub fn script_stderr(&self, chunk: &[u8]) {
        self.push(ScriptItem::Stderr(chunk.to_vec()));
    }

    /// Queues the close signal.  Items scripted after it are ignored,
    /// matching the real supervisor's exit-is-last behaviour.
    pub fn script_close(&self, exit_code: Option<i32>) {
        self.push(ScriptItem::Close(exit_code));
    }

    fn push(&self, item: ScriptItem) {
        self.script.lock().expect("lock poisoned").push_back(item);
    }

    // ── Live injection ────────────────────────────────────────────────────────

    /// Publishes a stdout chunk immediately, as if read from the pipe.
    ///
    /// Panics if the mock process has already terminated.
    pub fn inject_stdout(&self, chunk: &[u8]) {
        assert!(!self.is_terminated(), "inject_stdout after close");
        self.hub.publish_stdout(chunk.to_vec());
    }

    /// Publishes a stderr chunk immediately.
    ///
    /// Panics if the mock process has already terminated.
    pub fn inject_stderr(&self, chunk: &[u8]) {
        assert!(!self.is_terminated(), "inject_stderr after close");
        self.hub.publish_stderr(chunk.to_vec());
    }

    /// Terminates the mock process and publishes the exit signal.
    ///
    /// Termination is absorbing: a second close is ignored, so the exit
    /// signal is delivered exactly once.
    pub fn close(&self, exit_code: Option<i32>) {
        let mut state = self.state.lock().expect("lock poisoned");
        if matches!(*state, ProcessState::Terminated { .. }) {
            return;
        }
        *state = ProcessState::Terminated { exit_code };
        drop(state);
        self.hub.publish_exit(ExitSignal { exit_code });
    }

    fn is_terminated(&self) -> bool {
        matches!(
            *self.state.lock().expect("lock poisoned"),
            ProcessState::Terminated { .. }
        )
    }
}

impl SupervisedHelper for MockHelperProcess {
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
        {
            let mut state = self.state.lock().expect("lock poisoned");
            if !matches!(*state, ProcessState::Starting) {
                return;
            }
            *state = ProcessState::Running;
        }

        let items: Vec<ScriptItem> = self.script.lock().expect("lock poisoned").drain(..).collect();
        for item in items {
            match item {
                ScriptItem::Stdout(chunk) => self.hub.publish_stdout(chunk),
                ScriptItem::Stderr(chunk) => self.hub.publish_stderr(chunk),
                ScriptItem::Close(exit_code) => {
                    self.close(exit_code);
                    break;
                }
            }
        }
    }

    fn state(&self) -> ProcessState {
        *self.state.lock().expect("lock poisoned")
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
