//! Scripted command executor for unit and integration testing.
//!
//! Records every invocation and replays scripted outcomes in order, so
//! tests can assert the exact argv the pipeline issued without running a
//! real compiler or chmod.

use std::collections::VecDeque;
use std::io;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CommandExecutor, CommandOutput, ExecError};

/// One recorded invocation: program name plus argv.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: String,
    pub args: Vec<String>,
}

/// Scripted outcome for one invocation.
#[derive(Debug, Clone)]
enum ScriptedOutcome {
    Output(CommandOutput),
    /// The program could not be launched at all.
    LaunchFailure(String),
}

/// A [`CommandExecutor`] double that records calls and replays scripted
/// outcomes.  When the script runs dry, every further call succeeds with an
/// empty zero-exit output.
#[derive(Default)]
pub struct ScriptedExecutor {
    calls: Mutex<Vec<RecordedCall>>,
    script: Mutex<VecDeque<ScriptedOutcome>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a full command output for the next unscripted call.
    pub fn push_output(&self, output: CommandOutput) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(ScriptedOutcome::Output(output));
    }

    /// Queues a non-zero exit with the given stderr text.
    pub fn push_failure(&self, exit_code: i32, stderr: &str) {
        self.push_output(CommandOutput {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        });
    }

    /// Queues a launch failure (program not found).
    pub fn push_launch_failure(&self, message: &str) {
        self.script
            .lock()
            .expect("lock poisoned")
            .push_back(ScriptedOutcome::LaunchFailure(message.to_string()));
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("lock poisoned").len()
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, ExecError> {
        self.calls.lock().expect("lock poisoned").push(RecordedCall {
            program: program.to_string(),
            args: args.to_vec(),
        });

        match self.script.lock().expect("lock poisoned").pop_front() {
            Some(ScriptedOutcome::Output(output)) => Ok(output),
            Some(ScriptedOutcome::LaunchFailure(message)) => Err(ExecError::Launch {
                program: program.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, message),
            }),
            None => Ok(CommandOutput::ok()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
