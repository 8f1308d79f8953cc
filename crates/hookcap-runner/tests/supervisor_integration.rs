//! Integration tests for the real process supervisor.
//!
//! These spawn actual OS processes (small shell scripts written to a temp
//! directory), so they are unix-only.  They verify the live half of what
//! the mock-based tests assert: stdout/stderr chunks reach subscribers in
//! order, the exit signal arrives exactly once after all data, and the
//! supervisor state ends up `Terminated` with the real exit code.

#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;

use hookcap_runner::infrastructure::process::{
    ExitSignal, HelperSupervisor, ProcessState, SpawnError, StreamSettings, SupervisedHelper,
};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);

/// Writes an executable shell script into a fresh temp path.
fn write_script(name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let dir = std::env::temp_dir().join(format!("hookcap_it_{}_{name}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).expect("write script");

    let mut perms = std::fs::metadata(&path).expect("stat").permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).expect("chmod");
    path
}

#[tokio::test]
async fn test_supervisor_delivers_stdout_then_exit() {
    // Arrange – a stub helper that prints one key press and exits cleanly.
    let script = write_script("press_ok", "printf 'KEYPRESS:13\\n'\nexit 0\n");
    let mut supervisor =
        HelperSupervisor::spawn(&script, StreamSettings::default()).expect("spawn");

    let mut stdout_rx = supervisor.subscribe_stdout().expect("stdout");
    // A second listener through the shared hub observes the same stream.
    let mut hub_rx = supervisor.hub().subscribe_stdout().expect("hub stdout");
    let mut exit_rx = supervisor.subscribe_exit().expect("exit");

    // Act
    supervisor.start();
    let exit = timeout(WAIT, exit_rx.recv())
        .await
        .expect("exit within timeout")
        .expect("exit signal");

    // Assert – the exit signal lands only after the data chunk was
    // published, so the chunk is already waiting in the tap.
    assert_eq!(exit, ExitSignal { exit_code: Some(0) });

    for rx in [&mut stdout_rx, &mut hub_rx] {
        let mut captured = Vec::new();
        while let Ok(chunk) = rx.try_recv() {
            captured.extend_from_slice(&chunk);
        }
        assert_eq!(captured, b"KEYPRESS:13\n");
    }

    assert_eq!(
        supervisor.state(),
        ProcessState::Terminated { exit_code: Some(0) }
    );
}

#[tokio::test]
async fn test_supervisor_keeps_stdout_chunks_in_order() {
    // Arrange – several writes; chunk boundaries may merge, order may not
    // change.
    let script = write_script(
        "press_many",
        "for k in 65 66 67 68 69; do printf \"KEYPRESS:$k\\n\"; done\nexit 0\n",
    );
    let mut supervisor =
        HelperSupervisor::spawn(&script, StreamSettings::default()).expect("spawn");

    let mut stdout_rx = supervisor.subscribe_stdout().expect("stdout");
    let mut exit_rx = supervisor.subscribe_exit().expect("exit");

    // Act
    supervisor.start();
    timeout(WAIT, exit_rx.recv())
        .await
        .expect("exit within timeout")
        .expect("exit signal");

    let mut captured = Vec::new();
    while let Ok(chunk) = stdout_rx.try_recv() {
        captured.extend_from_slice(&chunk);
    }

    // Assert
    assert_eq!(
        String::from_utf8_lossy(&captured),
        "KEYPRESS:65\nKEYPRESS:66\nKEYPRESS:67\nKEYPRESS:68\nKEYPRESS:69\n"
    );
}

#[tokio::test]
async fn test_supervisor_reports_stderr_and_nonzero_exit() {
    // Arrange
    let script = write_script("press_fail", "printf 'boom' 1>&2\nexit 3\n");
    let mut supervisor =
        HelperSupervisor::spawn(&script, StreamSettings::default()).expect("spawn");

    let mut stderr_rx = supervisor.subscribe_stderr().expect("stderr");
    let mut exit_rx = supervisor.subscribe_exit().expect("exit");

    // Act
    supervisor.start();
    let exit = timeout(WAIT, exit_rx.recv())
        .await
        .expect("exit within timeout")
        .expect("exit signal");

    // Assert
    assert_eq!(exit, ExitSignal { exit_code: Some(3) });

    let mut diagnostics = Vec::new();
    while let Ok(chunk) = stderr_rx.try_recv() {
        diagnostics.extend_from_slice(&chunk);
    }
    assert_eq!(diagnostics, b"boom");
}

#[tokio::test]
async fn test_exit_signal_is_delivered_exactly_once_per_listener() {
    // Arrange
    let script = write_script("press_quiet", "exit 0\n");
    let mut supervisor =
        HelperSupervisor::spawn(&script, StreamSettings::default()).expect("spawn");

    let mut exit_a = supervisor.subscribe_exit().expect("a");
    let mut exit_b = supervisor.subscribe_exit().expect("b");

    // Act
    supervisor.start();

    // Assert – each listener gets the signal once, then the stream stays
    // silent.
    for rx in [&mut exit_a, &mut exit_b] {
        let signal = timeout(WAIT, rx.recv())
            .await
            .expect("exit within timeout")
            .expect("exit signal");
        assert_eq!(signal, ExitSignal { exit_code: Some(0) });
        assert!(rx.try_recv().is_err(), "no second exit signal");
    }
}

#[tokio::test]
async fn test_spawn_of_missing_binary_fails() {
    // Act
    let result = HelperSupervisor::spawn(
        &PathBuf::from("/nonexistent/hookcap/helper"),
        StreamSettings::default(),
    );

    // Assert
    assert!(matches!(result, Err(SpawnError::Io { .. })));
}
