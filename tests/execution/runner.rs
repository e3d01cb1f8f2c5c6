//! Integration tests for single command runs.
//!
//! Tests cover:
//! - Exit status mapping (success, non-zero, missing executable, missing
//!   shell, permission denied, signals)
//! - Captured output and the trailing newline
//! - Timeouts, cancellation and working directories

#![cfg(test)]
#![cfg(unix)]

use std::time::{Duration, Instant};

use novaflow::command::{CommandSpec, PlatformMap};
use novaflow::exec::{CancelHandle, ExecutionRequest, FailureKind, Runner, RunnerConfig};
use novaflow::platform::{PlatformId, Shell};

use super::support::sh_runner;

#[tokio::test]
/// What: A zero exit is a success with exit code 0.
async fn runner_exit_zero_succeeds() {
    let res = sh_runner().run(&ExecutionRequest::new("exit 0")).await;
    assert!(res.success());
    assert_eq!(res.exit_code(), Some(0));
    assert!(res.error().is_none());
    assert!(res.stdout().is_none());
}

#[tokio::test]
/// What: A non-zero exit keeps the code and mentions it in the error.
async fn runner_non_zero_exit() {
    let res = sh_runner().run(&ExecutionRequest::new("exit 3")).await;
    assert!(!res.success());
    assert_eq!(res.exit_code(), Some(3));
    assert_eq!(res.failure(), Some(FailureKind::NonZeroExit));
    assert!(res.error().expect("error").contains('3'));
}

#[tokio::test]
/// What: A missing executable is reported as not found, without exit code.
async fn runner_missing_executable() {
    let res = sh_runner()
        .capture("novaflow-definitely-missing-binary --flag")
        .await;
    assert!(!res.success());
    assert_eq!(res.failure(), Some(FailureKind::CommandNotFound));
    assert_eq!(res.exit_code(), None);
    assert_eq!(
        res.error(),
        Some("command not found: novaflow-definitely-missing-binary")
    );
}

#[tokio::test]
/// What: A shell that cannot be spawned is reported as not found.
///
/// Details:
/// - The failure names the shell; no exit code is reported.
async fn runner_missing_shell() {
    let runner = Runner::new(RunnerConfig {
        shell: Some(Shell::posix("/nonexistent/sh")),
        ..RunnerConfig::quiet()
    });
    let res = runner.capture("echo unreachable").await;
    assert!(!res.success());
    assert_eq!(res.failure(), Some(FailureKind::CommandNotFound));
    assert_eq!(res.exit_code(), None);
    assert_eq!(res.error(), Some("command not found: /nonexistent/sh"));
}

#[tokio::test]
/// What: A file without execute permission maps to permission denied.
async fn runner_permission_denied() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("noexec.sh"), "echo never\n").expect("write");
    let res = sh_runner()
        .run(&ExecutionRequest::capture("./noexec.sh").cwd(dir.path()))
        .await;
    assert!(!res.success());
    assert_eq!(res.failure(), Some(FailureKind::PermissionDenied));
    assert_eq!(res.exit_code(), None);
    assert_eq!(res.error(), Some("permission denied: ./noexec.sh"));
}

#[tokio::test]
/// What: A child killed by a signal reports the signal number.
async fn runner_terminated_by_signal() {
    let res = sh_runner().capture("kill -TERM $$").await;
    assert!(!res.success());
    assert_eq!(res.failure(), Some(FailureKind::Signaled));
    assert_eq!(res.exit_code(), None);
    assert_eq!(res.error(), Some("terminated by signal 15"));
}

#[tokio::test]
/// What: Capture mode returns stdout without the final newline.
async fn runner_capture_output() {
    let res = sh_runner().capture("echo hello").await;
    assert!(res.success());
    assert_eq!(res.stdout(), Some("hello"));

    let res = sh_runner().capture("printf 'a\\nb\\n\\n'").await;
    assert_eq!(res.stdout(), Some("a\nb\n"));
}

#[tokio::test]
/// What: Captured stderr is kept and its first line explains the failure.
async fn runner_capture_stderr_in_error() {
    let res = sh_runner()
        .capture("echo 'disk is full' >&2; echo more >&2; exit 4")
        .await;
    assert_eq!(res.exit_code(), Some(4));
    assert_eq!(res.stderr(), Some("disk is full\nmore"));
    let err = res.error().expect("error");
    assert!(err.contains("disk is full"));
    assert!(!err.contains("more"));
}

#[tokio::test]
/// What: A timeout kills the child and returns promptly.
async fn runner_timeout_kills_child() {
    let started = Instant::now();
    let res = sh_runner()
        .run(&ExecutionRequest::capture("sleep 5").timeout(Duration::from_millis(200)))
        .await;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!res.success());
    assert_eq!(res.failure(), Some(FailureKind::TimedOut));
    assert_eq!(res.exit_code(), None);
    assert_eq!(res.error(), Some("timed out after 0.2 seconds"));
}

#[tokio::test]
/// What: Streaming runs honor their limit the same way.
async fn runner_stream_timeout() {
    let runner = Runner::new(RunnerConfig {
        shell: Some(Shell::posix("/bin/sh")),
        stream_timeout: Some(Duration::from_millis(200)),
        ..RunnerConfig::quiet()
    });
    let started = Instant::now();
    let res = runner.run(&ExecutionRequest::new("sleep 5")).await;
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(res.failure(), Some(FailureKind::TimedOut));
    assert_eq!(res.exit_code(), None);
    assert_eq!(res.error(), Some("timed out after 0.2 seconds"));
}

#[tokio::test]
/// What: Grandchildren holding the pipes do not keep a timed-out run alive.
async fn runner_timeout_kills_process_group() {
    let started = Instant::now();
    let res = sh_runner()
        .run(
            &ExecutionRequest::capture("sleep 5 & sleep 5; wait")
                .timeout(Duration::from_millis(200)),
        )
        .await;
    assert_eq!(res.failure(), Some(FailureKind::TimedOut));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
/// What: Cancelling a handle interrupts the running child.
async fn runner_cancel_interrupts() {
    let handle = CancelHandle::new();
    let runner = sh_runner().with_cancel(handle.signal());
    let canceller = handle.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(150)).await;
        canceller.cancel();
    });
    let started = Instant::now();
    let res = runner.run(&ExecutionRequest::capture("sleep 5")).await;
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(res.failure(), Some(FailureKind::Interrupted));
    assert_eq!(res.error(), Some("cancelled by user"));
}

#[tokio::test]
/// What: The working directory override is honored.
async fn runner_working_directory() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("marker.txt"), "x").expect("write");
    let res = sh_runner()
        .run(&ExecutionRequest::capture("ls").cwd(dir.path()))
        .await;
    assert!(res.success());
    assert_eq!(res.stdout(), Some("marker.txt"));
}

#[tokio::test]
/// What: Platform maps resolve before running; the result names the platform.
async fn runner_run_spec_with_platform_map() {
    let runner = sh_runner();
    let spec: CommandSpec = PlatformMap::new()
        .with_platform(PlatformId::Windows, "exit 9")
        .with_default("exit 0")
        .into();
    let res = runner.run_spec(&spec, "Check").await.expect("resolvable");
    assert!(res.success());
    assert_eq!(res.platform(), runner.platform());
    assert_eq!(res.command(), "exit 0");

    let empty: CommandSpec = PlatformMap::new().into();
    assert!(runner.run_spec(&empty, "Broken").await.is_err());
}
