//! Integration tests for the feedback emitted around single runs.

#![cfg(test)]
#![cfg(unix)]

use novaflow::exec::{ExecutionRequest, OutputMode, Runner, RunnerConfig};
use novaflow::platform::{PlatformId, Shell};

use super::support::{Event, Recorder, recording_runner};

#[tokio::test]
/// What: Success emits begin then the completion message.
async fn feedback_success_sequence() {
    let (runner, recorder) = recording_runner();
    let res = runner
        .run(&ExecutionRequest::capture("true").description("Listing containers"))
        .await;
    assert!(res.success());
    assert_eq!(
        recorder.events(),
        vec![
            Event::Begin("Listing containers".into(), OutputMode::Capture),
            Event::Succeed("Listing containers completed successfully!".into()),
        ]
    );
}

#[tokio::test]
/// What: Failure emits the reason after the label.
async fn feedback_failure_message() {
    let (runner, recorder) = recording_runner();
    runner
        .run(&ExecutionRequest::capture("exit 5").description("restart nginx"))
        .await;
    let events = recorder.events();
    assert_eq!(
        events.last(),
        Some(&Event::Fail("Failed to restart nginx: exited with code 5".into()))
    );
}

#[tokio::test]
/// What: Streaming runs echo the command and warn about sudo on Unix-like platforms.
///
/// Details:
/// - The sudo prefix is only inspected; `sudo -n true` may fail here, the
///   notice is what is asserted.
async fn feedback_stream_echo_and_sudo_notice() {
    let recorder = std::sync::Arc::new(Recorder::default());
    let runner = Runner::for_platform(
        RunnerConfig {
            shell: Some(Shell::posix("/bin/sh")),
            show_command: true,
            sudo_notice: true,
            feedback: recorder.clone(),
            ..RunnerConfig::quiet()
        },
        PlatformId::Linux,
    );
    runner
        .run(&ExecutionRequest::new("sudo -n true 2>/dev/null || true"))
        .await;
    let notices = recorder.notices();
    assert_eq!(notices[0], "Command: sudo -n true 2>/dev/null || true");
    assert_eq!(notices[1], "Platform: linux");
    assert_eq!(notices[2], "This command requires your system password.");
}

#[tokio::test]
/// What: Capture-mode runs never echo or warn.
async fn feedback_capture_is_silent_about_sudo() {
    let recorder = std::sync::Arc::new(Recorder::default());
    let runner = Runner::for_platform(
        RunnerConfig {
            shell: Some(Shell::posix("/bin/sh")),
            show_command: true,
            sudo_notice: true,
            feedback: recorder.clone(),
            ..RunnerConfig::quiet()
        },
        PlatformId::Linux,
    );
    runner.capture("echo sudo is just text").await;
    assert!(recorder.notices().is_empty());
}
