use std::fmt;
use std::time::Duration;

use crate::platform::PlatformId;

/// What: Why a command did not succeed.
///
/// Details:
/// - `CommandNotFound`, `PermissionDenied` and `SpawnFailed` never carry an
///   exit code; the process either never started or the shell reported that
///   the executable could not be launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Shell or target executable does not exist.
    CommandNotFound,
    /// Shell or target executable is not executable by this user.
    PermissionDenied,
    /// Any other OS error while launching.
    SpawnFailed,
    /// Process ran and exited with a non-zero code.
    NonZeroExit,
    /// Process was terminated by a signal.
    Signaled,
    /// Process exceeded its wall-clock limit and was killed.
    TimedOut,
    /// User cancelled (Ctrl-C or a cancel handle).
    Interrupted,
}

impl FailureKind {
    /// Whether the failure happened before the command itself could run.
    #[must_use]
    pub const fn is_spawn_error(self) -> bool {
        matches!(
            self,
            Self::CommandNotFound | Self::PermissionDenied | Self::SpawnFailed
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CommandNotFound => "command not found",
            Self::PermissionDenied => "permission denied",
            Self::SpawnFailed => "spawn failed",
            Self::NonZeroExit => "non-zero exit",
            Self::Signaled => "signaled",
            Self::TimedOut => "timed out",
            Self::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// What: Normalized outcome of one command run.
///
/// Details:
/// - Value type: fields are private and only readable through accessors.
/// - `stdout`/`stderr` are `Some` only in capture mode.
/// - `error` is a one-line, human-readable explanation meant to be shown
///   verbatim by menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Overall success flag.
    success: bool,
    /// Platform the command was resolved and run on.
    platform: PlatformId,
    /// Command line that was handed to the shell.
    command: String,
    /// Captured standard output.
    stdout: Option<String>,
    /// Captured standard error.
    stderr: Option<String>,
    /// Exit code when the process exited normally.
    exit_code: Option<i32>,
    /// Failure explanation.
    error: Option<String>,
    /// Failure classification.
    failure: Option<FailureKind>,
    /// Wall-clock time from spawn to result.
    elapsed: Duration,
}

impl ExecutionResult {
    /// Successful run.
    pub(crate) fn succeeded(
        platform: PlatformId,
        command: impl Into<String>,
        exit_code: Option<i32>,
        captured: (Option<String>, Option<String>),
        elapsed: Duration,
    ) -> Self {
        Self {
            success: true,
            platform,
            command: command.into(),
            stdout: captured.0,
            stderr: captured.1,
            exit_code,
            error: None,
            failure: None,
            elapsed,
        }
    }

    /// Failed run.
    pub(crate) fn failed(
        platform: PlatformId,
        command: impl Into<String>,
        failure: FailureKind,
        error: impl Into<String>,
        exit_code: Option<i32>,
        captured: (Option<String>, Option<String>),
        elapsed: Duration,
    ) -> Self {
        Self {
            success: false,
            platform,
            command: command.into(),
            stdout: captured.0,
            stderr: captured.1,
            exit_code,
            error: Some(error.into()),
            failure: Some(failure),
            elapsed,
        }
    }

    /// Whether the command succeeded.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Platform the command ran on.
    #[must_use]
    pub const fn platform(&self) -> PlatformId {
        self.platform
    }

    /// Command line that was run.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Captured standard output (capture mode only).
    #[must_use]
    pub fn stdout(&self) -> Option<&str> {
        self.stdout.as_deref()
    }

    /// Captured standard error (capture mode only).
    #[must_use]
    pub fn stderr(&self) -> Option<&str> {
        self.stderr.as_deref()
    }

    /// Exit code, when the process exited on its own.
    #[must_use]
    pub const fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// One-line failure explanation.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Failure classification.
    #[must_use]
    pub const fn failure(&self) -> Option<FailureKind> {
        self.failure
    }

    /// Wall-clock time from spawn to result.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Consume the result, keeping only captured stdout.
    #[must_use]
    pub fn into_stdout(self) -> Option<String> {
        self.stdout
    }
}

/// Message for a launch that failed because the executable is missing.
pub(crate) fn not_found_message(program: &str) -> String {
    format!("command not found: {program}")
}

/// Message for a launch refused by file permissions.
pub(crate) fn permission_message(program: &str) -> String {
    format!("permission denied: {program}")
}

/// Message for a non-zero exit, with the first line of stderr when present.
pub(crate) fn exit_message(code: i32, stderr: Option<&str>) -> String {
    let detail = stderr.and_then(first_meaningful_line);
    match detail {
        Some(line) => format!("exited with code {code}: {line}"),
        None => format!("exited with code {code}"),
    }
}

/// Message for a timeout.
pub(crate) fn timeout_message(limit: Duration) -> String {
    format!("timed out after {} seconds", format_seconds(limit))
}

/// Message for a user cancellation.
pub(crate) const INTERRUPTED_MESSAGE: &str = "cancelled by user";

/// Render a duration as whole seconds, or with two decimals below that.
///
/// Very short limits get more decimals so at least one digit is significant.
fn format_seconds(d: Duration) -> String {
    if d.subsec_nanos() == 0 {
        return d.as_secs().to_string();
    }
    let secs = d.as_secs_f64();
    let mut precision = 2;
    let mut s = format!("{secs:.precision$}");
    while precision < 9 && s.trim_end_matches(['0', '.']).is_empty() {
        precision += 1;
        s = format!("{secs:.precision$}");
    }
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// First non-blank stderr line with ANSI escapes removed.
fn first_meaningful_line(text: &str) -> Option<String> {
    text.lines()
        .map(strip_ansi_escapes::strip_str)
        .map(|l| l.trim().to_string())
        .find(|l| !l.is_empty())
}

/// Drop exactly one trailing line terminator (`\n` or `\r\n`).
pub(crate) fn strip_final_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
