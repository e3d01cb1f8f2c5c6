use std::fmt;
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use super::cancel::CancelSignal;
use super::kill;
use super::request::{ExecutionRequest, OutputMode};
use super::result::{
    self, ExecutionResult, FailureKind, INTERRUPTED_MESSAGE, strip_final_newline,
};
use crate::command::{CommandSpec, ConfigurationError};
use crate::feedback::{Feedback, SilentFeedback, TerminalFeedback};
use crate::platform::{PlatformId, Shell, ShellKind, current_platform, requires_elevation, shell_for_platform};

/// Default limit for capture-mode runs that do not set their own timeout.
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(30);

/// How long to wait for pipe readers after the child exited.
///
/// Grandchildren that inherited the pipes can keep them open forever.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Read chunk size for captured pipes.
const READ_CHUNK: usize = 8192;

/// What: Explicit configuration for a [`Runner`].
///
/// Details:
/// - Replaces process-wide state: every runner owns its configuration, so
///   tests can fabricate one without touching the environment.
#[derive(Clone)]
pub struct RunnerConfig {
    /// Shell override; `None` selects from `COMSPEC`/`SHELL`.
    pub shell: Option<Shell>,
    /// Limit for capture-mode runs without an explicit timeout.
    pub capture_timeout: Option<Duration>,
    /// Limit for streaming runs without an explicit timeout.
    pub stream_timeout: Option<Duration>,
    /// Echo the command line and platform before streaming runs.
    pub show_command: bool,
    /// Print the password hint before streaming `sudo` commands.
    pub sudo_notice: bool,
    /// Treat Ctrl-C as a cancellation of the running child.
    pub handle_interrupts: bool,
    /// Where state transitions are reported.
    pub feedback: Arc<dyn Feedback>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            shell: None,
            capture_timeout: Some(DEFAULT_CAPTURE_TIMEOUT),
            stream_timeout: None,
            show_command: true,
            sudo_notice: true,
            handle_interrupts: true,
            feedback: Arc::new(TerminalFeedback::default()),
        }
    }
}

impl RunnerConfig {
    /// Configuration that prints nothing and ignores Ctrl-C.
    #[must_use]
    pub fn quiet() -> Self {
        Self {
            show_command: false,
            sudo_notice: false,
            handle_interrupts: false,
            feedback: Arc::new(SilentFeedback),
            ..Self::default()
        }
    }
}

impl fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("shell", &self.shell)
            .field("capture_timeout", &self.capture_timeout)
            .field("stream_timeout", &self.stream_timeout)
            .field("show_command", &self.show_command)
            .field("sudo_notice", &self.sudo_notice)
            .field("handle_interrupts", &self.handle_interrupts)
            .field("feedback", &self.feedback)
            .finish()
    }
}

/// What: Spawns resolved command strings through the host shell and
/// supervises them to a normalized [`ExecutionResult`].
///
/// Details:
/// - Cheap to clone; clones share configuration.
/// - Expected failures (missing executable, non-zero exit, timeout, cancel)
///   are results, never panics or `Err`s.
#[derive(Debug, Clone)]
pub struct Runner {
    /// Shared configuration.
    config: Arc<RunnerConfig>,
    /// Platform used for resolution and reporting.
    platform: PlatformId,
    /// Interpreter used to spawn commands.
    shell: Shell,
    /// Optional programmatic cancellation.
    cancel: Option<CancelSignal>,
}

/// Raw outcome of supervising one child, before normalization.
enum Outcome {
    /// Child exited (normally or by signal).
    Exited {
        /// Exit status.
        status: ExitStatus,
        /// Captured stdout/stderr.
        captured: (Option<String>, Option<String>),
    },
    /// Shell could not be launched.
    SpawnFailed(std::io::Error),
    /// Waiting on the child failed.
    WaitFailed(std::io::Error),
    /// Limit elapsed; child was killed.
    TimedOut(Duration),
    /// User cancelled; child was killed.
    Interrupted,
}

impl Runner {
    /// Runner for the host platform.
    #[must_use]
    pub fn new(config: RunnerConfig) -> Self {
        Self::for_platform(config, current_platform())
    }

    /// Runner that reports (and picks its default shell for) `platform`.
    #[must_use]
    pub fn for_platform(config: RunnerConfig, platform: PlatformId) -> Self {
        let shell = config
            .shell
            .clone()
            .unwrap_or_else(|| shell_for_platform(platform));
        Self {
            config: Arc::new(config),
            platform,
            shell,
            cancel: None,
        }
    }

    /// Attach a cancellation signal.
    #[must_use]
    pub fn with_cancel(mut self, signal: CancelSignal) -> Self {
        self.cancel = Some(signal);
        self
    }

    /// Copy of this runner that reports nothing and leaves Ctrl-C alone.
    #[must_use]
    pub fn quiet(&self) -> Self {
        let config = RunnerConfig {
            shell: Some(self.shell.clone()),
            capture_timeout: self.config.capture_timeout,
            stream_timeout: self.config.stream_timeout,
            ..RunnerConfig::quiet()
        };
        Self {
            config: Arc::new(config),
            platform: self.platform,
            shell: self.shell.clone(),
            cancel: self.cancel.clone(),
        }
    }

    /// Platform this runner resolves for.
    #[must_use]
    pub const fn platform(&self) -> PlatformId {
        self.platform
    }

    /// Interpreter used to spawn commands.
    #[must_use]
    pub const fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Feedback sink.
    #[must_use]
    pub fn feedback(&self) -> &dyn Feedback {
        self.config.feedback.as_ref()
    }

    /// Configuration in use.
    #[must_use]
    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// What: Resolve a spec for this runner's platform and run it streaming.
    ///
    /// Inputs:
    /// - `spec`: Literal or platform map.
    /// - `description`: Feedback label.
    ///
    /// Output:
    /// - The run's [`ExecutionResult`].
    ///
    /// # Errors
    /// - Returns [`ConfigurationError`] before spawning anything when the map
    ///   cannot serve the platform.
    pub async fn run_spec(
        &self,
        spec: &CommandSpec,
        description: &str,
    ) -> Result<ExecutionResult, ConfigurationError> {
        let command = spec.resolve(self.platform)?;
        let request = ExecutionRequest::new(command).description(description);
        Ok(self.run(&request).await)
    }

    /// Capture a command's output with the default capture timeout.
    pub async fn capture(&self, command: &str) -> ExecutionResult {
        self.run(&ExecutionRequest::capture(command)).await
    }

    /// What: Run one request to completion.
    ///
    /// Inputs:
    /// - `request`: Resolved command and execution options.
    ///
    /// Output:
    /// - Normalized [`ExecutionResult`]; failures are described, not raised.
    ///
    /// Details:
    /// - Emits feedback before and after; feedback never alters the result.
    /// - Streaming `sudo` commands on Unix get an advisory password notice.
    pub async fn run(&self, request: &ExecutionRequest) -> ExecutionResult {
        let feedback = self.feedback();
        let command = request.command();
        let streaming = request.output_mode() == OutputMode::Stream;

        if streaming && self.config.show_command {
            feedback.notice(&format!("Command: {command}"));
            feedback.notice(&format!("Platform: {}", self.platform));
        }
        if streaming && self.config.sudo_notice && requires_elevation(command, self.platform) {
            feedback.notice("This command requires your system password.");
        }

        let handle = feedback.begin(request.label(), request.output_mode());
        let started = Instant::now();
        let outcome = self.supervise(request).await;
        let result = self.normalize(request, outcome, started.elapsed());

        if result.success() {
            tracing::info!(
                platform = %self.platform,
                exit_code = ?result.exit_code(),
                elapsed_ms = result.elapsed().as_millis(),
                "Command executed on {}: {}",
                self.platform,
                command
            );
            feedback.succeed(handle, &format!("{} completed successfully!", request.label()));
        } else {
            let reason = result.error().unwrap_or("unknown error");
            tracing::error!(
                platform = %self.platform,
                exit_code = ?result.exit_code(),
                failure = ?result.failure(),
                elapsed_ms = result.elapsed().as_millis(),
                "Command failed on {}: {} - {}",
                self.platform,
                command,
                reason
            );
            feedback.fail(handle, &format!("Failed to {}: {reason}", request.label()));
        }
        result
    }

    /// Effective limit for a request: explicit, else the mode default.
    fn effective_timeout(&self, request: &ExecutionRequest) -> Option<Duration> {
        request.explicit_timeout().or(match request.output_mode() {
            OutputMode::Stream => self.config.stream_timeout,
            OutputMode::Capture => self.config.capture_timeout,
        })
    }

    /// Build the shell invocation for a request.
    fn build_command(&self, request: &ExecutionRequest) -> Command {
        let mut cmd = Command::new(self.shell.program());
        cmd.args(self.shell.command_flags());
        append_command_line(&mut cmd, self.shell.kind(), request.command());
        if let Some(dir) = request.working_dir() {
            cmd.current_dir(dir);
        }
        match request.output_mode() {
            OutputMode::Stream => {
                cmd.stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit());
            }
            OutputMode::Capture => {
                cmd.stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped());
                // Own group: terminal Ctrl-C stays with us, timeouts kill the tree.
                #[cfg(unix)]
                cmd.process_group(0);
            }
        }
        cmd.kill_on_drop(true);
        cmd
    }

    /// Spawn and wait for exit, timeout or cancellation, whichever comes first.
    async fn supervise(&self, request: &ExecutionRequest) -> Outcome {
        if self.cancel.as_ref().is_some_and(CancelSignal::is_cancelled) {
            return Outcome::Interrupted;
        }
        let limit = self.effective_timeout(request);
        let own_group = cfg!(unix) && request.output_mode() == OutputMode::Capture;

        let mut child = match self.build_command(request).spawn() {
            Ok(child) => child,
            Err(e) => return Outcome::SpawnFailed(e),
        };
        tracing::debug!(
            pid = ?child.id(),
            shell = %self.shell,
            ?limit,
            "[Exec] Spawned child"
        );
        let pipes = CapturedPipes::attach(&mut child);

        let deadline = async move {
            match limit {
                Some(d) => tokio::time::sleep(d).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            status = child.wait() => match status {
                Ok(status) => Outcome::Exited {
                    status,
                    captured: pipes.collect().await,
                },
                Err(e) => Outcome::WaitFailed(e),
            },
            () = deadline => {
                kill::terminate(&mut child, own_group).await;
                pipes.abandon();
                Outcome::TimedOut(limit.unwrap_or_default())
            }
            () = self.interrupted() => {
                kill::terminate(&mut child, own_group).await;
                pipes.abandon();
                Outcome::Interrupted
            }
        }
    }

    /// Resolve when the user or a cancel handle asks to stop.
    async fn interrupted(&self) {
        let mut signal = self.cancel.clone();
        let watch_ctrl_c = self.config.handle_interrupts;
        let cancelled = async move {
            match signal.as_mut() {
                Some(s) => s.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let ctrl_c = async move {
            if watch_ctrl_c && tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("[Exec] Interrupt received");
                return;
            }
            std::future::pending::<()>().await;
        };
        tokio::select! {
            () = cancelled => {}
            () = ctrl_c => {}
        }
    }

    /// Turn a raw outcome into the public result type.
    fn normalize(
        &self,
        request: &ExecutionRequest,
        outcome: Outcome,
        elapsed: Duration,
    ) -> ExecutionResult {
        let platform = self.platform;
        let command = request.command();
        match outcome {
            Outcome::Exited { status, captured } => {
                self.classify_exit(command, status, captured, elapsed)
            }
            Outcome::SpawnFailed(e) => {
                let program = self.shell.program().display().to_string();
                let (kind, message) = match e.kind() {
                    std::io::ErrorKind::NotFound => {
                        (FailureKind::CommandNotFound, result::not_found_message(&program))
                    }
                    std::io::ErrorKind::PermissionDenied => (
                        FailureKind::PermissionDenied,
                        result::permission_message(&program),
                    ),
                    _ => (
                        FailureKind::SpawnFailed,
                        format!("failed to spawn {program}: {e}"),
                    ),
                };
                ExecutionResult::failed(platform, command, kind, message, None, (None, None), elapsed)
            }
            Outcome::WaitFailed(e) => ExecutionResult::failed(
                platform,
                command,
                FailureKind::SpawnFailed,
                format!("failed to wait for child: {e}"),
                None,
                (None, None),
                elapsed,
            ),
            Outcome::TimedOut(limit) => ExecutionResult::failed(
                platform,
                command,
                FailureKind::TimedOut,
                result::timeout_message(limit),
                None,
                (None, None),
                elapsed,
            ),
            Outcome::Interrupted => ExecutionResult::failed(
                platform,
                command,
                FailureKind::Interrupted,
                INTERRUPTED_MESSAGE,
                None,
                (None, None),
                elapsed,
            ),
        }
    }

    /// Classify an exit status.
    ///
    /// Shell-level "not found" / "not executable" codes become spawn-kind
    /// failures without an exit code.
    fn classify_exit(
        &self,
        command: &str,
        status: ExitStatus,
        captured: (Option<String>, Option<String>),
        elapsed: Duration,
    ) -> ExecutionResult {
        let platform = self.platform;
        let Some(code) = status.code() else {
            return signal_result(platform, command, status, captured, elapsed);
        };
        if code == 0 {
            return ExecutionResult::succeeded(platform, command, Some(0), captured, elapsed);
        }
        let program = first_token(command);
        match (self.shell.kind(), code) {
            (ShellKind::Posix, 127) | (ShellKind::Cmd, 9009) => ExecutionResult::failed(
                platform,
                command,
                FailureKind::CommandNotFound,
                result::not_found_message(program),
                None,
                captured,
                elapsed,
            ),
            (ShellKind::Posix, 126) => ExecutionResult::failed(
                platform,
                command,
                FailureKind::PermissionDenied,
                result::permission_message(program),
                None,
                captured,
                elapsed,
            ),
            _ => {
                let message = result::exit_message(code, captured.1.as_deref());
                ExecutionResult::failed(
                    platform,
                    command,
                    FailureKind::NonZeroExit,
                    message,
                    Some(code),
                    captured,
                    elapsed,
                )
            }
        }
    }
}

/// Append the command line after the shell flags.
///
/// `cmd.exe` gets the line verbatim inside quotes, matching `/s /c` parsing.
fn append_command_line(cmd: &mut Command, kind: ShellKind, line: &str) {
    match kind {
        #[cfg(windows)]
        ShellKind::Cmd => {
            cmd.raw_arg(format!("\"{line}\""));
        }
        _ => {
            cmd.arg(line);
        }
    }
}

/// Result for a child that ended without an exit code.
#[cfg(unix)]
fn signal_result(
    platform: PlatformId,
    command: &str,
    status: ExitStatus,
    captured: (Option<String>, Option<String>),
    elapsed: Duration,
) -> ExecutionResult {
    use std::os::unix::process::ExitStatusExt;

    match status.signal() {
        Some(sig) if sig == nix::sys::signal::Signal::SIGINT as i32 => ExecutionResult::failed(
            platform,
            command,
            FailureKind::Interrupted,
            INTERRUPTED_MESSAGE,
            None,
            captured,
            elapsed,
        ),
        Some(sig) => ExecutionResult::failed(
            platform,
            command,
            FailureKind::Signaled,
            format!("terminated by signal {sig}"),
            None,
            captured,
            elapsed,
        ),
        None => ExecutionResult::failed(
            platform,
            command,
            FailureKind::Signaled,
            "terminated without exit code",
            None,
            captured,
            elapsed,
        ),
    }
}

/// Result for a child that ended without an exit code.
#[cfg(not(unix))]
fn signal_result(
    platform: PlatformId,
    command: &str,
    _status: ExitStatus,
    captured: (Option<String>, Option<String>),
    elapsed: Duration,
) -> ExecutionResult {
    ExecutionResult::failed(
        platform,
        command,
        FailureKind::Signaled,
        "terminated without exit code",
        None,
        captured,
        elapsed,
    )
}

/// First whitespace-separated word of a command line, skipping `sudo`.
fn first_token(command: &str) -> &str {
    let mut words = command.split_whitespace();
    match words.next() {
        Some("sudo") => words.next().unwrap_or("sudo"),
        Some(word) => word,
        None => command,
    }
}

/// Shared buffer filled by a pipe reader task.
type SharedBuf = Arc<Mutex<Vec<u8>>>;

/// Background readers for captured stdout/stderr.
struct CapturedPipes {
    /// Stdout reader and buffer.
    stdout: Option<(JoinHandle<()>, SharedBuf)>,
    /// Stderr reader and buffer.
    stderr: Option<(JoinHandle<()>, SharedBuf)>,
}

impl CapturedPipes {
    /// Start reading whatever pipes the child has.
    fn attach(child: &mut Child) -> Self {
        Self {
            stdout: child.stdout.take().map(spawn_reader),
            stderr: child.stderr.take().map(spawn_reader),
        }
    }

    /// Wait (bounded) for the readers and decode both streams.
    async fn collect(self) -> (Option<String>, Option<String>) {
        let stdout = match self.stdout {
            Some(pipe) => Some(finish_reader(pipe).await),
            None => None,
        };
        let stderr = match self.stderr {
            Some(pipe) => Some(finish_reader(pipe).await),
            None => None,
        };
        (stdout, stderr)
    }

    /// Stop the readers without waiting.
    fn abandon(self) {
        for (task, _) in [self.stdout, self.stderr].into_iter().flatten() {
            task.abort();
        }
    }
}

/// Spawn a task copying `pipe` into a shared buffer until EOF.
fn spawn_reader<R>(mut pipe: R) -> (JoinHandle<()>, SharedBuf)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let buf: SharedBuf = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&buf);
    let task = tokio::spawn(async move {
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    if let Ok(mut b) = sink.lock() {
                        b.extend_from_slice(&chunk[..n]);
                    }
                }
                Err(e) => {
                    tracing::debug!(error = %e, "[Exec] Pipe read error");
                    break;
                }
            }
        }
    });
    (task, buf)
}

/// Wait up to [`DRAIN_GRACE`] for a reader, then decode what it collected.
async fn finish_reader((task, buf): (JoinHandle<()>, SharedBuf)) -> String {
    let abort = task.abort_handle();
    if tokio::time::timeout(DRAIN_GRACE, task).await.is_err() {
        tracing::warn!("[Exec] Output pipe still open after exit; keeping partial output");
        abort.abort();
    }
    let bytes = buf.lock().map(|b| b.clone()).unwrap_or_default();
    strip_final_newline(String::from_utf8_lossy(&bytes).into_owned())
}
