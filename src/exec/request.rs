use std::path::{Path, PathBuf};
use std::time::Duration;

/// Description used when the caller does not supply one.
const DEFAULT_DESCRIPTION: &str = "Running command";

/// What: Where the child's standard streams go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Child inherits the terminal: live output, interactive input.
    #[default]
    Stream,
    /// Output is buffered and returned; nothing reaches the terminal.
    Capture,
}

/// What: Execution options shared by every item of a batch.
///
/// Details:
/// - `timeout: None` means "use the runner's default for the mode".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Stream or capture.
    pub mode: OutputMode,
    /// Wall-clock limit from spawn to exit.
    pub timeout: Option<Duration>,
    /// Working directory override.
    pub cwd: Option<PathBuf>,
}

impl ExecOptions {
    /// Capture-mode options with runner defaults otherwise.
    #[must_use]
    pub fn capture() -> Self {
        Self {
            mode: OutputMode::Capture,
            ..Self::default()
        }
    }
}

/// What: A resolved command line plus everything needed to run it once.
///
/// Details:
/// - Built right before spawning and discarded afterwards.
/// - The command string is opaque: it is handed to the shell verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Platform-specific command line.
    command: String,
    /// Human-readable label for feedback.
    description: String,
    /// Stream/capture, timeout and working directory.
    options: ExecOptions,
}

impl ExecutionRequest {
    /// Streaming request with the default description.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            description: DEFAULT_DESCRIPTION.to_string(),
            options: ExecOptions::default(),
        }
    }

    /// Capture-mode request, the usual shape for probing data for a menu.
    pub fn capture(command: impl Into<String>) -> Self {
        Self::new(command).mode(OutputMode::Capture)
    }

    /// Set the feedback label. Blank labels keep the default.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        if !description.trim().is_empty() {
            self.description = description;
        }
        self
    }

    /// Set the output mode.
    #[must_use]
    pub const fn mode(mut self, mode: OutputMode) -> Self {
        self.options.mode = mode;
        self
    }

    /// Set an explicit timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// Run in `dir` instead of the current directory.
    #[must_use]
    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(dir.into());
        self
    }

    /// Replace all options at once.
    #[must_use]
    pub fn options(mut self, options: ExecOptions) -> Self {
        self.options = options;
        self
    }

    /// Command line handed to the shell.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Feedback label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.description
    }

    /// Output mode.
    #[must_use]
    pub const fn output_mode(&self) -> OutputMode {
        self.options.mode
    }

    /// Explicit timeout, if any.
    #[must_use]
    pub const fn explicit_timeout(&self) -> Option<Duration> {
        self.options.timeout
    }

    /// Working directory override, if any.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.options.cwd.as_deref()
    }
}
