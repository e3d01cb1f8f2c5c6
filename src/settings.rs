//! User settings from `settings.conf` and their mapping onto
//! [`RunnerConfig`].

mod parse;
mod paths;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use paths::ConfigPaths;

use crate::exec::{DEFAULT_CAPTURE_TIMEOUT, RunnerConfig};
use crate::feedback::TerminalFeedback;
use crate::platform::Shell;
use parse::{parse_bool, parse_key_value, skip_comment_or_empty};

/// Log levels accepted by `log_level`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Errors raised while loading settings.
#[derive(Debug)]
pub enum SettingsError {
    /// The settings file exists but cannot be read.
    Io {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read settings {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// What: Values read from `settings.conf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Default tracing level.
    pub log_level: String,
    /// Echo command and platform before streaming runs.
    pub show_command: bool,
    /// Password hint before streaming `sudo` commands.
    pub sudo_notice: bool,
    /// Animated spinner for capture-mode runs.
    pub spinner: bool,
    /// Capture-mode limit (`None` = unbounded).
    pub capture_timeout: Option<Duration>,
    /// Streaming limit (`None` = unbounded).
    pub stream_timeout: Option<Duration>,
    /// Parallel batch concurrency cap (0 = unbounded).
    pub max_parallel: usize,
    /// Shell override.
    pub shell: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            show_command: true,
            sudo_notice: true,
            spinner: true,
            capture_timeout: Some(DEFAULT_CAPTURE_TIMEOUT),
            stream_timeout: None,
            max_parallel: 0,
            shell: None,
        }
    }
}

impl Settings {
    /// What: Parse settings file content.
    ///
    /// Inputs:
    /// - `content`: Text of `settings.conf`.
    ///
    /// Output:
    /// - Settings with every recognized, well-formed key applied over the
    ///   defaults.
    ///
    /// Details:
    /// - Unknown keys and malformed values are logged and ignored.
    #[must_use]
    pub fn parse(content: &str) -> Self {
        let mut settings = Self::default();
        for (idx, line) in content.lines().enumerate() {
            if skip_comment_or_empty(line) {
                continue;
            }
            let Some((key, value)) = parse_key_value(line) else {
                tracing::warn!(line = idx + 1, "[Settings] Ignoring line without '='");
                continue;
            };
            if !settings.apply(&key, &value) {
                tracing::warn!(line = idx + 1, key, value, "[Settings] Ignoring setting");
            }
        }
        settings
    }

    /// Apply one key; `false` when the key is unknown or the value malformed.
    fn apply(&mut self, key: &str, value: &str) -> bool {
        match key {
            "log_level" => {
                let lv = value.to_ascii_lowercase();
                if !LOG_LEVELS.contains(&lv.as_str()) {
                    return false;
                }
                self.log_level = lv;
            }
            "show_command" => return set_bool(&mut self.show_command, value),
            "sudo_notice" => return set_bool(&mut self.sudo_notice, value),
            "spinner" => return set_bool(&mut self.spinner, value),
            "capture_timeout_secs" => return set_timeout(&mut self.capture_timeout, value),
            "stream_timeout_secs" => return set_timeout(&mut self.stream_timeout, value),
            "max_parallel" => match value.parse::<usize>() {
                Ok(n) => self.max_parallel = n,
                Err(_) => return false,
            },
            "shell" => {
                self.shell = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            _ => return false,
        }
        true
    }

    /// What: Load settings from `path`.
    ///
    /// Output:
    /// - Parsed settings, or defaults when the file does not exist.
    ///
    /// # Errors
    /// - [`SettingsError::Io`] when the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "[Settings] Loaded");
                Ok(Self::parse(&content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "[Settings] No settings file; using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Runner configuration with terminal feedback.
    #[must_use]
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            shell: self.shell.as_ref().map(Shell::new),
            capture_timeout: self.capture_timeout,
            stream_timeout: self.stream_timeout,
            show_command: self.show_command,
            sudo_notice: self.sudo_notice,
            handle_interrupts: true,
            feedback: Arc::new(TerminalFeedback::new(self.spinner)),
        }
    }

    /// Parallel concurrency cap, if any.
    #[must_use]
    pub const fn parallel_limit(&self) -> Option<usize> {
        if self.max_parallel == 0 {
            None
        } else {
            Some(self.max_parallel)
        }
    }
}

/// Store a parsed boolean.
fn set_bool(slot: &mut bool, value: &str) -> bool {
    let Some(b) = parse_bool(value) else {
        return false;
    };
    *slot = b;
    true
}

/// Store a timeout in seconds; `0` means unbounded.
fn set_timeout(slot: &mut Option<Duration>, value: &str) -> bool {
    let Ok(secs) = value.parse::<f64>() else {
        return false;
    };
    match Duration::try_from_secs_f64(secs) {
        Ok(limit) => {
            *slot = (!limit.is_zero()).then_some(limit);
            true
        }
        Err(_) => false,
    }
}
