//! Execution feedback: busy indicator and success/failure lines.
//!
//! Feedback is purely observational. Implementations must swallow their own
//! I/O errors so a non-interactive or broken terminal never changes the
//! outcome of a command.

mod spinner;

use std::fmt;
use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::style::Stylize;

use crate::exec::OutputMode;
use spinner::Spinner;

/// What: Sink for execution state transitions.
///
/// Details:
/// - `begin` is called right before spawning, `succeed`/`fail` exactly once
///   afterwards with the handle `begin` returned.
/// - `notice` carries advisory lines (command echo, `sudo` password hint,
///   batch progress and summaries).
pub trait Feedback: Send + Sync + fmt::Debug {
    /// Start the in-progress indicator for `description`.
    fn begin(&self, description: &str, mode: OutputMode) -> FeedbackHandle;
    /// Finish the indicator as succeeded.
    fn succeed(&self, handle: FeedbackHandle, message: &str);
    /// Finish the indicator as failed.
    fn fail(&self, handle: FeedbackHandle, message: &str);
    /// Print an advisory line.
    fn notice(&self, message: &str);
}

/// What: Token tying `succeed`/`fail` to the matching `begin`.
///
/// Details:
/// - Owns the spinner, if one was started; dropping the handle stops it.
#[derive(Debug)]
pub struct FeedbackHandle {
    /// Label passed to `begin`.
    description: String,
    /// Running spinner, if any.
    spinner: Option<Spinner>,
    /// Released when the spinner stops, so the next run may animate.
    slot: Option<Arc<AtomicBool>>,
}

impl FeedbackHandle {
    /// Handle without any terminal state attached.
    pub fn detached(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            spinner: None,
            slot: None,
        }
    }

    /// Label passed to `begin`.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether an animated spinner is attached.
    #[must_use]
    pub const fn is_animated(&self) -> bool {
        self.spinner.is_some()
    }

    /// Stop the spinner (if any) and release the animation slot.
    fn finish(&mut self) {
        if let Some(mut s) = self.spinner.take() {
            s.stop();
        }
        if let Some(slot) = self.slot.take() {
            slot.store(false, Ordering::SeqCst);
        }
    }
}

impl Drop for FeedbackHandle {
    fn drop(&mut self) {
        self.finish();
    }
}

/// What: Feedback rendered on stderr.
///
/// Details:
/// - Capture-mode runs get an animated spinner when stderr is a TTY and no
///   other spinner is active; everything else gets a static line.
/// - Colors are only used when stderr is a TTY.
#[derive(Debug)]
pub struct TerminalFeedback {
    /// Allow the animated spinner at all.
    animate: bool,
    /// Whether stderr is a terminal (decided once).
    tty: bool,
    /// Set while a spinner owns the current line.
    spinner_busy: Arc<AtomicBool>,
}

impl Default for TerminalFeedback {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TerminalFeedback {
    /// Terminal feedback; `animate = false` never draws a spinner.
    #[must_use]
    pub fn new(animate: bool) -> Self {
        Self {
            animate,
            tty: std::io::stderr().is_terminal(),
            spinner_busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Write one line to stderr, ignoring errors.
    fn line(&self, text: &str) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{text}");
        let _ = stderr.flush();
    }
}

impl Feedback for TerminalFeedback {
    fn begin(&self, description: &str, mode: OutputMode) -> FeedbackHandle {
        let message = format!("{description}...");
        let can_animate = self.animate && self.tty && mode == OutputMode::Capture;
        if can_animate
            && self
                .spinner_busy
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return FeedbackHandle {
                description: description.to_string(),
                spinner: Some(Spinner::start(&message)),
                slot: Some(Arc::clone(&self.spinner_busy)),
            };
        }
        if self.tty {
            self.line(&format!("{} {}", "▶".cyan(), message));
        } else {
            self.line(&format!("> {message}"));
        }
        FeedbackHandle::detached(description)
    }

    fn succeed(&self, mut handle: FeedbackHandle, message: &str) {
        handle.finish();
        if self.tty {
            self.line(&format!("{} {}", "✔".green(), message.green()));
        } else {
            self.line(&format!("[ok] {message}"));
        }
    }

    fn fail(&self, mut handle: FeedbackHandle, message: &str) {
        handle.finish();
        if self.tty {
            self.line(&format!("{} {}", "✖".red(), message.red()));
        } else {
            self.line(&format!("[failed] {message}"));
        }
    }

    fn notice(&self, message: &str) {
        if self.tty {
            self.line(&message.dark_grey().to_string());
        } else {
            self.line(message);
        }
    }
}

/// Feedback that only logs, for probes, dashboards and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentFeedback;

impl Feedback for SilentFeedback {
    fn begin(&self, description: &str, mode: OutputMode) -> FeedbackHandle {
        tracing::debug!(description, ?mode, "[Feedback] begin");
        FeedbackHandle::detached(description)
    }

    fn succeed(&self, handle: FeedbackHandle, message: &str) {
        tracing::debug!(description = handle.description(), message, "[Feedback] succeeded");
    }

    fn fail(&self, handle: FeedbackHandle, message: &str) {
        tracing::debug!(description = handle.description(), message, "[Feedback] failed");
    }

    fn notice(&self, message: &str) {
        tracing::debug!(message, "[Feedback] notice");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Streaming runs never animate, even with animation enabled.
    ///
    /// Details:
    /// - The child owns the terminal in streaming mode.
    fn feedback_stream_mode_is_static() {
        let fb = TerminalFeedback::new(true);
        let handle = fb.begin("Pulling image", OutputMode::Stream);
        assert!(!handle.is_animated());
        assert_eq!(handle.description(), "Pulling image");
        fb.succeed(handle, "Pulling image completed successfully!");
    }

    #[test]
    /// What: Only one spinner may own the line at a time.
    fn feedback_single_spinner_slot() {
        let fb = TerminalFeedback {
            animate: true,
            tty: true,
            spinner_busy: Arc::new(AtomicBool::new(true)),
        };
        let handle = fb.begin("Listing containers", OutputMode::Capture);
        assert!(!handle.is_animated());
        fb.fail(handle, "Failed to list containers");
        assert!(fb.spinner_busy.load(Ordering::SeqCst));
    }

    #[test]
    /// What: Finishing a handle releases the spinner slot.
    fn feedback_finish_releases_slot() {
        let slot = Arc::new(AtomicBool::new(true));
        let mut handle = FeedbackHandle {
            description: "x".into(),
            spinner: None,
            slot: Some(Arc::clone(&slot)),
        };
        handle.finish();
        assert!(!slot.load(Ordering::SeqCst));
    }
}
