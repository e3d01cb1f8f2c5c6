//! Live watch view: re-runs capture-mode commands on a fixed interval and
//! redraws their output until the user quits.
//!
//! The redraw timer, the key listener thread and raw mode are all scoped to
//! [`run`], so every exit path (quit key, Ctrl-C, frame limit, write error)
//! releases them.

use std::io::Write;
use std::time::Duration;

use crossterm::{
    cursor::MoveTo,
    queue,
    terminal::{Clear, ClearType},
};
use tokio::time::MissedTickBehavior;

use crate::command::{CommandSpec, ConfigurationError};
use crate::exec::{CancelHandle, ExecutionRequest, Runner};
use crate::terminal::{KeyListener, RawModeGuard};

/// Width of the footer rule.
const RULE_WIDTH: usize = 60;

/// What: One command shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    /// Section heading.
    pub label: String,
    /// Command to capture each frame.
    pub spec: CommandSpec,
}

impl WatchTarget {
    /// Target with a heading.
    pub fn new(label: impl Into<String>, spec: impl Into<CommandSpec>) -> Self {
        Self {
            label: label.into(),
            spec: spec.into(),
        }
    }
}

/// What: Dashboard behavior.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Title line.
    pub title: String,
    /// Redraw interval.
    pub interval: Duration,
    /// Stop after this many frames (`None` = until the user quits).
    pub max_frames: Option<u32>,
    /// Use raw mode, screen clearing and the key listener.
    pub interactive: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            title: "Real-time Monitoring Dashboard".to_string(),
            interval: Duration::from_secs(3),
            max_frames: None,
            interactive: true,
        }
    }
}

/// Why the dashboard returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// `q`, `Esc` or Ctrl-C in raw mode.
    UserQuit,
    /// Ctrl-C delivered as a signal.
    Interrupted,
    /// `max_frames` reached.
    FrameLimit,
    /// Writing to the output failed.
    OutputClosed,
}

/// Outcome of a dashboard session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSummary {
    /// Frames drawn.
    pub frames: u32,
    /// Why the loop ended.
    pub reason: StopReason,
}

/// What: Run the dashboard on stdout.
///
/// # Errors
/// - Returns [`ConfigurationError`] before drawing anything when a target
///   cannot be resolved for the runner's platform.
pub async fn run(
    runner: &Runner,
    targets: &[WatchTarget],
    options: &WatchOptions,
) -> Result<WatchSummary, ConfigurationError> {
    let mut stdout = std::io::stdout();
    run_with_writer(runner, targets, options, &mut stdout).await
}

/// What: Run the dashboard, drawing into `out`.
///
/// Inputs:
/// - `runner`: Used in quiet mode so spinners do not fight the redraw.
/// - `targets`: Commands to capture each frame.
/// - `options`: Interval, frame limit, interactivity.
/// - `out`: Destination of the rendered frames.
///
/// Output:
/// - [`WatchSummary`] with the number of frames and the stop reason.
///
/// # Errors
/// - Returns [`ConfigurationError`] when a target cannot be resolved.
///
/// Details:
/// - Interactive sessions also stop on a Ctrl-C signal, which covers cooked
///   mode when raw mode is unavailable.
/// - Quitting while a frame is being captured cancels the running child
///   before returning.
pub async fn run_with_writer<W: Write>(
    runner: &Runner,
    targets: &[WatchTarget],
    options: &WatchOptions,
    out: &mut W,
) -> Result<WatchSummary, ConfigurationError> {
    let platform = runner.platform();
    let commands = targets
        .iter()
        .map(|t| t.spec.resolve(platform).map(|c| (t.label.clone(), c)))
        .collect::<Result<Vec<_>, _>>()?;
    // Every capture observes `stop`, so quitting mid-frame kills the child.
    let stop = CancelHandle::new();
    let runner = runner.quiet().with_cancel(stop.signal());

    let raw = if options.interactive {
        match RawModeGuard::acquire() {
            Ok(guard) => Some(guard),
            Err(e) => {
                tracing::warn!(error = %e, "[Watch] Raw mode unavailable; using Ctrl-C signal");
                None
            }
        }
    } else {
        None
    };
    let mut keys = if raw.is_some() {
        match KeyListener::spawn() {
            Ok(listener) => Some(listener),
            Err(e) => {
                tracing::warn!(error = %e, "[Watch] Key listener unavailable");
                None
            }
        }
    } else {
        None
    };
    let newline = if raw.is_some() { "\r\n" } else { "\n" };

    // Registered once for the whole session; SIGINT between polls is kept.
    let interrupt = async {
        if options.interactive && tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("[Watch] Interrupt received");
            return;
        }
        std::future::pending::<()>().await;
    };
    tokio::pin!(interrupt);

    let mut ticker = tokio::time::interval(options.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut frames = 0u32;

    let reason = loop {
        if options.max_frames.is_some_and(|max| frames >= max) {
            break StopReason::FrameLimit;
        }
        tokio::select! {
            _ = ticker.tick() => {}
            () = quit_requested(keys.as_mut()) => break StopReason::UserQuit,
            () = &mut interrupt => break StopReason::Interrupted,
        }

        let capture = capture_frame(&runner, &commands);
        tokio::pin!(capture);
        let frame = tokio::select! {
            frame = &mut capture => frame,
            () = quit_requested(keys.as_mut()) => {
                stop.cancel();
                capture.await;
                break StopReason::UserQuit;
            }
            () = &mut interrupt => {
                stop.cancel();
                capture.await;
                break StopReason::Interrupted;
            }
        };
        if let Err(e) = draw_frame(out, options, &frame, frames, newline) {
            tracing::warn!(error = %e, "[Watch] Output closed");
            break StopReason::OutputClosed;
        }
        frames += 1;
    };

    drop(keys);
    drop(raw);
    let _ = write!(out, "{newline}");
    let _ = out.flush();
    tracing::info!(frames, ?reason, "[Watch] Dashboard closed");
    Ok(WatchSummary { frames, reason })
}

/// Resolve when the key listener reports a quit key; never without one.
async fn quit_requested(keys: Option<&mut KeyListener>) {
    match keys {
        Some(k) => k.quit_requested().await,
        None => std::future::pending::<()>().await,
    }
}

/// Output of one target for one frame.
struct Section {
    /// Heading.
    label: String,
    /// Captured stdout, or the failure explanation.
    body: Result<String, String>,
}

/// Run every target once in capture mode.
async fn capture_frame(runner: &Runner, commands: &[(String, String)]) -> Vec<Section> {
    let mut sections = Vec::with_capacity(commands.len());
    for (label, command) in commands {
        let result = runner
            .run(&ExecutionRequest::capture(command.as_str()).description(label.as_str()))
            .await;
        let body = if result.success() {
            Ok(result.into_stdout().unwrap_or_default())
        } else {
            Err(result.error().unwrap_or("unknown error").to_string())
        };
        sections.push(Section {
            label: label.clone(),
            body,
        });
    }
    sections
}

/// Render one frame.
fn draw_frame<W: Write>(
    out: &mut W,
    options: &WatchOptions,
    sections: &[Section],
    frame_index: u32,
    nl: &str,
) -> std::io::Result<()> {
    if options.interactive {
        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
    } else if frame_index > 0 {
        write!(out, "{nl}")?;
    }
    let now = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
    write!(out, "{}{nl}{now}{nl}{nl}", options.title)?;
    for section in sections {
        write!(out, "== {} =={nl}", section.label)?;
        match &section.body {
            Ok(text) if text.trim().is_empty() => write!(out, "(no output){nl}")?,
            Ok(text) => {
                for line in text.lines() {
                    write!(out, "{line}{nl}")?;
                }
            }
            Err(reason) => write!(out, "! {reason}{nl}")?,
        }
        write!(out, "{nl}")?;
    }
    write!(out, "{}{nl}", "═".repeat(RULE_WIDTH))?;
    write!(
        out,
        "Auto-refresh every {} seconds{nl}",
        options.interval.as_secs_f64()
    )?;
    if options.interactive {
        write!(out, "Press q or Ctrl+C to exit{nl}")?;
    }
    out.flush()
}
