use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::{
    cursor::MoveToColumn,
    queue,
    terminal::{Clear, ClearType},
};
use unicode_width::UnicodeWidthChar;

/// Braille frames cycled by the spinner.
const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
/// Redraw interval.
const FRAME_INTERVAL: Duration = Duration::from_millis(80);

/// What: Animated one-line busy indicator drawn on stderr by a helper thread.
///
/// Details:
/// - Stopping (explicitly or on drop) joins the thread and clears the line.
/// - Every terminal write error is ignored: a broken terminal must never
///   affect the command being supervised.
#[derive(Debug)]
pub(super) struct Spinner {
    /// Cleared to stop the draw loop.
    active: Arc<AtomicBool>,
    /// Draw thread; taken on stop.
    thread: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start drawing `message` next to a rotating frame.
    pub(super) fn start(message: &str) -> Self {
        let active = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&active);
        let text = fit_to_terminal(message);
        let thread = std::thread::Builder::new()
            .name("novaflow-spinner".into())
            .spawn(move || {
                let mut stderr = std::io::stderr();
                let mut idx = 0usize;
                while flag.load(Ordering::SeqCst) {
                    let frame = FRAMES[idx % FRAMES.len()];
                    let _ = queue!(stderr, MoveToColumn(0), Clear(ClearType::CurrentLine));
                    let _ = write!(stderr, "{frame} {text}");
                    let _ = stderr.flush();
                    idx = idx.wrapping_add(1);
                    std::thread::sleep(FRAME_INTERVAL);
                }
                let _ = queue!(stderr, MoveToColumn(0), Clear(ClearType::CurrentLine));
                let _ = stderr.flush();
            });
        match thread {
            Ok(handle) => Self {
                active,
                thread: Some(handle),
            },
            Err(e) => {
                tracing::debug!(error = %e, "[Feedback] Spinner thread unavailable");
                active.store(false, Ordering::SeqCst);
                Self {
                    active,
                    thread: None,
                }
            }
        }
    }

    /// Stop drawing and clear the line.
    pub(super) fn stop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Truncate `message` so frame + text fit on one terminal row.
fn fit_to_terminal(message: &str) -> String {
    let cols = crossterm::terminal::size().map_or(80, |(c, _)| usize::from(c));
    let budget = cols.saturating_sub(3);
    truncate_to_width(message, budget)
}

/// Truncate to at most `max` display columns, marking the cut with `…`.
pub(super) fn truncate_to_width(text: &str, max: usize) -> String {
    let mut width = 0usize;
    let mut out = String::new();
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max {
            if max > 0 {
                while width + 1 > max {
                    match out.pop() {
                        Some(c) => width -= c.width().unwrap_or(0),
                        None => break,
                    }
                }
                out.push('…');
            }
            return out;
        }
        width += w;
        out.push(ch);
    }
    out
}
