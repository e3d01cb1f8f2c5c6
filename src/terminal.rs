//! Scoped terminal resources: raw input mode and a cancellable key listener.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::sync::mpsc;

/// Poll interval of the key listener; bounds how fast it notices cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// What: Raw input mode held for the guard's lifetime.
///
/// Details:
/// - Raw mode is disabled on drop, on every exit path including panics and
///   early returns.
#[derive(Debug)]
pub struct RawModeGuard {
    /// Prevents construction outside [`RawModeGuard::acquire`].
    _private: (),
}

impl RawModeGuard {
    /// Enable raw mode.
    ///
    /// # Errors
    /// - Returns an error when the terminal does not support raw mode (for
    ///   example when stdin is not a TTY).
    pub fn acquire() -> Result<Self> {
        enable_raw_mode()?;
        tracing::debug!("[Terminal] Raw mode enabled");
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        match disable_raw_mode() {
            Ok(()) => tracing::debug!("[Terminal] Raw mode restored"),
            Err(e) => tracing::warn!(error = %e, "[Terminal] Failed to restore cooked mode"),
        }
    }
}

/// What: Whether a key event asks a live view to exit.
///
/// Output:
/// - `true` for Ctrl-C, `q`, `Q` and `Esc` presses.
#[must_use]
pub fn is_quit_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => true,
        _ => false,
    }
}

/// What: Background thread forwarding quit keys while raw mode is active.
///
/// Details:
/// - In raw mode Ctrl-C arrives as a key event, not a signal.
/// - Dropping the listener stops and joins the thread.
#[derive(Debug)]
pub struct KeyListener {
    /// Receives one message per quit key press.
    rx: mpsc::UnboundedReceiver<()>,
    /// Set to stop the thread.
    cancelled: Arc<AtomicBool>,
    /// Listener thread.
    thread: Option<JoinHandle<()>>,
}

impl KeyListener {
    /// Start listening.
    ///
    /// # Errors
    /// - Returns an error when the listener thread cannot be spawned.
    pub fn spawn() -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let thread = std::thread::Builder::new()
            .name("novaflow-keys".into())
            .spawn(move || {
                while !flag.load(Ordering::Relaxed) {
                    match event::poll(POLL_INTERVAL) {
                        Ok(true) => {
                            if let Ok(Event::Key(key)) = event::read()
                                && is_quit_key(&key)
                                && tx.send(()).is_err()
                            {
                                break;
                            }
                        }
                        Ok(false) | Err(_) => {}
                    }
                }
            })?;
        Ok(Self {
            rx,
            cancelled,
            thread: Some(thread),
        })
    }

    /// Resolve on the next quit key press.
    pub async fn quit_requested(&mut self) {
        if self.rx.recv().await.is_none() {
            std::future::pending::<()>().await;
        }
    }
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Relaxed);
        if let Some(t) = self.thread.take() {
            let _ = t.join();
        }
    }
}
