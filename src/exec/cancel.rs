use tokio::sync::watch;

/// What: Owner side of a cancellation flag shared with running commands.
///
/// Details:
/// - Cloning shares the same flag; cancelling is idempotent and sticky.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    /// Broadcasts `true` once cancelled.
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelHandle {
    /// Fresh, not-yet-cancelled handle.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Request cancellation of every command observing this handle.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`CancelHandle::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Observer to attach to a runner.
    #[must_use]
    pub fn signal(&self) -> CancelSignal {
        CancelSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Observer side of a [`CancelHandle`].
#[derive(Debug, Clone)]
pub struct CancelSignal {
    /// Receives the cancellation flag.
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once cancellation is requested; never resolves if the handle
    /// is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        if self.rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    /// What: Cancellation is visible to signals created before and after.
    async fn cancel_signal_observes_handle() {
        let handle = CancelHandle::new();
        let mut early = handle.signal();
        assert!(!early.is_cancelled());
        handle.cancel();
        early.cancelled().await;
        let late = handle.signal();
        assert!(late.is_cancelled());
        assert!(handle.is_cancelled());
    }
}
