//! Restartable one-shot timer.

use std::time::Duration;
use tokio::task::JoinHandle;

/// Runs a callback once a quiet period has elapsed without another schedule.
///
/// Scheduling again aborts the previous timer, so at most one callback is ever
/// outstanding. Dropping the debouncer aborts it as well. Must be used inside
/// a Tokio runtime.
#[derive(Debug, Default)]
pub struct Debouncer {
    handle: Option<JoinHandle<()>>,
}

impl Debouncer {
    /// Creates an idle debouncer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `callback` after `delay`, replacing any outstanding timer.
    pub fn schedule<F>(&mut self, delay: Duration, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        }));
    }

    /// Aborts the outstanding timer. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    /// Whether a timer is waiting to fire.
    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
