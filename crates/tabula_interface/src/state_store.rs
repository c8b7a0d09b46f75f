//! Shareable external state (URL search params or equivalent).

use parking_lot::Mutex;
use std::sync::Arc;
use tabula_core::UrlState;

/// Where the controller mirrors its query state for sharing and bookmarking.
///
/// Writes replace the whole state; the controller preserves keys it does
/// not own. Implementations should behave like a history `replace`, not a push.
pub trait StateStore: Send + Sync {
    /// Current external state.
    fn read(&self) -> UrlState;

    /// Replaces the external state.
    fn write(&self, state: UrlState);
}

/// In-process state store, useful for headless hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    state: Arc<Mutex<UrlState>>,
    writes: Arc<Mutex<usize>>,
}

impl MemoryStateStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with `state`, e.g. parsed from an incoming URL.
    pub fn with_state(state: UrlState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
            writes: Arc::default(),
        }
    }

    /// Number of writes received so far.
    pub fn write_count(&self) -> usize {
        *self.writes.lock()
    }
}

impl StateStore for MemoryStateStore {
    fn read(&self) -> UrlState {
        self.state.lock().clone()
    }

    fn write(&self, state: UrlState) {
        tracing::trace!(query = %state.to_query_string(), "External state replaced");
        *self.state.lock() = state;
        *self.writes.lock() += 1;
    }
}
